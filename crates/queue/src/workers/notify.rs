//! Notification fan-out worker.

use std::collections::HashSet;

use apalis::prelude::*;
use tracing::{error, info, warn};

use bullhorn_db::entities::broadcast;
use bullhorn_db::repositories::{
    BroadcastRepository, EventRepository, GroupRepository, UserRepository,
};

use crate::jobs::{NotifyJob, NotifyKind};
use crate::mailer::Mailer;

/// Context for the notify worker.
#[derive(Clone)]
pub struct NotifyContext {
    pub broadcast_repo: BroadcastRepository,
    pub event_repo: EventRepository,
    pub group_repo: GroupRepository,
    pub user_repo: UserRepository,
    pub mailer: Mailer,
}

/// Worker function for notification email fan-out.
///
/// Failures are logged and swallowed; a notification job never blocks
/// the queue by retrying forever.
pub async fn notify_worker(job: NotifyJob, ctx: Data<NotifyContext>) -> Result<(), Error> {
    info!(kind = ?job.kind, entity_id = %job.entity_id, "Processing notification job");

    if let Err(e) = fan_out(&job, &ctx).await {
        error!(kind = ?job.kind, entity_id = %job.entity_id, error = %e, "Notification fan-out failed");
    }

    Ok(())
}

async fn fan_out(
    job: &NotifyJob,
    ctx: &NotifyContext,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (subject, body, recipients) = match job.kind {
        NotifyKind::Broadcast => broadcast_email(ctx, &job.entity_id).await?,
        NotifyKind::Event => event_email(ctx, &job.entity_id).await?,
    };

    info!(
        entity_id = %job.entity_id,
        recipient_count = %recipients.len(),
        "Sending notification emails"
    );

    for recipient in recipients {
        if let Err(e) = ctx.mailer.send(&recipient, &subject, &body).await {
            warn!(recipient = %recipient, error = %e, "Failed to send notification email");
        }
    }

    Ok(())
}

async fn broadcast_email(
    ctx: &NotifyContext,
    id: &str,
) -> Result<(String, String, Vec<String>), Box<dyn std::error::Error + Send + Sync>> {
    let model = ctx
        .broadcast_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| format!("Broadcast not found: {id}"))?;

    let recipients = match model.audience {
        broadcast::BroadcastAudience::All => ctx.user_repo.active_emails().await?,
        broadcast::BroadcastAudience::Groups => {
            let group_ids = ctx.broadcast_repo.target_group_ids(id).await?;
            let user_ids = ctx.group_repo.member_user_ids(&group_ids).await?;
            ctx.user_repo.emails_for_ids(&user_ids).await?
        }
        broadcast::BroadcastAudience::Users => {
            let user_ids = ctx.broadcast_repo.target_user_ids(id).await?;
            ctx.user_repo.emails_for_ids(&user_ids).await?
        }
    };

    let subject = format!("New broadcast: {}", model.title);
    Ok((subject, model.body, recipients))
}

async fn event_email(
    ctx: &NotifyContext,
    id: &str,
) -> Result<(String, String, Vec<String>), Box<dyn std::error::Error + Send + Sync>> {
    let model = ctx
        .event_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| format!("Event not found: {id}"))?;

    let recipients = if model.is_public {
        ctx.user_repo.active_emails().await?
    } else {
        let mut user_ids: HashSet<String> = ctx
            .event_repo
            .visible_user_ids(id)
            .await?
            .into_iter()
            .collect();

        let group_ids = ctx.event_repo.visible_group_ids(id).await?;
        user_ids.extend(ctx.group_repo.member_user_ids(&group_ids).await?);

        let user_ids: Vec<String> = user_ids.into_iter().collect();
        ctx.user_repo.emails_for_ids(&user_ids).await?
    };

    let subject = format!("New event: {}", model.title);
    let body = format!("{}\n\nStarts at: {}", model.body, model.starts_at.to_rfc3339());
    Ok((subject, body, recipients))
}
