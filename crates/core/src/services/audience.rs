//! Audience resolution predicates.
//!
//! Pure functions deciding who can see and act on broadcasts and
//! events. Services load the rows and membership facts, then call in
//! here; nothing in this module touches the database.
//!
//! The staff capability check lives here and nowhere else.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use bullhorn_db::entities::{broadcast, event, user};

/// Precomputed membership facts for one viewer against one entity.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    /// Groups the viewer belongs to.
    pub viewer_group_ids: HashSet<String>,
    /// Groups the entity targets (or is visible to).
    pub target_group_ids: HashSet<String>,
    /// Users the entity targets (or is visible to) directly.
    pub target_user_ids: HashSet<String>,
}

impl Membership {
    /// Whether the viewer is reached through a targeted group.
    #[must_use]
    pub fn in_target_group(&self) -> bool {
        !self.viewer_group_ids.is_disjoint(&self.target_group_ids)
    }
}

/// A broadcast is live when the current time falls inside its window
/// and it is published and active.
#[must_use]
pub fn broadcast_is_live(broadcast: &broadcast::Model, now: DateTime<Utc>) -> bool {
    broadcast.is_active
        && broadcast.is_published
        && broadcast.starts_at <= now
        && now < broadcast.ends_at
}

/// Whether a viewer may see a broadcast.
///
/// Staff and the creator always can. Everyone else needs the
/// broadcast to be live and to be in its audience. Being targeted
/// both directly and through a group counts once; the checks are
/// set-membership tests.
#[must_use]
pub fn can_view_broadcast(
    viewer: &user::Model,
    broadcast: &broadcast::Model,
    membership: &Membership,
    now: DateTime<Utc>,
) -> bool {
    if viewer.is_staff {
        return true;
    }
    if broadcast.created_by == viewer.id {
        return true;
    }
    if !broadcast_is_live(broadcast, now) {
        return false;
    }

    match broadcast.audience {
        broadcast::BroadcastAudience::All => true,
        broadcast::BroadcastAudience::Groups => membership.in_target_group(),
        broadcast::BroadcastAudience::Users => membership.target_user_ids.contains(&viewer.id),
    }
}

/// Whether a viewer may acknowledge or mark a broadcast viewed.
///
/// Liveness gates everyone, staff included.
#[must_use]
pub fn can_act_on_broadcast(
    viewer: &user::Model,
    broadcast: &broadcast::Model,
    membership: &Membership,
    now: DateTime<Utc>,
) -> bool {
    broadcast_is_live(broadcast, now) && can_view_broadcast(viewer, broadcast, membership, now)
}

/// Whether a viewer may see an event.
#[must_use]
pub fn can_view_event(
    viewer: &user::Model,
    event: &event::Model,
    membership: &Membership,
) -> bool {
    if viewer.is_staff {
        return true;
    }
    if event.created_by == viewer.id {
        return true;
    }
    if !event.is_active {
        return false;
    }

    event.is_public
        || membership.target_user_ids.contains(&viewer.id)
        || membership.in_target_group()
}

/// Whether a viewer may RSVP to an event. Responses close once the
/// event starts.
#[must_use]
pub fn can_rsvp_event(
    viewer: &user::Model,
    event: &event::Model,
    membership: &Membership,
    now: DateTime<Utc>,
) -> bool {
    can_view_event(viewer, event, membership) && event.starts_at > now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_user(id: &str, is_staff: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            email: format!("{id}@example.com"),
            name: None,
            token: None,
            department: None,
            is_staff,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn make_broadcast(
        created_by: &str,
        audience: broadcast::BroadcastAudience,
        starts_in_hours: i64,
        ends_in_hours: i64,
    ) -> broadcast::Model {
        let now = Utc::now();
        broadcast::Model {
            id: "b1".to_string(),
            title: "Title".to_string(),
            body: "Body".to_string(),
            priority: broadcast::BroadcastPriority::Normal,
            audience,
            starts_at: (now + Duration::hours(starts_in_hours)).into(),
            ends_at: (now + Duration::hours(ends_in_hours)).into(),
            send_email: false,
            is_published: true,
            is_active: true,
            created_by: created_by.to_string(),
            created_at: now.into(),
            updated_at: None,
        }
    }

    fn make_event(created_by: &str, is_public: bool, starts_in_hours: i64) -> event::Model {
        let now = Utc::now();
        event::Model {
            id: "e1".to_string(),
            title: "Event".to_string(),
            body: "Details".to_string(),
            event_type: event::EventType::Internal,
            starts_at: (now + Duration::hours(starts_in_hours)).into(),
            venue: None,
            theme: None,
            is_important: false,
            is_public,
            is_active: true,
            created_by: created_by.to_string(),
            created_at: now.into(),
            updated_at: None,
        }
    }

    fn membership(viewer_groups: &[&str], target_groups: &[&str], target_users: &[&str]) -> Membership {
        Membership {
            viewer_group_ids: viewer_groups.iter().map(|s| (*s).to_string()).collect(),
            target_group_ids: target_groups.iter().map(|s| (*s).to_string()).collect(),
            target_user_ids: target_users.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn test_live_all_broadcast_visible_to_any_user() {
        let viewer = make_user("u1", false);
        let broadcast = make_broadcast("author", broadcast::BroadcastAudience::All, -1, 1);

        assert!(can_view_broadcast(
            &viewer,
            &broadcast,
            &Membership::default(),
            Utc::now()
        ));
    }

    #[test]
    fn test_future_broadcast_hidden_from_regular_user() {
        let viewer = make_user("u1", false);
        let broadcast = make_broadcast("author", broadcast::BroadcastAudience::All, 1, 2);

        assert!(!can_view_broadcast(
            &viewer,
            &broadcast,
            &Membership::default(),
            Utc::now()
        ));
    }

    #[test]
    fn test_future_broadcast_visible_to_creator_and_staff() {
        let creator = make_user("author", false);
        let staff = make_user("admin", true);
        let broadcast = make_broadcast("author", broadcast::BroadcastAudience::All, 1, 2);
        let now = Utc::now();

        assert!(can_view_broadcast(&creator, &broadcast, &Membership::default(), now));
        assert!(can_view_broadcast(&staff, &broadcast, &Membership::default(), now));
    }

    #[test]
    fn test_staff_sees_everything() {
        let staff = make_user("admin", true);
        let now = Utc::now();

        let expired = make_broadcast("author", broadcast::BroadcastAudience::Users, -3, -1);
        assert!(can_view_broadcast(&staff, &expired, &Membership::default(), now));

        let private_event = make_event("author", false, 24);
        assert!(can_view_event(&staff, &private_event, &Membership::default()));
    }

    #[test]
    fn test_group_targeting_requires_membership() {
        let member = make_user("u1", false);
        let outsider = make_user("u2", false);
        let broadcast = make_broadcast("author", broadcast::BroadcastAudience::Groups, -1, 1);
        let now = Utc::now();

        let member_facts = membership(&["g1"], &["g1"], &[]);
        let outsider_facts = membership(&["g2"], &["g1"], &[]);

        assert!(can_view_broadcast(&member, &broadcast, &member_facts, now));
        assert!(!can_view_broadcast(&outsider, &broadcast, &outsider_facts, now));
    }

    #[test]
    fn test_user_targeting_is_direct() {
        let targeted = make_user("u1", false);
        let other = make_user("u2", false);
        let broadcast = make_broadcast("author", broadcast::BroadcastAudience::Users, -1, 1);
        let now = Utc::now();

        let facts = membership(&[], &[], &["u1"]);

        assert!(can_view_broadcast(&targeted, &broadcast, &facts, now));
        assert!(!can_view_broadcast(&other, &broadcast, &facts, now));
    }

    #[test]
    fn test_doubly_targeted_user_counts_once() {
        // Direct target and group member at the same time still just
        // passes the check.
        let viewer = make_user("u1", false);
        let broadcast = make_broadcast("author", broadcast::BroadcastAudience::Users, -1, 1);
        let facts = membership(&["g1"], &["g1"], &["u1"]);

        assert!(can_view_broadcast(&viewer, &broadcast, &facts, Utc::now()));
    }

    #[test]
    fn test_acting_gated_by_liveness_even_for_staff() {
        let staff = make_user("admin", true);
        let future = make_broadcast("author", broadcast::BroadcastAudience::All, 1, 2);
        let now = Utc::now();

        assert!(can_view_broadcast(&staff, &future, &Membership::default(), now));
        assert!(!can_act_on_broadcast(&staff, &future, &Membership::default(), now));
    }

    #[test]
    fn test_unpublished_broadcast_not_live() {
        let mut broadcast = make_broadcast("author", broadcast::BroadcastAudience::All, -1, 1);
        broadcast.is_published = false;

        assert!(!broadcast_is_live(&broadcast, Utc::now()));
    }

    #[test]
    fn test_window_is_half_open() {
        let broadcast = make_broadcast("author", broadcast::BroadcastAudience::All, -1, 0);

        // ends_at itself is outside the window
        assert!(!broadcast_is_live(&broadcast, broadcast.ends_at.into()));
        assert!(broadcast_is_live(&broadcast, broadcast.starts_at.into()));
    }

    #[test]
    fn test_public_event_visible_to_anyone() {
        let viewer = make_user("u1", false);
        let event = make_event("author", true, 24);

        assert!(can_view_event(&viewer, &event, &Membership::default()));
    }

    #[test]
    fn test_private_event_needs_visibility() {
        let invited = make_user("u1", false);
        let outsider = make_user("u2", false);
        let event = make_event("author", false, 24);

        let facts = membership(&[], &[], &["u1"]);

        assert!(can_view_event(&invited, &event, &facts));
        assert!(!can_view_event(&outsider, &event, &facts));
    }

    #[test]
    fn test_rsvp_closes_at_start() {
        let viewer = make_user("u1", false);
        let upcoming = make_event("author", true, 24);
        let past = make_event("author", true, -1);
        let now = Utc::now();

        assert!(can_rsvp_event(&viewer, &upcoming, &Membership::default(), now));
        assert!(!can_rsvp_event(&viewer, &past, &Membership::default(), now));
    }
}
