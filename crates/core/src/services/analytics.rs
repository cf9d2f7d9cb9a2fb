//! Engagement analytics.
//!
//! Pure computation over counts and log timestamps. The broadcast and
//! event services gather the inputs and call in here.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Number of days in the daily-activity window, today included.
pub const DAILY_WINDOW_DAYS: i64 = 30;

/// One calendar day of activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// Calendar date (UTC).
    pub date: NaiveDate,
    /// Number of events on that date.
    pub count: u64,
}

/// Engagement summary for a broadcast.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastAnalytics {
    pub total_recipients: u64,
    pub total_views: u64,
    pub total_acknowledgments: u64,
    pub view_rate: f64,
    pub acknowledgment_rate: f64,
    pub daily_views: Vec<DailyCount>,
}

/// RSVP summary for an event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAnalytics {
    pub yes_count: u64,
    pub no_count: u64,
    pub maybe_count: u64,
    pub total_responses: u64,
    pub total_visible_users: u64,
    pub rsvp_rate: f64,
    pub daily_rsvps: Vec<DailyCount>,
}

/// Percentage of `count` over `total`, clamped to `[0, 100]`.
///
/// Returns 0 when `total` is 0; an empty audience never divides.
#[must_use]
pub fn rate(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let pct = (count as f64) * 100.0 / (total as f64);
    pct.clamp(0.0, 100.0)
}

/// Start of the daily window: midnight UTC, 29 days before `today`.
#[must_use]
pub fn window_start(today: NaiveDate) -> DateTime<Utc> {
    let first_day = today - Duration::days(DAILY_WINDOW_DAYS - 1);
    first_day
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// Bucket timestamps into exactly 30 calendar days ending at `today`.
///
/// Every day in the window appears, zero-filled. Timestamps outside
/// the window are ignored.
#[must_use]
pub fn daily_buckets(timestamps: &[DateTime<Utc>], today: NaiveDate) -> Vec<DailyCount> {
    let first_day = today - Duration::days(DAILY_WINDOW_DAYS - 1);

    let mut buckets: Vec<DailyCount> = (0..DAILY_WINDOW_DAYS)
        .map(|offset| DailyCount {
            date: first_day + Duration::days(offset),
            count: 0,
        })
        .collect();

    for ts in timestamps {
        let date = ts.date_naive();
        if date < first_day || date > today {
            continue;
        }
        let idx = (date - first_day).num_days();
        #[allow(clippy::cast_sign_loss)]
        let idx = idx as usize;
        buckets[idx].count += 1;
    }

    buckets
}
