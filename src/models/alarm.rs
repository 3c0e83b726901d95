//! Alarm record model and persisted snapshot layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::content::ContentItem;
use super::GroupId;

/// One persisted recurring alarm.
///
/// The serde field names (`time`, `duration`, `group`, `msg`) are the
/// snapshot wire layout; `time` is epoch milliseconds. The running timer
/// handle is deliberately not part of this type; it is reconstructed from
/// `time` and `duration` on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlarmRecord {
    /// Unique alarm identifier; the external handle for inspect/cancel.
    pub id: Uuid,
    /// Absolute instant of the first intended occurrence, as the user
    /// specified it. Never mutated by catch-up.
    #[serde(rename = "time", with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    /// Repeat period in milliseconds; strictly positive.
    #[serde(rename = "duration")]
    pub interval_ms: i64,
    /// Delivery target group.
    pub group: GroupId,
    /// Payload redelivered on every firing.
    pub msg: Vec<ContentItem>,
}

impl AlarmRecord {
    /// Construct a new record with a generated identifier.
    #[must_use]
    pub fn new(
        start_time: DateTime<Utc>,
        interval_ms: i64,
        group: GroupId,
        msg: Vec<ContentItem>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time,
            interval_ms,
            group,
            msg,
        }
    }
}

/// Format an interval in milliseconds as `"<h>h <m>m"` for user-facing text.
///
/// A sub-minute remainder is appended as seconds; zero components in the
/// middle are kept so the string stays unambiguous.
#[must_use]
pub fn format_interval(interval_ms: i64) -> String {
    let hours = interval_ms / 3_600_000;
    let minutes = (interval_ms % 3_600_000) / 60_000;
    let seconds = (interval_ms % 60_000) / 1000;
    if seconds > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else {
        format!("{hours}h {minutes}m")
    }
}
