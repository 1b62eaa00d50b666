use chrono::{DateTime, Utc};

use crate::utils::constants::{MAX_EPOCH_SECONDS, MIN_EPOCH_SECONDS};

/// Convert a sensor timestamp to UTC when it looks like Unix seconds
pub fn to_datetime(timestamp: u64) -> Option<DateTime<Utc>> {
    if !(MIN_EPOCH_SECONDS..MAX_EPOCH_SECONDS).contains(&timestamp) {
        return None;
    }
    DateTime::<Utc>::from_timestamp(timestamp as i64, 0)
}

/// Render a timestamp for reports, with its calendar date when plausible
pub fn describe_timestamp(timestamp: u64) -> String {
    match to_datetime(timestamp) {
        Some(dt) => format!("{} ({})", timestamp, dt.format("%Y-%m-%d %H:%M:%S UTC")),
        None => timestamp.to_string(),
    }
}
