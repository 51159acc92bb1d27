//! Retention rules for superseded remote versions

use chrono::{DateTime, Duration, Utc};

/// Age past which a superseded version is deleted
pub fn retention_window() -> Duration {
    Duration::days(10)
}

/// What pruning does with one listed version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionVerdict {
    /// Not older than the pivot (the authoritative version or newer)
    Current,
    /// Superseded but still inside the retention window
    Retained,
    /// Superseded and older than the retention window
    Expired,
}

impl RetentionVerdict {
    /// Whether the version survives this pass
    pub fn is_kept(self) -> bool {
        !matches!(self, RetentionVerdict::Expired)
    }
}

/// Classifies a version relative to the pivot and the current time
///
/// A version is expired only if it is strictly before `pivot` and its age at
/// `now` exceeds [`retention_window`].
pub fn retention_verdict(
    modified: DateTime<Utc>,
    pivot: DateTime<Utc>,
    now: DateTime<Utc>,
) -> RetentionVerdict {
    if modified >= pivot {
        RetentionVerdict::Current
    } else if now - modified > retention_window() {
        RetentionVerdict::Expired
    } else {
        RetentionVerdict::Retained
    }
}
