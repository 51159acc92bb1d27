//! Sync metadata records
//!
//! The metadata cache keeps, per local path, the remote and local
//! modification times observed at the end of the last successful transfer.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Cached state of one logical file after its last successful sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetadataRecord {
    /// Modification time of the authoritative remote version
    pub remote_mod_date: DateTime<Utc>,
    /// Local mtime observed right after the transfer
    pub local_mod_date: DateTime<Utc>,
}

impl SyncMetadataRecord {
    /// Creates a new record
    pub fn new(remote_mod_date: DateTime<Utc>, local_mod_date: DateTime<Utc>) -> Self {
        Self {
            remote_mod_date,
            local_mod_date,
        }
    }
}

/// Local baseline used when a path has never been synced: 2000-01-01T00:00:00Z
pub fn sync_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_epoch_is_start_of_2000() {
        assert_eq!(sync_epoch().to_rfc3339(), "2000-01-01T00:00:00+00:00");
    }

    #[test]
    fn record_serializes_as_rfc3339() {
        let record = SyncMetadataRecord::new(sync_epoch(), sync_epoch());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("2000-01-01T00:00:00Z"));
    }
}
