//! SQLite implementation of the metadata and config store ports
//!
//! ## Type Mapping
//!
//! | Domain Type         | SQL Type | Strategy                                   |
//! |---------------------|----------|--------------------------------------------|
//! | Path                | TEXT     | UTF-8 string as given; others are rejected |
//! | DateTime<Utc>       | TEXT     | RFC3339 `Z` form, sub-second digits kept   |
//! | Config value        | TEXT     | Stored verbatim                            |
//!
//! Both upserts use `INSERT OR REPLACE` and require exactly one affected row.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use filesync_core::domain::SyncMetadataRecord;
use filesync_core::ports::{IConfigStore, IMetadataStore};

use crate::CacheError;

/// SQLite-backed metadata cache and config store
pub struct SqliteMetadataStore {
    pool: SqlitePool,
}

impl SqliteMetadataStore {
    /// Creates a new store over the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reads the record for a path
    pub async fn get_record(&self, path: &Path) -> Result<Option<SyncMetadataRecord>, CacheError> {
        let key = path_key(path)?;
        let row = sqlx::query(
            "SELECT remote_mod_date, local_mod_date FROM sync_mt WHERE filename = ?",
        )
        .bind(&key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Inserts or replaces the record for a path
    pub async fn set_record(
        &self,
        path: &Path,
        record: &SyncMetadataRecord,
    ) -> Result<(), CacheError> {
        let key = path_key(path)?;
        let result = sqlx::query(
            "INSERT OR REPLACE INTO sync_mt (filename, remote_mod_date, local_mod_date) \
             VALUES (?, ?, ?)",
        )
        .bind(&key)
        .bind(format_datetime(&record.remote_mod_date))
        .bind(format_datetime(&record.local_mod_date))
        .execute(&self.pool)
        .await?;

        expect_one_row("sync_mt", key, result.rows_affected())
    }

    /// Lists every path with a record, ordered by path
    pub async fn known_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let rows = sqlx::query("SELECT filename FROM sync_mt ORDER BY filename")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| PathBuf::from(row.get::<String, _>("filename")))
            .collect())
    }

    /// Reads a config value
    pub async fn read_config(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT string_value FROM config_string WHERE config_key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    /// Writes a config value
    pub async fn write_config(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let result = sqlx::query(
            "INSERT OR REPLACE INTO config_string (config_key, string_value) VALUES (?, ?)",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        expect_one_row("config_string", key.to_string(), result.rows_affected())
    }

    /// Lists every config entry, ordered by key
    pub async fn config_entries(&self) -> Result<Vec<(String, String)>, CacheError> {
        let rows = sqlx::query(
            "SELECT config_key, string_value FROM config_string ORDER BY config_key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("config_key"), row.get("string_value")))
            .collect())
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Non-UTF-8 paths have no lossless key
fn path_key(path: &Path) -> Result<String, CacheError> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| CacheError::InvalidPath(path.to_path_buf()))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a stored datetime
///
/// Accepts RFC3339 and the bare `YYYY-MM-DD HH:MM:SS` form SQLite produces
/// for hand-edited rows.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .map(|ndt| ndt.and_utc())
        })
        .map_err(|e| {
            CacheError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

fn row_to_record(row: &SqliteRow) -> Result<SyncMetadataRecord, CacheError> {
    let remote: String = row.get("remote_mod_date");
    let local: String = row.get("local_mod_date");
    Ok(SyncMetadataRecord::new(
        parse_datetime(&remote)?,
        parse_datetime(&local)?,
    ))
}

fn expect_one_row(table: &'static str, key: String, affected: u64) -> Result<(), CacheError> {
    if affected == 1 {
        Ok(())
    } else {
        Err(CacheError::UnexpectedRowCount {
            table,
            key,
            affected,
        })
    }
}

// ============================================================================
// Port implementations
// ============================================================================

#[async_trait::async_trait]
impl IMetadataStore for SqliteMetadataStore {
    async fn get(&self, path: &Path) -> anyhow::Result<Option<SyncMetadataRecord>> {
        Ok(self.get_record(path).await?)
    }

    async fn set(&self, path: &Path, record: &SyncMetadataRecord) -> anyhow::Result<()> {
        self.set_record(path, record).await?;
        tracing::debug!(
            path = %path.display(),
            remote = %record.remote_mod_date,
            local = %record.local_mod_date,
            "Sync metadata stored"
        );
        Ok(())
    }

    async fn list_known_paths(&self) -> anyhow::Result<Vec<PathBuf>> {
        Ok(self.known_paths().await?)
    }
}

#[async_trait::async_trait]
impl IConfigStore for SqliteMetadataStore {
    async fn read_string(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.read_config(key).await?)
    }

    async fn write_string(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.write_config(key, value).await?;
        Ok(())
    }

    async fn list_strings(&self) -> anyhow::Result<Vec<(String, String)>> {
        Ok(self.config_entries().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_keeps_subsecond_precision() {
        let dt = Utc.timestamp_opt(1_704_067_200, 123_456_789).unwrap();
        let s = format_datetime(&dt);
        assert_eq!(s, "2024-01-01T00:00:00.123456789Z");
        assert_eq!(parse_datetime(&s).unwrap(), dt);
    }

    #[test]
    fn format_whole_seconds_has_no_fraction() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_datetime(&dt), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn parse_accepts_sqlite_default_format() {
        let dt = parse_datetime("2024-01-01 12:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_datetime("soon"),
            Err(CacheError::SerializationError(_))
        ));
    }

    #[test]
    fn expect_one_row_rejects_zero_and_many() {
        assert!(expect_one_row("sync_mt", "a".into(), 1).is_ok());
        assert!(matches!(
            expect_one_row("sync_mt", "a".into(), 0),
            Err(CacheError::UnexpectedRowCount { affected: 0, .. })
        ));
        assert!(expect_one_row("sync_mt", "a".into(), 2).is_err());
    }

    #[test]
    fn path_key_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        assert_eq!(path_key(Path::new("/home/u/notes.txt")).unwrap(), "/home/u/notes.txt");
        let bad = Path::new(OsStr::from_bytes(b"/tmp/\xff.txt"));
        assert!(matches!(path_key(bad), Err(CacheError::InvalidPath(_))));
    }
}
