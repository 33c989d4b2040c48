//! Schema for the partition store.
//!
//! Two tables: `partitions` keeps one row per named cache with an
//! autoincrement `seq` giving creation order, and `entries` holds the stored
//! responses keyed by `(partition, key_hash)`. Entries reference their
//! partition with `ON DELETE CASCADE`, so dropping a generation's partition
//! drops its responses in the same statement.
//!
//! `_migrations` records the highest schema version applied; each newer
//! version runs in its own transaction.

use tokio_rusqlite::{Connection, params};

use super::Error;

/// Schema versions in ascending order.
const SCHEMA: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_partitions.sql"))];

/// Bring the schema up to the newest version.
pub async fn apply(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let applied: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in SCHEMA.iter().filter(|(version, _)| *version > applied) {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("schema v{version}: {e}")))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::debug!(version, "cache schema migrated");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
