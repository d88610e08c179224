//! # Seed Query Module
//!
//! Executes the read-only seed query against an open snapshot and yields
//! the matching record identifiers lazily, in engine order.
//!
//! The identifier is expected in the first projected column of every row. A
//! NULL or non-text value there is a caller error and fails fast with
//! `MalformedQuery`; this module imposes no ordering of its own and no
//! implicit row cap.

use crate::db::LocalSnapshot;
use crate::error::{Result, SnapshotError};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::fmt;
use tracing::debug;

/// Opaque key naming one addressable record within a snapshot.
///
/// Produced only by the seed query; ordering among identifiers is the
/// insertion order the query yielded them in and is not stable across
/// snapshot versions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap a raw identifier value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl LocalSnapshot {
    /// Run the seed query and stream record identifiers lazily.
    ///
    /// The stream is finite and non-restartable; rows surface in the order
    /// the engine yields them. The query must be bounded by the caller.
    ///
    /// # Errors
    ///
    /// Individual stream items fail with `MalformedQuery` when a row's
    /// first column is NULL or not readable as text, and with `Database`
    /// for engine-level failures.
    pub fn seed_identifiers<'a>(&'a self, sql: &'a str) -> BoxStream<'a, Result<RecordId>> {
        debug!(query = sql, "Executing seed query");

        let pool = match self.pool() {
            Ok(pool) => pool,
            Err(e) => return futures::stream::once(async move { Err(e) }).boxed(),
        };

        sqlx::query(sql)
            .fetch(pool)
            .map_err(SnapshotError::Database)
            .and_then(|row| async move { record_id_from_row(&row) })
            .boxed()
    }

    /// Run the seed query and collect all identifiers in yield order.
    pub async fn collect_seed_identifiers(&self, sql: &str) -> Result<Vec<RecordId>> {
        self.seed_identifiers(sql).try_collect().await
    }
}

/// Extract the identifier from the first projected column.
fn record_id_from_row(row: &SqliteRow) -> Result<RecordId> {
    if row.is_empty() {
        return Err(SnapshotError::MalformedQuery(
            "seed query produced a row with no columns".to_string(),
        ));
    }

    let value: Option<String> = row.try_get(0).map_err(|e| {
        SnapshotError::MalformedQuery(format!(
            "seed query's first column is not a record identifier: {}",
            e
        ))
    })?;

    match value {
        Some(id) if !id.is_empty() => Ok(RecordId::new(id)),
        _ => Err(SnapshotError::MalformedQuery(
            "seed query's first column is NULL or empty".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::create_test_snapshot;
    use std::path::PathBuf;

    async fn open_fixture() -> (LocalSnapshot, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "snapview-query-test-{}.snapshot",
            uuid::Uuid::new_v4()
        ));
        create_test_snapshot(&path).await.unwrap();
        (LocalSnapshot::open(&path).await.unwrap(), path)
    }

    #[tokio::test]
    async fn test_seed_query_yields_in_engine_order() {
        let (snapshot, path) = open_fixture().await;

        let ids = snapshot
            .collect_seed_identifiers(
                "SELECT id FROM elements WHERE parent_id IS NULL ORDER BY rowid",
            )
            .await
            .unwrap();

        assert_eq!(
            ids,
            vec![RecordId::new("0x1"), RecordId::new("0x10")],
            "Root elements must surface in insertion order"
        );

        snapshot.close().await;
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_seed_query_with_limit() {
        let (snapshot, path) = open_fixture().await;

        let ids = snapshot
            .collect_seed_identifiers("SELECT id FROM elements ORDER BY rowid LIMIT 3")
            .await
            .unwrap();
        assert_eq!(ids.len(), 3);

        snapshot.close().await;
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_null_identifier_is_malformed() {
        let (snapshot, path) = open_fixture().await;

        let result = snapshot
            .collect_seed_identifiers("SELECT NULL FROM elements LIMIT 1")
            .await;
        assert!(matches!(result, Err(SnapshotError::MalformedQuery(_))));

        snapshot.close().await;
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_stream_is_lazy() {
        let (snapshot, path) = open_fixture().await;

        let mut stream = snapshot.seed_identifiers("SELECT id FROM elements ORDER BY rowid");
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, RecordId::new("0x1"));
        // Dropping the stream mid-way must not poison the handle.
        drop(stream);

        let ids = snapshot
            .collect_seed_identifiers("SELECT id FROM elements ORDER BY rowid LIMIT 1")
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);

        snapshot.close().await;
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_query_on_closed_handle() {
        let (snapshot, path) = open_fixture().await;
        snapshot.close().await;

        let result = snapshot.collect_seed_identifiers("SELECT id FROM elements").await;
        assert!(matches!(result, Err(SnapshotError::Closed)));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_bad_sql_is_database_error() {
        let (snapshot, path) = open_fixture().await;

        let result = snapshot
            .collect_seed_identifiers("SELECT FROM nowhere AT ALL")
            .await;
        assert!(matches!(result, Err(SnapshotError::Database(_))));

        snapshot.close().await;
        std::fs::remove_file(&path).ok();
    }
}
