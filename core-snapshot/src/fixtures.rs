//! # Snapshot Fixtures
//!
//! Builds a small, fully-populated snapshot file for tests across the
//! workspace. Mirrors the shape a real synchronized dataset has: a couple
//! of assemblies with child elements and a property bag per element.
//!
//! The fixture uses rollback journaling so the produced snapshot is a
//! single file whose bytes can be served verbatim by stub transports.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::Path;
use tracing::debug;

/// Element rows seeded by [`create_test_snapshot`]: (id, parent, class, label).
const ELEMENTS: &[(&str, Option<&str>, &str, &str)] = &[
    ("0x1", None, "PhysicalObject", "Pump Assembly"),
    ("0x2", Some("0x1"), "PhysicalObject", "Pump Housing"),
    ("0x3", Some("0x2"), "PhysicalObject", "Housing Bolt"),
    ("0x10", None, "DrawingGraphic", "Detail Sheet"),
    ("0x11", Some("0x10"), "DrawingGraphic", "Detail Callout"),
];

/// Property rows: (element, name, label, kind, raw JSON value).
const PROPERTIES: &[(&str, &str, &str, &str, &str)] = &[
    ("0x1", "name", "Name", "primitive", "\"Pump Assembly\""),
    ("0x1", "category", "Category", "primitive", "\"Mechanical\""),
    (
        "0x1",
        "source",
        "Source Information",
        "composite",
        r#"{"file":"plant.dgn","line":12}"#,
    ),
    ("0x2", "name", "Name", "primitive", "\"Pump Housing\""),
    ("0x2", "category", "Category", "primitive", "\"Mechanical\""),
    ("0x3", "name", "Name", "primitive", "\"Housing Bolt\""),
    ("0x3", "category", "Category", "primitive", "\"Fasteners\""),
    ("0x10", "name", "Name", "primitive", "\"Detail Sheet\""),
    ("0x10", "sheet", "Sheet Number", "primitive", "\"S-101\""),
    ("0x11", "name", "Name", "primitive", "\"Detail Callout\""),
];

/// Create a seeded snapshot file at `path`, replacing any existing file.
///
/// For testing only. The connection is fully closed before returning so
/// the file on disk is complete and self-contained.
pub async fn create_test_snapshot(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        std::fs::remove_file(path).ok();
    }

    debug!(path = %path.display(), "Creating test snapshot");

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE elements (
            id TEXT PRIMARY KEY,
            parent_id TEXT REFERENCES elements(id),
            class_name TEXT NOT NULL,
            user_label TEXT
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE element_properties (
            element_id TEXT NOT NULL REFERENCES elements(id),
            prop_name TEXT NOT NULL,
            prop_label TEXT NOT NULL,
            value_kind TEXT NOT NULL,
            raw_value TEXT,
            PRIMARY KEY (element_id, prop_name)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    for (id, parent, class, label) in ELEMENTS {
        sqlx::query(
            "INSERT INTO elements (id, parent_id, class_name, user_label) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(parent)
        .bind(class)
        .bind(label)
        .execute(&pool)
        .await?;
    }

    for (element, name, label, kind, raw) in PROPERTIES {
        sqlx::query(
            r#"
            INSERT INTO element_properties
                (element_id, prop_name, prop_label, value_kind, raw_value)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(element)
        .bind(name)
        .bind(label)
        .bind(kind)
        .bind(raw)
        .execute(&pool)
        .await?;
    }

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalSnapshot;

    #[tokio::test]
    async fn test_fixture_is_self_contained() {
        let path = std::env::temp_dir().join(format!(
            "snapview-fixture-test-{}.snapshot",
            uuid::Uuid::new_v4()
        ));
        create_test_snapshot(&path).await.unwrap();

        // No sidecar journal files may remain.
        assert!(!path.with_extension("snapshot-wal").exists());

        let snapshot = LocalSnapshot::open(&path).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM elements")
            .fetch_one(snapshot.pool().unwrap())
            .await
            .unwrap();
        assert_eq!(count, ELEMENTS.len() as i64);

        snapshot.close().await;
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_fixture_overwrites_existing_file() {
        let path = std::env::temp_dir().join(format!(
            "snapview-fixture-overwrite-{}.snapshot",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, b"stale bytes").unwrap();

        create_test_snapshot(&path).await.unwrap();
        let snapshot = LocalSnapshot::open(&path).await.unwrap();
        snapshot.close().await;

        std::fs::remove_file(&path).ok();
    }
}
