//! # Local Snapshot Module
//!
//! Read-only access to a synchronized snapshot of a remote dataset.
//!
//! ## Overview
//!
//! A snapshot is a point-in-time SQLite copy of a remote dataset. This
//! crate owns the open handle ([`LocalSnapshot`]) and the seed query that
//! produces the initial record identifiers for selection scoping. It knows
//! nothing about how the snapshot file arrived on disk; `core-sync` does
//! the downloading and hands the path over.
//!
//! ## Snapshot schema
//!
//! Synchronized snapshots expose two tables queried by the presentation
//! stage:
//!
//! - `elements(id, parent_id, class_name, user_label)` — one row per
//!   addressable record, with an optional containing element.
//! - `element_properties(element_id, prop_name, prop_label, value_kind,
//!   raw_value)` — per-element property values; `value_kind` is
//!   `primitive` or `composite`, `raw_value` is JSON text.

pub mod db;
pub mod error;
pub mod fixtures;
pub mod query;

pub use db::LocalSnapshot;
pub use error::{Result, SnapshotError};
pub use fixtures::create_test_snapshot;
pub use query::RecordId;
