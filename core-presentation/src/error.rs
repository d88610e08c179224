//! Error types for the presentation engine

use thiserror::Error;

/// Errors surfaced by selection scoping and content computation.
#[derive(Debug, Error)]
pub enum PresentationError {
    /// An operation was called before `initialize()` or after `teardown()`.
    #[error("Presentation engine is not initialized")]
    NotInitialized,

    /// The named selection scope does not exist.
    #[error("Unknown selection scope: {0}")]
    UnknownScope(String),

    /// A ruleset was referenced by id but never registered.
    #[error("Unknown ruleset: {0}")]
    UnknownRuleset(String),

    /// The snapshot's element hierarchy contains a parent cycle.
    #[error("Element hierarchy contains a cycle at {0}")]
    HierarchyCycle(String),

    /// The snapshot handle rejected an operation.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] core_snapshot::SnapshotError),

    /// A query against the snapshot failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, PresentationError>;
