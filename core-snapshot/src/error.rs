use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Snapshot file not found: {0}")]
    NotFound(String),

    #[error("Malformed query result: {0}")]
    MalformedQuery(String),

    #[error("Snapshot handle already closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
