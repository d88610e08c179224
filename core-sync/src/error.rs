use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Credential rejected by the remote boundary")]
    Unauthorized,

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Transfer cancelled by the progress callback")]
    Cancelled,

    #[error("Invalid snapshot reference: {0}")]
    InvalidReference(String),

    #[error("Invalid transfer state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Invalid transfer state: {0}")]
    InvalidState(String),

    #[error("Local storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] core_snapshot::SnapshotError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
