//! # Transfer State Machine
//!
//! Tracks one snapshot transfer's lifecycle with validated state
//! transitions and monotonic progress accounting.
//!
//! ## State machine
//!
//! ```text
//! Idle → Requesting → Transferring → Complete
//!    ↓         ↓            ↓
//!    └───→  Failed     {Cancelled | Failed}
//! ```
//!
//! `Transferring` is the only state in which progress may be recorded;
//! `Complete`, `Cancelled` and `Failed` are terminal.

use crate::error::{Result, SyncError};
use crate::reference::SnapshotRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a transfer job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferJobId(Uuid);

impl TransferJobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransferJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The current state of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferState {
    /// No transfer started yet
    Idle,
    /// Transport contacted, waiting for the first byte
    Requesting,
    /// Bytes arriving; progress callbacks fire in this state only
    Transferring,
    /// Transfer finished and the local artifact is complete
    Complete,
    /// Progress callback requested an abort
    Cancelled,
    /// Transport or storage failure
    Failed,
}

impl TransferState {
    /// Check if this state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Complete | TransferState::Cancelled | TransferState::Failed
        )
    }

    /// String form for logs and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Idle => "idle",
            TransferState::Requesting => "requesting",
            TransferState::Transferring => "transferring",
            TransferState::Complete => "complete",
            TransferState::Cancelled => "cancelled",
            TransferState::Failed => "failed",
        }
    }
}

impl FromStr for TransferState {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(TransferState::Idle),
            "requesting" => Ok(TransferState::Requesting),
            "transferring" => Ok(TransferState::Transferring),
            "complete" => Ok(TransferState::Complete),
            "cancelled" => Ok(TransferState::Cancelled),
            "failed" => Ok(TransferState::Failed),
            _ => Err(SyncError::InvalidState(s.to_string())),
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One snapshot transfer with validated lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferJob {
    /// Unique identifier for this transfer
    pub id: TransferJobId,
    /// The reference being synchronized
    pub reference: SnapshotRef,
    /// Current state
    pub state: TransferState,
    /// Cumulative bytes received
    pub bytes_loaded: u64,
    /// Total bytes expected (known once transferring)
    pub bytes_total: u64,
    /// Failure description when `Failed`
    pub error_message: Option<String>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// When the transfer reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

impl TransferJob {
    /// Create an idle job for the given reference.
    pub fn new(reference: SnapshotRef) -> Self {
        Self {
            id: TransferJobId::new(),
            reference,
            state: TransferState::Idle,
            bytes_loaded: 0,
            bytes_total: 0,
            error_message: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Mark the transport request as issued.
    pub fn begin_request(&mut self) -> Result<()> {
        self.transition(TransferState::Requesting)
    }

    /// Mark the first byte as expected, recording the declared total.
    pub fn begin_transfer(&mut self, bytes_total: u64) -> Result<()> {
        self.transition(TransferState::Transferring)?;
        self.bytes_total = bytes_total;
        Ok(())
    }

    /// Record cumulative progress.
    ///
    /// # Errors
    ///
    /// Fails unless the job is `Transferring`, and rejects regressions or
    /// counts exceeding the declared total.
    pub fn record_progress(&mut self, bytes_loaded: u64) -> Result<()> {
        if self.state != TransferState::Transferring {
            return Err(SyncError::InvalidStateTransition {
                from: self.state.as_str().to_string(),
                to: "record_progress".to_string(),
                reason: "progress is only recorded while transferring".to_string(),
            });
        }
        if bytes_loaded < self.bytes_loaded {
            return Err(SyncError::TransferFailed(format!(
                "progress went backwards: {} after {}",
                bytes_loaded, self.bytes_loaded
            )));
        }
        if bytes_loaded > self.bytes_total {
            return Err(SyncError::TransferFailed(format!(
                "received {} bytes but only {} were declared",
                bytes_loaded, self.bytes_total
            )));
        }
        self.bytes_loaded = bytes_loaded;
        Ok(())
    }

    /// Mark the transfer complete.
    pub fn complete(&mut self) -> Result<()> {
        self.transition(TransferState::Complete)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the transfer cancelled by the progress callback.
    pub fn cancel(&mut self) -> Result<()> {
        self.transition(TransferState::Cancelled)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the transfer failed.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(TransferState::Failed)?;
        self.error_message = Some(message.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, to: TransferState) -> Result<()> {
        let valid = match (self.state, to) {
            (TransferState::Idle, TransferState::Requesting) => true,
            (TransferState::Idle, TransferState::Failed) => true,

            (TransferState::Requesting, TransferState::Transferring) => true,
            (TransferState::Requesting, TransferState::Failed) => true,

            (TransferState::Transferring, TransferState::Complete) => true,
            (TransferState::Transferring, TransferState::Cancelled) => true,
            (TransferState::Transferring, TransferState::Failed) => true,

            _ => false,
        };

        if !valid {
            return Err(SyncError::InvalidStateTransition {
                from: self.state.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!("cannot transition from {} to {}", self.state, to),
            });
        }

        self.state = to;
        Ok(())
    }
}
