//! # Snapshot Synchronization Module
//!
//! Downloads and caches versioned snapshots of a remote dataset.
//!
//! ## Overview
//!
//! Given a credential and a [`SnapshotRef`], the [`SnapshotSynchronizer`]
//! either reuses an already-complete local copy or transfers the snapshot
//! through a pluggable [`SnapshotTransport`], reporting cumulative progress
//! through a synchronous callback. The callback's return value is the only
//! cancellation channel: answering [`ProgressControl::Cancel`] aborts the
//! transfer at the next chunk boundary and removes any partial artifact.
//!
//! ## Transfer state machine
//!
//! ```text
//! Idle → Requesting → Transferring → Complete
//!              ↓            ↓
//!            Failed    {Cancelled | Failed}
//! ```
//!
//! Progress callbacks fire only while `Transferring`; terminal states
//! release partial local artifacts.

pub mod error;
pub mod progress;
pub mod reference;
pub mod state;
pub mod synchronizer;
pub mod transport;

pub use error::{Result, SyncError};
pub use progress::ProgressControl;
pub use reference::{ChangesetId, SnapshotRef, SnapshotVersion};
pub use state::{TransferJob, TransferJobId, TransferState};
pub use synchronizer::SnapshotSynchronizer;
pub use transport::{HttpSnapshotTransport, SnapshotStream, SnapshotTransport};
