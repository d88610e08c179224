//! # Progress Contract
//!
//! The synchronizer reports cumulative transfer progress through a
//! synchronous callback and obeys its answer: [`ProgressControl::Cancel`]
//! aborts the transfer at the next chunk boundary. This return value is the
//! system's only cancellation channel; once a transfer completes it can no
//! longer be cancelled.

/// Answer returned by a progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressControl {
    /// Let the transfer proceed.
    #[default]
    Continue,
    /// Abort the transfer at the next opportunity; the download fails with
    /// `SyncError::Cancelled` and partial artifacts are removed.
    Cancel,
}

impl ProgressControl {
    /// Interop with control-code style callbacks where any non-zero value
    /// requests an abort.
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            ProgressControl::Continue
        } else {
            ProgressControl::Cancel
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, ProgressControl::Cancel)
    }
}
