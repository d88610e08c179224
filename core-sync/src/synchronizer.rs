//! # Snapshot Synchronizer
//!
//! Downloads a referenced snapshot into the local cache, or reuses a
//! previously completed copy for the exact same reference.
//!
//! A transfer writes into a `.part` sidecar and only renames it onto the
//! final cache path after every declared byte arrived; the final path's
//! existence is therefore the completion marker that makes
//! re-synchronization idempotent. Partial artifacts are removed whenever a
//! transfer ends cancelled or failed.

use crate::error::{Result, SyncError};
use crate::progress::ProgressControl;
use crate::reference::SnapshotRef;
use crate::state::TransferJob;
use core_auth::AccessToken;
use core_snapshot::LocalSnapshot;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::transport::SnapshotTransport;
use std::sync::Arc;

/// Downloads and caches versioned snapshots of a remote dataset.
pub struct SnapshotSynchronizer {
    transport: Arc<dyn SnapshotTransport>,
    cache_dir: PathBuf,
}

impl SnapshotSynchronizer {
    /// Create a synchronizer storing snapshots under `cache_dir`.
    pub fn new(transport: Arc<dyn SnapshotTransport>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            cache_dir: cache_dir.into(),
        }
    }

    /// Path a completed snapshot for `reference` lives at.
    pub fn cache_path(&self, reference: &SnapshotRef) -> PathBuf {
        self.cache_dir
            .join(format!("{}.snapshot", reference.cache_key()))
    }

    /// Download the referenced snapshot, or reuse the cached copy.
    ///
    /// `on_progress(loaded, total)` fires synchronously as chunks arrive;
    /// cumulative `loaded` never decreases and never exceeds `total`.
    /// Returning [`ProgressControl::Cancel`] aborts at the next chunk
    /// boundary, fails with `Cancelled` and leaves no usable local handle.
    /// A cached copy is reused without contacting the transport and without
    /// progress callbacks.
    ///
    /// On success the snapshot is opened read-only and returned ready for
    /// querying; the caller owns the handle and must close it.
    #[instrument(skip(self, token, on_progress), fields(reference = %reference))]
    pub async fn download(
        &self,
        token: &AccessToken,
        reference: &SnapshotRef,
        mut on_progress: impl FnMut(u64, u64) -> ProgressControl + Send,
    ) -> Result<LocalSnapshot> {
        let final_path = self.cache_path(reference);

        if final_path.exists() {
            info!(path = %final_path.display(), "Reusing cached snapshot");
            return Ok(LocalSnapshot::open(&final_path).await?);
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let part_path = final_path.with_extension("snapshot.part");

        let mut job = TransferJob::new(reference.clone());
        job.begin_request()?;
        info!(job_id = %job.id, "Requesting snapshot transfer");

        let mut stream = match self.transport.begin(token, reference).await {
            Ok(stream) => stream,
            Err(e) => {
                job.fail(e.to_string())?;
                return Err(e);
            }
        };

        let total = stream.total_bytes();
        job.begin_transfer(total)?;
        debug!(total_bytes = total, "Transfer started");

        let mut file = tokio::fs::File::create(&part_path).await?;
        let mut loaded: u64 = 0;

        loop {
            let chunk = match stream.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "Transfer failed mid-stream");
                    job.fail(e.to_string())?;
                    remove_partial(&part_path).await;
                    return Err(e);
                }
            };

            if let Err(e) = file.write_all(&chunk).await {
                job.fail(e.to_string())?;
                remove_partial(&part_path).await;
                return Err(SyncError::Storage(e));
            }

            loaded += chunk.len() as u64;
            if let Err(e) = job.record_progress(loaded) {
                remove_partial(&part_path).await;
                return Err(e);
            }

            if on_progress(loaded, total).is_cancel() {
                info!(job_id = %job.id, loaded, "Transfer cancelled by progress callback");
                job.cancel()?;
                drop(file);
                remove_partial(&part_path).await;
                return Err(SyncError::Cancelled);
            }
        }

        if loaded != total {
            let message = format!("transfer truncated: {} of {} bytes", loaded, total);
            warn!(job_id = %job.id, "{}", message);
            job.fail(message.clone())?;
            drop(file);
            remove_partial(&part_path).await;
            return Err(SyncError::TransferFailed(message));
        }

        file.flush().await?;
        drop(file);

        // The rename is the completion marker.
        tokio::fs::rename(&part_path, &final_path).await?;
        job.complete()?;
        info!(job_id = %job.id, path = %final_path.display(), "Snapshot transfer complete");

        Ok(LocalSnapshot::open(&final_path).await?)
    }
}

async fn remove_partial(part_path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(part_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %part_path.display(), error = %e, "Failed to remove partial artifact");
        }
    }
}
