//! # Snapshot Handle Module
//!
//! Opens a synchronized snapshot file as a read-only SQLite pool.
//!
//! ## Features
//!
//! - **Read-only**: a snapshot is never mutated locally; the handle opens
//!   the file with write access disabled.
//! - **Connection pooling**: small pool sized for the query and content
//!   stages running sequentially.
//! - **Health check**: connection validated at open time, so a corrupt or
//!   truncated file fails fast instead of at first query.
//! - **Explicit release**: [`LocalSnapshot::close`] must run on every exit
//!   path once the handle is open.

use crate::error::{Result, SnapshotError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The open local copy of a synchronized dataset.
///
/// Exclusively owned by the pipeline for the duration of a run. Obtain one
/// from `core-sync` after a successful download, or via [`open`] for an
/// already-cached file.
///
/// [`open`]: LocalSnapshot::open
pub struct LocalSnapshot {
    pool: Pool<Sqlite>,
    path: PathBuf,
}

impl LocalSnapshot {
    /// Open a snapshot file read-only and validate the connection.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file does not exist, or a `Database` error
    /// if the file cannot be opened or fails the health check.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(SnapshotError::NotFound(path.display().to_string()));
        }

        info!(path = %path.display(), "Opening local snapshot");

        let connect_options = SqliteConnectOptions::new()
            .filename(&path)
            .read_only(true)
            .statement_cache_capacity(100);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to open snapshot");
                SnapshotError::Database(e)
            })?;

        health_check(&pool).await?;

        debug!(path = %path.display(), "Snapshot opened");
        Ok(Self { pool, path })
    }

    /// The connection pool backing this handle.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if [`close`](Self::close) already ran.
    pub fn pool(&self) -> Result<&Pool<Sqlite>> {
        if self.pool.is_closed() {
            return Err(SnapshotError::Closed);
        }
        Ok(&self.pool)
    }

    /// Path of the underlying snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the handle. Idempotent; further queries fail with `Closed`.
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            info!(path = %self.path.display(), "Closing local snapshot");
            self.pool.close().await;
        }
    }
}

/// Verify the snapshot file is a readable database.
async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    debug!("Performing snapshot health check");

    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Snapshot health check failed");
        SnapshotError::Database(e)
    })?;

    Ok(())
}
