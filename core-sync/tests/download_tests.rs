//! Integration tests for snapshot download and caching
//!
//! These tests drive the synchronizer with a scripted stub transport and
//! verify:
//! - Successful transfers produce an openable, queryable handle
//! - Progress values respect the cooperative callback contract
//! - Cancellation aborts the transfer and leaves no usable artifact
//! - Re-synchronizing a cached reference performs no transport calls
//! - Unauthorized and transfer failures stay distinguishable

use async_trait::async_trait;
use bytes::Bytes;
use core_auth::AccessToken;
use core_snapshot::create_test_snapshot;
use core_sync::{
    ProgressControl, SnapshotRef, SnapshotStream, SnapshotSynchronizer, SnapshotTransport,
    SnapshotVersion, SyncError,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Stub transport
// ============================================================================

enum StubBehavior {
    /// Serve the given bytes in fixed-size chunks.
    Serve { payload: Vec<u8>, chunk_size: usize },
    /// Reject the credential.
    Unauthorized,
    /// Fail mid-stream after serving one chunk.
    FailAfterFirstChunk { payload: Vec<u8>, chunk_size: usize },
    /// Declare more bytes than are served.
    Truncate { payload: Vec<u8>, declared: u64 },
}

struct StubTransport {
    behavior: StubBehavior,
    begin_calls: AtomicUsize,
}

impl StubTransport {
    fn new(behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            begin_calls: AtomicUsize::new(0),
        })
    }

    fn begin_calls(&self) -> usize {
        self.begin_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotTransport for StubTransport {
    async fn begin(
        &self,
        _token: &AccessToken,
        _reference: &SnapshotRef,
    ) -> core_sync::Result<Box<dyn SnapshotStream>> {
        self.begin_calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            StubBehavior::Serve {
                payload,
                chunk_size,
            } => Ok(Box::new(ScriptedStream {
                total: payload.len() as u64,
                chunks: chunk_up(payload, *chunk_size),
                fail_after: None,
            })),
            StubBehavior::Unauthorized => Err(SyncError::Unauthorized),
            StubBehavior::FailAfterFirstChunk {
                payload,
                chunk_size,
            } => Ok(Box::new(ScriptedStream {
                total: payload.len() as u64,
                chunks: chunk_up(payload, *chunk_size),
                fail_after: Some(1),
            })),
            StubBehavior::Truncate { payload, declared } => Ok(Box::new(ScriptedStream {
                total: *declared,
                chunks: chunk_up(payload, payload.len().max(1)),
                fail_after: None,
            })),
        }
    }
}

fn chunk_up(payload: &[u8], chunk_size: usize) -> Vec<Bytes> {
    payload
        .chunks(chunk_size)
        .map(Bytes::copy_from_slice)
        .collect()
}

struct ScriptedStream {
    total: u64,
    chunks: Vec<Bytes>,
    fail_after: Option<usize>,
}

#[async_trait]
impl SnapshotStream for ScriptedStream {
    fn total_bytes(&self) -> u64 {
        self.total
    }

    async fn next_chunk(&mut self) -> core_sync::Result<Option<Bytes>> {
        if self.fail_after == Some(0) {
            return Err(SyncError::TransferFailed("connection reset".to_string()));
        }
        if let Some(remaining) = self.fail_after.as_mut() {
            *remaining -= 1;
        }

        if self.chunks.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.chunks.remove(0)))
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn temp_cache_dir() -> PathBuf {
    std::env::temp_dir().join(format!("snapview-sync-test-{}", uuid::Uuid::new_v4()))
}

fn test_reference() -> SnapshotRef {
    SnapshotRef::new("proj1", "data1", SnapshotVersion::Latest)
}

fn test_token() -> AccessToken {
    AccessToken::new("test-token")
}

/// Bytes of a real, self-contained snapshot database.
async fn snapshot_payload() -> Vec<u8> {
    let path =
        std::env::temp_dir().join(format!("snapview-sync-payload-{}.db", uuid::Uuid::new_v4()));
    create_test_snapshot(&path).await.unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();
    bytes
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_successful_download_yields_queryable_handle() {
    let payload = snapshot_payload().await;
    let transport = StubTransport::new(StubBehavior::Serve {
        payload: payload.clone(),
        chunk_size: 1024,
    });
    let cache_dir = temp_cache_dir();
    let synchronizer = SnapshotSynchronizer::new(transport.clone(), &cache_dir);

    let snapshot = synchronizer
        .download(&test_token(), &test_reference(), |_, _| {
            ProgressControl::Continue
        })
        .await
        .unwrap();

    let ids = snapshot
        .collect_seed_identifiers("SELECT id FROM elements ORDER BY rowid LIMIT 2")
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);

    snapshot.close().await;
    std::fs::remove_dir_all(&cache_dir).ok();
}

#[tokio::test]
async fn test_progress_is_monotonic_and_bounded() {
    let payload = snapshot_payload().await;
    let total_len = payload.len() as u64;
    let transport = StubTransport::new(StubBehavior::Serve {
        payload,
        chunk_size: 512,
    });
    let cache_dir = temp_cache_dir();
    let synchronizer = SnapshotSynchronizer::new(transport, &cache_dir);

    let mut observed: Vec<(u64, u64)> = Vec::new();
    let snapshot = synchronizer
        .download(&test_token(), &test_reference(), |loaded, total| {
            observed.push((loaded, total));
            ProgressControl::Continue
        })
        .await
        .unwrap();
    snapshot.close().await;

    assert!(observed.len() >= 2, "expected several chunked callbacks");
    let mut previous = 0;
    for (loaded, total) in &observed {
        assert_eq!(*total, total_len);
        assert!(*loaded <= *total);
        assert!(*loaded >= previous, "loaded must be non-decreasing");
        previous = *loaded;
    }
    assert_eq!(observed.last().unwrap().0, total_len);

    std::fs::remove_dir_all(&cache_dir).ok();
}

#[tokio::test]
async fn test_cancel_on_second_callback_leaves_no_artifact() {
    let payload = snapshot_payload().await;
    let transport = StubTransport::new(StubBehavior::Serve {
        payload,
        chunk_size: 256,
    });
    let cache_dir = temp_cache_dir();
    let synchronizer = SnapshotSynchronizer::new(transport, &cache_dir);
    let reference = test_reference();

    let mut calls = 0;
    let result = synchronizer
        .download(&test_token(), &reference, |_, _| {
            calls += 1;
            if calls == 2 {
                ProgressControl::Cancel
            } else {
                ProgressControl::Continue
            }
        })
        .await;

    assert!(matches!(result, Err(SyncError::Cancelled)));
    assert_eq!(calls, 2, "no callbacks may fire after the abort");
    assert!(
        !synchronizer.cache_path(&reference).exists(),
        "no completed artifact may exist after cancellation"
    );
    // The .part sidecar must be gone as well.
    let leftovers: Vec<_> = std::fs::read_dir(&cache_dir)
        .map(|entries| entries.filter_map(|e| e.ok()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "partial artifacts must be removed");

    std::fs::remove_dir_all(&cache_dir).ok();
}

#[tokio::test]
async fn test_cached_snapshot_is_not_retransferred() {
    let payload = snapshot_payload().await;
    let transport = StubTransport::new(StubBehavior::Serve {
        payload,
        chunk_size: 1024,
    });
    let cache_dir = temp_cache_dir();
    let synchronizer = SnapshotSynchronizer::new(transport.clone(), &cache_dir);
    let reference = test_reference();

    let first = synchronizer
        .download(&test_token(), &reference, |_, _| ProgressControl::Continue)
        .await
        .unwrap();
    first.close().await;
    assert_eq!(transport.begin_calls(), 1);

    let mut progress_calls = 0;
    let second = synchronizer
        .download(&test_token(), &reference, |_, _| {
            progress_calls += 1;
            ProgressControl::Continue
        })
        .await
        .unwrap();
    second.close().await;

    assert_eq!(transport.begin_calls(), 1, "cache hit must not re-transfer");
    assert_eq!(progress_calls, 0, "cache hit reports no progress");

    std::fs::remove_dir_all(&cache_dir).ok();
}

#[tokio::test]
async fn test_different_versions_use_separate_cache_entries() {
    let payload = snapshot_payload().await;
    let transport = StubTransport::new(StubBehavior::Serve {
        payload,
        chunk_size: 1024,
    });
    let cache_dir = temp_cache_dir();
    let synchronizer = SnapshotSynchronizer::new(transport.clone(), &cache_dir);

    let latest = SnapshotRef::new("p", "d", SnapshotVersion::Latest);
    let pinned = SnapshotRef::new(
        "p",
        "d",
        SnapshotVersion::AsOf(core_sync::ChangesetId::new("c7")),
    );

    let a = synchronizer
        .download(&test_token(), &latest, |_, _| ProgressControl::Continue)
        .await
        .unwrap();
    a.close().await;
    let b = synchronizer
        .download(&test_token(), &pinned, |_, _| ProgressControl::Continue)
        .await
        .unwrap();
    b.close().await;

    assert_eq!(transport.begin_calls(), 2);

    std::fs::remove_dir_all(&cache_dir).ok();
}

#[tokio::test]
async fn test_unauthorized_is_distinguishable() {
    let transport = StubTransport::new(StubBehavior::Unauthorized);
    let cache_dir = temp_cache_dir();
    let synchronizer = SnapshotSynchronizer::new(transport, &cache_dir);

    let result = synchronizer
        .download(&test_token(), &test_reference(), |_, _| {
            ProgressControl::Continue
        })
        .await;

    assert!(matches!(result, Err(SyncError::Unauthorized)));

    std::fs::remove_dir_all(&cache_dir).ok();
}

#[tokio::test]
async fn test_mid_stream_failure_cleans_up() {
    let payload = snapshot_payload().await;
    let transport = StubTransport::new(StubBehavior::FailAfterFirstChunk {
        payload,
        chunk_size: 128,
    });
    let cache_dir = temp_cache_dir();
    let synchronizer = SnapshotSynchronizer::new(transport, &cache_dir);
    let reference = test_reference();

    let result = synchronizer
        .download(&test_token(), &reference, |_, _| ProgressControl::Continue)
        .await;

    assert!(matches!(result, Err(SyncError::TransferFailed(_))));
    assert!(!synchronizer.cache_path(&reference).exists());

    std::fs::remove_dir_all(&cache_dir).ok();
}

#[tokio::test]
async fn test_truncated_stream_fails() {
    let payload = snapshot_payload().await;
    let declared = payload.len() as u64 + 4096;
    let transport = StubTransport::new(StubBehavior::Truncate { payload, declared });
    let cache_dir = temp_cache_dir();
    let synchronizer = SnapshotSynchronizer::new(transport, &cache_dir);
    let reference = test_reference();

    let result = synchronizer
        .download(&test_token(), &reference, |_, _| ProgressControl::Continue)
        .await;

    assert!(matches!(result, Err(SyncError::TransferFailed(_))));
    assert!(!synchronizer.cache_path(&reference).exists());

    std::fs::remove_dir_all(&cache_dir).ok();
}
