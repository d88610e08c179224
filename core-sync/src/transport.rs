//! # Transport Boundary
//!
//! Abstracts the remote dataset transfer protocol. The synchronizer only
//! needs "begin a transfer, then pull chunks"; everything else (endpoints,
//! authentication headers, resumption) is an implementation concern.
//!
//! [`HttpSnapshotTransport`] is the production adapter over `reqwest`. It
//! maps authorization rejections to [`SyncError::Unauthorized`] so callers
//! can distinguish "re-authenticate" from "retry the transfer".

use crate::error::{Result, SyncError};
use crate::reference::SnapshotRef;
use async_trait::async_trait;
use bytes::Bytes;
use core_auth::AccessToken;
use futures::StreamExt;
use tracing::{debug, instrument, warn};

/// An in-flight snapshot transfer producing chunks in order.
#[async_trait]
pub trait SnapshotStream: Send {
    /// Total bytes the remote declared for this transfer.
    fn total_bytes(&self) -> u64;

    /// Pull the next chunk; `None` signals a clean end of stream.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// Boundary to the remote dataset transfer protocol.
#[async_trait]
pub trait SnapshotTransport: Send + Sync {
    /// Start transferring the referenced snapshot.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when the credential is rejected; `TransferFailed`
    /// for any other transport-level problem.
    async fn begin(
        &self,
        token: &AccessToken,
        reference: &SnapshotRef,
    ) -> Result<Box<dyn SnapshotStream>>;
}

/// HTTP transport adapter over `reqwest`.
///
/// Issues `GET {endpoint}/{project}/{dataset}?version={selector}` with a
/// bearer credential and streams the response body.
pub struct HttpSnapshotTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSnapshotTransport {
    /// Create a transport against the given base endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn download_url(&self, reference: &SnapshotRef) -> String {
        format!(
            "{}/{}/{}?version={}",
            self.endpoint,
            reference.project_id,
            reference.dataset_id,
            reference.version.as_selector()
        )
    }
}

#[async_trait]
impl SnapshotTransport for HttpSnapshotTransport {
    #[instrument(skip(self, token), fields(reference = %reference))]
    async fn begin(
        &self,
        token: &AccessToken,
        reference: &SnapshotRef,
    ) -> Result<Box<dyn SnapshotStream>> {
        let url = self.download_url(reference);
        debug!(url = %url, "Requesting snapshot transfer");

        let response = self
            .client
            .get(&url)
            .header("Authorization", token.bearer())
            .send()
            .await
            .map_err(|e| SyncError::TransferFailed(format!("request failed: {}", e)))?;

        match response.status().as_u16() {
            200 => {}
            401 | 403 => {
                warn!(status = response.status().as_u16(), "Credential rejected");
                return Err(SyncError::Unauthorized);
            }
            status => {
                return Err(SyncError::TransferFailed(format!(
                    "remote returned status {}",
                    status
                )));
            }
        }

        let total_bytes = response.content_length().ok_or_else(|| {
            SyncError::TransferFailed("remote did not declare a content length".to_string())
        })?;

        Ok(Box::new(HttpSnapshotStream {
            total_bytes,
            body: response.bytes_stream().boxed(),
        }))
    }
}

struct HttpSnapshotStream {
    total_bytes: u64,
    body: futures::stream::BoxStream<'static, reqwest::Result<Bytes>>,
}

#[async_trait]
impl SnapshotStream for HttpSnapshotStream {
    fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        match self.body.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(SyncError::TransferFailed(format!(
                "stream interrupted: {}",
                e
            ))),
            None => Ok(None),
        }
    }
}
