//! # Snapshot Reference Module
//!
//! Identifies a remote dataset instance and the requested version, and
//! parses the consumer-facing URL encoding.
//!
//! A reference is immutable once constructed. The URL form carries
//! `projectId`, `datasetId` (legacy alias `iModelId`) and `changeSetId`
//! query parameters; the whole URL is case-normalized before parsing, so
//! parameter names and identifier values are matched case-insensitively.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Opaque change marker naming one version of a remote dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangesetId(String);

impl ChangesetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangesetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Requested snapshot version: the newest available state, or the dataset
/// as of a specific change marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SnapshotVersion {
    #[default]
    Latest,
    AsOf(ChangesetId),
}

impl SnapshotVersion {
    /// Stable string form used in cache keys and transport URLs.
    pub fn as_selector(&self) -> String {
        match self {
            SnapshotVersion::Latest => "latest".to_string(),
            SnapshotVersion::AsOf(changeset) => changeset.as_str().to_string(),
        }
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotVersion::Latest => write!(f, "latest"),
            SnapshotVersion::AsOf(changeset) => write!(f, "as-of {}", changeset),
        }
    }
}

/// Immutable reference to one remote dataset instance at one version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotRef {
    /// Owning project identifier
    pub project_id: String,
    /// Dataset identifier within the project
    pub dataset_id: String,
    /// Requested version
    pub version: SnapshotVersion,
}

impl SnapshotRef {
    /// Build a reference directly.
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        version: SnapshotVersion,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            version,
        }
    }

    /// Parse the consumer-facing URL encoding.
    ///
    /// The URL is lowercased before parsing. `projectid` and `datasetid`
    /// (alias `imodelid`) are required; a missing or empty `changesetid`
    /// selects the latest version.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_sync::{SnapshotRef, SnapshotVersion};
    ///
    /// let reference = SnapshotRef::parse(
    ///     "https://snapshots.example.com/?projectId=P1&datasetId=D1&changeSetId=",
    /// ).unwrap();
    /// assert_eq!(reference.project_id, "p1");
    /// assert_eq!(reference.version, SnapshotVersion::Latest);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` when the URL does not parse or a required
    /// parameter is missing or empty.
    pub fn parse(url_string: &str) -> Result<Self> {
        let url = Url::parse(&url_string.to_lowercase())
            .map_err(|e| SyncError::InvalidReference(format!("unparseable URL: {}", e)))?;

        let param = |names: &[&str]| -> Option<String> {
            url.query_pairs()
                .find(|(key, _)| names.contains(&key.as_ref()))
                .map(|(_, value)| value.into_owned())
        };

        let project_id = param(&["projectid"])
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SyncError::InvalidReference("missing projectId".to_string()))?;

        let dataset_id = param(&["datasetid", "imodelid"])
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                SyncError::InvalidReference("missing datasetId (or iModelId)".to_string())
            })?;

        // An absent or empty change marker means "latest".
        let version = match param(&["changesetid"]).filter(|v| !v.is_empty()) {
            Some(changeset) => SnapshotVersion::AsOf(ChangesetId::new(changeset)),
            None => SnapshotVersion::Latest,
        };

        Ok(Self {
            project_id,
            dataset_id,
            version,
        })
    }

    /// Deterministic, filesystem-safe key identifying this exact reference
    /// in the local cache.
    ///
    /// Distinct references always map to distinct keys: pinned versions are
    /// prefixed so a changeset literally named "latest" cannot collide with
    /// the latest-version selector, and the component encoding is injective.
    pub fn cache_key(&self) -> String {
        let version = match &self.version {
            SnapshotVersion::Latest => "latest".to_string(),
            SnapshotVersion::AsOf(changeset) => format!("asof-{}", sanitize(changeset.as_str())),
        };
        format!(
            "{}_{}_{}",
            sanitize(&self.project_id),
            sanitize(&self.dataset_id),
            version,
        )
    }
}

impl fmt::Display for SnapshotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({})",
            self.project_id, self.dataset_id, self.version
        )
    }
}

/// Filesystem-safe, injective encoding of one key component.
///
/// ASCII alphanumerics pass through; every other byte becomes `-` plus its
/// two-digit lowercase hex value. Distinct inputs keep distinct outputs, and
/// the `_` component separator cannot be forged from inside a component.
fn sanitize(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for byte in part.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(byte as char);
        } else {
            out.push_str(&format!("-{:02x}", byte));
        }
    }
    out
}
