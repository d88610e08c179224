//! # Pipeline Configuration Module
//!
//! Builder-based configuration for a pipeline run with fail-fast
//! validation. Every required field is checked at `build()` time with an
//! actionable error message, so a misconfigured pipeline fails before any
//! stage is touched.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::PipelineConfig;
//!
//! let config = PipelineConfig::builder()
//!     .snapshot_url("https://snapshots.example.com/?projectId=p1&datasetId=d1")
//!     .cache_dir("/tmp/snapview-cache")
//!     .seed_query("SELECT id FROM elements LIMIT 10")
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.scope_id, "element");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default selection scope applied when none is configured.
pub const DEFAULT_SCOPE_ID: &str = "element";

/// Default rule set evaluated by the content stage.
pub const DEFAULT_RULESET_ID: &str = "properties";

/// Default display-shape descriptor string form.
pub const DEFAULT_DISPLAY_TYPE: &str = "Grid";

/// Configuration for one pipeline run.
///
/// Construct via [`PipelineConfig::builder`]. All fields are plain data;
/// the orchestrator interprets them when wiring the stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Consumer-facing snapshot reference URL carrying project, dataset and
    /// change-set query parameters.
    pub snapshot_url: String,

    /// Directory where synchronized snapshots are cached.
    pub cache_dir: PathBuf,

    /// Read-only query producing the seed record identifiers. The caller is
    /// responsible for bounding it (e.g. with LIMIT).
    pub seed_query: String,

    /// Selection scope identifier ("element", "assembly", "top-assembly").
    pub scope_id: String,

    /// Rule set evaluated by the content resolution stage.
    pub ruleset_id: String,

    /// Display-shape descriptor string form ("Grid", "List", "PropertyPane").
    pub display_type: String,
}

impl PipelineConfig {
    /// Start building a configuration.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for [`PipelineConfig`] with fail-fast validation.
#[derive(Debug, Default, Clone)]
pub struct PipelineConfigBuilder {
    snapshot_url: Option<String>,
    cache_dir: Option<PathBuf>,
    seed_query: Option<String>,
    scope_id: Option<String>,
    ruleset_id: Option<String>,
    display_type: Option<String>,
}

impl PipelineConfigBuilder {
    /// Set the snapshot reference URL (required).
    pub fn snapshot_url(mut self, url: impl Into<String>) -> Self {
        self.snapshot_url = Some(url.into());
        self
    }

    /// Set the snapshot cache directory (required).
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the seed query (required).
    pub fn seed_query(mut self, query: impl Into<String>) -> Self {
        self.seed_query = Some(query.into());
        self
    }

    /// Set the selection scope identifier (default: "element").
    pub fn scope_id(mut self, scope: impl Into<String>) -> Self {
        self.scope_id = Some(scope.into());
        self
    }

    /// Set the rule set identifier (default: "properties").
    pub fn ruleset_id(mut self, ruleset: impl Into<String>) -> Self {
        self.ruleset_id = Some(ruleset.into());
        self
    }

    /// Set the display-shape descriptor (default: "Grid").
    pub fn display_type(mut self, display_type: impl Into<String>) -> Self {
        self.display_type = Some(display_type.into());
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error naming the first missing or empty required
    /// field.
    pub fn build(self) -> Result<PipelineConfig> {
        let snapshot_url = require_non_empty("snapshot_url", self.snapshot_url)?;
        let seed_query = require_non_empty("seed_query", self.seed_query)?;

        let cache_dir = self.cache_dir.ok_or_else(|| {
            Error::Config("cache_dir is required: set it with .cache_dir(..)".to_string())
        })?;
        if cache_dir.as_os_str().is_empty() {
            return Err(Error::Config("cache_dir must not be empty".to_string()));
        }

        Ok(PipelineConfig {
            snapshot_url,
            cache_dir,
            seed_query,
            scope_id: self
                .scope_id
                .unwrap_or_else(|| DEFAULT_SCOPE_ID.to_string()),
            ruleset_id: self
                .ruleset_id
                .unwrap_or_else(|| DEFAULT_RULESET_ID.to_string()),
            display_type: self
                .display_type
                .unwrap_or_else(|| DEFAULT_DISPLAY_TYPE.to_string()),
        })
    }
}

fn require_non_empty(field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(Error::Config(format!("{} must not be empty", field))),
        None => Err(Error::Config(format!(
            "{} is required: set it with .{}(..)",
            field, field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_builder() -> PipelineConfigBuilder {
        PipelineConfig::builder()
            .snapshot_url("https://snapshots.example.com/?projectId=p&datasetId=d")
            .cache_dir("/tmp/snapview")
            .seed_query("SELECT id FROM elements LIMIT 10")
    }

    #[test]
    fn test_build_with_defaults() {
        let config = valid_builder().build().unwrap();

        assert_eq!(config.scope_id, DEFAULT_SCOPE_ID);
        assert_eq!(config.ruleset_id, DEFAULT_RULESET_ID);
        assert_eq!(config.display_type, DEFAULT_DISPLAY_TYPE);
    }

    #[test]
    fn test_build_with_overrides() {
        let config = valid_builder()
            .scope_id("assembly")
            .ruleset_id("custom-rules")
            .display_type("List")
            .build()
            .unwrap();

        assert_eq!(config.scope_id, "assembly");
        assert_eq!(config.ruleset_id, "custom-rules");
        assert_eq!(config.display_type, "List");
    }

    #[test]
    fn test_missing_snapshot_url() {
        let result = PipelineConfig::builder()
            .cache_dir("/tmp/snapview")
            .seed_query("SELECT id FROM elements")
            .build();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("snapshot_url"));
    }

    #[test]
    fn test_empty_seed_query_rejected() {
        let result = valid_builder().seed_query("   ").build();
        assert!(result.unwrap_err().to_string().contains("seed_query"));
    }

    #[test]
    fn test_missing_cache_dir() {
        let result = PipelineConfig::builder()
            .snapshot_url("https://example.com/?projectId=p&datasetId=d")
            .seed_query("SELECT id FROM elements")
            .build();

        assert!(result.unwrap_err().to_string().contains("cache_dir"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = valid_builder().build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
