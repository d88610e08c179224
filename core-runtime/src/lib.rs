//! # Runtime Module
//!
//! Shared runtime infrastructure for the snapshot pipeline: structured
//! logging setup, validated pipeline configuration, and runtime errors.
//!
//! ## Overview
//!
//! Every pipeline binary or test harness goes through this crate to
//! initialize `tracing` output and to assemble a [`PipelineConfig`] with
//! fail-fast validation. The crate deliberately knows nothing about the
//! pipeline stages themselves; it only carries the ambient concerns.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
