//! # Snapview Pipeline
//!
//! Linear orchestration of the full snapshot-to-content flow:
//!
//! 1. Interactive sign-in through an [`IdentitySession`]; a declined sign-in
//!    ends the run as a normal negative outcome.
//! 2. Parse the configured snapshot reference URL.
//! 3. Synchronize the referenced snapshot to the local cache, reporting
//!    progress through the caller's callback (which may cancel).
//! 4. Initialize the presentation engine, register the built-in
//!    `properties` ruleset.
//! 5. Seed query, selection scoping, content computation, strictly in order.
//!
//! Once a snapshot handle is open it is closed on every exit path, and once
//! the engine is initialized it is torn down on every exit path. No stage
//! failure is retried or swallowed.

use core_auth::{AuthError, IdentitySession};
use core_presentation::{
    Content, ContentSpecification, DescriptorOverrides, DisplayType, PresentationEngine,
    PresentationError, Rule, Ruleset, RulesetOrId,
};
use core_runtime::config::PipelineConfig;
use core_snapshot::{LocalSnapshot, SnapshotError};
use core_sync::{ProgressControl, SnapshotRef, SnapshotSynchronizer, SyncError};
use thiserror::Error;
use tracing::{info, instrument};

pub use core_runtime::config::{
    PipelineConfigBuilder, DEFAULT_DISPLAY_TYPE, DEFAULT_RULESET_ID, DEFAULT_SCOPE_ID,
};

/// Errors from any pipeline stage, propagated unaltered.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Synchronization failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Content resolution failed: {0}")]
    Presentation(#[from] PresentationError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// How a completed pipeline run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The user declined to sign in; no later stage was touched.
    Declined,
    /// The full flow ran; `None` means the ruleset produced no content for
    /// the selection.
    Resolved(Option<Content>),
}

/// The built-in ruleset registered for every run: one blanket
/// specification contributing every selected record's properties.
pub fn builtin_properties_ruleset() -> Ruleset {
    Ruleset::new(
        DEFAULT_RULESET_ID,
        vec![Rule::content(vec![ContentSpecification::SelectedInstances])],
    )
}

/// Linear orchestrator over the pipeline's collaborators.
pub struct Pipeline {
    session: IdentitySession,
    synchronizer: SnapshotSynchronizer,
    engine: PresentationEngine,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        session: IdentitySession,
        synchronizer: SnapshotSynchronizer,
        engine: PresentationEngine,
        config: PipelineConfig,
    ) -> Self {
        Self {
            session,
            synchronizer,
            engine,
            config,
        }
    }

    /// Run the pipeline end to end.
    ///
    /// `on_progress(loaded, total)` fires during the snapshot transfer; a
    /// [`ProgressControl::Cancel`] answer aborts the run with
    /// `SyncError::Cancelled`.
    #[instrument(skip(self, on_progress))]
    pub async fn run(
        &mut self,
        on_progress: impl FnMut(u64, u64) -> ProgressControl + Send,
    ) -> Result<PipelineOutcome> {
        // Validate config-driven inputs before any stage runs.
        let reference = SnapshotRef::parse(&self.config.snapshot_url)?;
        let display_type = DisplayType::parse(&self.config.display_type).ok_or_else(|| {
            core_runtime::Error::Config(format!(
                "display_type must be one of Grid, List, PropertyPane (got {:?})",
                self.config.display_type
            ))
        })?;

        let Some(token) = self.session.sign_in().await? else {
            info!("Sign-in declined, ending run");
            return Ok(PipelineOutcome::Declined);
        };
        info!("Signed in");

        let snapshot = self
            .synchronizer
            .download(&token, &reference, on_progress)
            .await?;

        // The handle and the engine are live from here; release both on
        // every exit path.
        self.engine.initialize();
        let result = self.resolve_content(&snapshot, display_type).await;
        self.engine.teardown();
        snapshot.close().await;

        Ok(PipelineOutcome::Resolved(result?))
    }

    async fn resolve_content(
        &mut self,
        snapshot: &LocalSnapshot,
        display_type: DisplayType,
    ) -> Result<Option<Content>> {
        self.engine.register_ruleset(builtin_properties_ruleset())?;

        let ids = snapshot
            .collect_seed_identifiers(&self.config.seed_query)
            .await?;
        info!(count = ids.len(), "Seed query complete");

        let keys = self
            .engine
            .compute_selection(snapshot, &ids, &self.config.scope_id)
            .await?;

        let content = self
            .engine
            .get_content(
                snapshot,
                &RulesetOrId::Id(self.config.ruleset_id.clone()),
                &DescriptorOverrides::new(display_type),
                &keys,
            )
            .await?;

        info!(resolved = content.is_some(), "Content resolution complete");
        Ok(content)
    }
}
