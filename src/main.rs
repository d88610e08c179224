//! Console front end for the snapshot pipeline.
//!
//! Configuration comes from environment variables:
//!
//! ```bash
//! SNAPVIEW_URL="https://snapshots.example.com/?projectId=p1&datasetId=d1" \
//! SNAPVIEW_ENDPOINT="https://api.example.com/snapshots" \
//! SNAPVIEW_TOKEN="..." \
//! snapview
//! ```
//!
//! Optional: `SNAPVIEW_CACHE_DIR`, `SNAPVIEW_SEED_QUERY`, `SNAPVIEW_SCOPE`,
//! `SNAPVIEW_DISPLAY_TYPE`, and `RUST_LOG` for log filtering.

use anyhow::Context;
use core_auth::{AccessToken, AuthConfig, IdentitySession, StaticTokenClient};
use core_presentation::{Content, PresentationEngine, ValueKind};
use core_runtime::{init_logging, LoggingConfig, PipelineConfig};
use core_sync::{HttpSnapshotTransport, ProgressControl, SnapshotSynchronizer};
use snapview_pipeline::{Pipeline, PipelineOutcome};
use std::io::Write;
use std::sync::Arc;

const DEFAULT_SEED_QUERY: &str =
    "SELECT id FROM elements WHERE parent_id IS NULL ORDER BY rowid LIMIT 10";

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default()).context("failed to initialize logging")?;

    let snapshot_url = std::env::var("SNAPVIEW_URL")
        .context("SNAPVIEW_URL is required (snapshot reference URL)")?;
    let endpoint = std::env::var("SNAPVIEW_ENDPOINT")
        .context("SNAPVIEW_ENDPOINT is required (snapshot service base URL)")?;

    let config = PipelineConfig::builder()
        .snapshot_url(snapshot_url)
        .cache_dir(env_or(
            "SNAPVIEW_CACHE_DIR",
            &std::env::temp_dir().join("snapview-cache").to_string_lossy(),
        ))
        .seed_query(env_or("SNAPVIEW_SEED_QUERY", DEFAULT_SEED_QUERY))
        .scope_id(env_or("SNAPVIEW_SCOPE", snapview_pipeline::DEFAULT_SCOPE_ID))
        .display_type(env_or(
            "SNAPVIEW_DISPLAY_TYPE",
            snapview_pipeline::DEFAULT_DISPLAY_TYPE,
        ))
        .build()
        .context("invalid pipeline configuration")?;

    // Interactive providers plug in behind AuthorizationClient; the console
    // build authenticates with a pre-issued token (or declines without one).
    let auth_config = AuthConfig::new(
        env_or("SNAPVIEW_CLIENT_ID", "snapview-console"),
        env_or("SNAPVIEW_REDIRECT_URI", "http://localhost:3000/signin"),
        env_or("SNAPVIEW_AUTH_SCOPE", "openid snapshots:read"),
    );
    let client = match std::env::var("SNAPVIEW_TOKEN") {
        Ok(token) => StaticTokenClient::with_token(auth_config, AccessToken::new(token)),
        Err(_) => StaticTokenClient::declined(auth_config),
    };

    let cache_dir = config.cache_dir.clone();
    let mut pipeline = Pipeline::new(
        IdentitySession::new(Arc::new(client)),
        SnapshotSynchronizer::new(Arc::new(HttpSnapshotTransport::new(endpoint)), cache_dir),
        PresentationEngine::new(),
        config,
    );

    let outcome = pipeline
        .run(|loaded, total| {
            let percent = if total == 0 {
                100.0
            } else {
                loaded as f64 / total as f64 * 100.0
            };
            print!("\rDownloaded: {:.2} %", percent);
            std::io::stdout().flush().ok();
            ProgressControl::Continue
        })
        .await;
    println!();

    match outcome? {
        PipelineOutcome::Declined => {
            println!("Sign-in declined.");
        }
        PipelineOutcome::Resolved(None) => {
            println!("No content for the current selection.");
        }
        PipelineOutcome::Resolved(Some(content)) => {
            print_content(&content);
        }
    }

    Ok(())
}

/// Print each primitive field's label with its formatted and persisted
/// values, one record per block.
fn print_content(content: &Content) {
    for item in &content.content_set {
        println!("{} ({})", item.key.id, item.key.class_name);
        for field in &content.descriptor.fields {
            if field.kind != ValueKind::Primitive {
                continue;
            }
            let display = item
                .display_values
                .get(&field.name)
                .map(String::as_str)
                .unwrap_or("");
            let persisted = item
                .values
                .get(&field.name)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            println!("  {}: {} (raw: {})", field.label, display, persisted);
        }
    }
}
