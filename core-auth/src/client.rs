//! # Authorization Client Boundary
//!
//! Abstracts the identity provider's interactive handshake. Implementations
//! launch whatever external flow they need (system browser, device code,
//! a pre-provisioned token) and report the outcome through a one-shot
//! listener.

use crate::error::Result;
use crate::types::{AccessToken, AuthConfig};
use async_trait::async_trait;
use tracing::debug;

/// One-shot "user state changed" notification.
///
/// Invoked with `Some(token)` when the external process yields a
/// credential, or `None` when the user declines or the flow is abandoned.
pub type UserStateListener = Box<dyn FnOnce(Option<AccessToken>) + Send + 'static>;

/// Boundary to the identity provider's interactive flow.
///
/// # Contract
///
/// `begin_sign_in` must invoke the listener **exactly once**, whenever the
/// external handshake resolves. An implementation that never resolves keeps
/// the caller suspended, which is permitted; dropping the listener without
/// firing it is a contract violation the session surfaces as an error.
#[async_trait]
pub trait AuthorizationClient: Send + Sync {
    /// Prepare the client for use (load provider metadata, warm caches).
    async fn initialize(&self) -> Result<()>;

    /// Start the interactive flow and register the state listener.
    ///
    /// Returns as soon as the flow is launched; the listener fires later,
    /// when the user completes or abandons the handshake.
    async fn begin_sign_in(&self, on_user_state_changed: UserStateListener) -> Result<()>;
}

/// Client that resolves the handshake immediately with a fixed outcome.
///
/// Useful for development and tests, or for environments where a token is
/// provisioned out-of-band (CI, service accounts). Holds the [`AuthConfig`]
/// it was built with so call sites look identical to a real client's.
pub struct StaticTokenClient {
    config: AuthConfig,
    token: Option<AccessToken>,
}

impl StaticTokenClient {
    /// Create a client that signs in successfully with `token`.
    pub fn with_token(config: AuthConfig, token: AccessToken) -> Self {
        Self {
            config,
            token: Some(token),
        }
    }

    /// Create a client whose sign-in is always declined.
    pub fn declined(config: AuthConfig) -> Self {
        Self {
            config,
            token: None,
        }
    }
}

#[async_trait]
impl AuthorizationClient for StaticTokenClient {
    async fn initialize(&self) -> Result<()> {
        debug!(client_id = %self.config.client_id, "Static token client initialized");
        Ok(())
    }

    async fn begin_sign_in(&self, on_user_state_changed: UserStateListener) -> Result<()> {
        on_user_state_changed(self.token.clone());
        Ok(())
    }
}
