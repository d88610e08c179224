//! # Identity Session
//!
//! Bridges the provider's callback-style "user state changed" notification
//! to a single awaitable sign-in result.
//!
//! The bridge is a one-shot channel: the sender is moved into the listener
//! handed to the [`AuthorizationClient`], so the listener is consumed by
//! construction and can never fire twice. If the external process never
//! responds, the await never resolves; callers needing a bounded wait wrap
//! the call in their own timeout.

use crate::client::AuthorizationClient;
use crate::error::{AuthError, Result};
use crate::types::AccessToken;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{info, instrument, warn};

/// Interactive sign-in session against one identity provider.
///
/// # Examples
///
/// ```
/// use core_auth::{AccessToken, AuthConfig, IdentitySession, StaticTokenClient};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> core_auth::Result<()> {
/// let config = AuthConfig::new("snapview-desktop", "http://localhost:3000/cb", "openid");
/// let client = Arc::new(StaticTokenClient::with_token(config, AccessToken::new("t")));
///
/// let session = IdentitySession::new(client);
/// match session.sign_in().await? {
///     Some(token) => println!("signed in: {}", token.bearer()),
///     None => println!("sign-in declined"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct IdentitySession {
    client: Arc<dyn AuthorizationClient>,
    // Held for the duration of a sign-in; a second caller finds it locked.
    in_flight: Mutex<()>,
}

impl IdentitySession {
    /// Create a session over the given client boundary.
    pub fn new(client: Arc<dyn AuthorizationClient>) -> Self {
        Self {
            client,
            in_flight: Mutex::new(()),
        }
    }

    /// Run the interactive sign-in handshake to completion.
    ///
    /// Initializes the client, arms exactly one one-shot state listener and
    /// suspends until the external process resolves it. `Some(token)` is a
    /// successful sign-in; `None` means the user declined — a normal
    /// negative outcome, not an error.
    ///
    /// # Errors
    ///
    /// - `SignInInProgress` when another sign-in on this session has not
    ///   resolved yet.
    /// - `ListenerDropped` when the client discards the listener without
    ///   firing it.
    /// - Client initialization and launch failures pass through.
    #[instrument(skip(self))]
    pub async fn sign_in(&self) -> Result<Option<AccessToken>> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| AuthError::SignInInProgress)?;

        self.client.initialize().await?;

        let (tx, rx) = oneshot::channel();
        let listener = Box::new(move |state: Option<AccessToken>| {
            // A second invocation is impossible: the sender is consumed here.
            let _ = tx.send(state);
        });

        info!("Starting interactive sign-in");
        self.client.begin_sign_in(listener).await?;

        match rx.await {
            Ok(Some(token)) => {
                info!("Sign-in completed with a credential");
                Ok(Some(token))
            }
            Ok(None) => {
                info!("Sign-in declined by the user");
                Ok(None)
            }
            Err(_) => {
                warn!("Authorization client dropped the state listener");
                Err(AuthError::ListenerDropped)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{StaticTokenClient, UserStateListener};
    use crate::types::AuthConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config() -> AuthConfig {
        AuthConfig::new("test-client", "http://localhost:3000/cb", "openid")
    }

    /// Client that parks the listener on a channel so tests control when
    /// (and whether) the external handshake resolves.
    struct DeferredClient {
        listeners: tokio::sync::Mutex<Option<tokio::sync::mpsc::UnboundedSender<UserStateListener>>>,
        begin_calls: AtomicUsize,
    }

    impl DeferredClient {
        fn new() -> (Arc<Self>, tokio::sync::mpsc::UnboundedReceiver<UserStateListener>) {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            (
                Arc::new(Self {
                    listeners: tokio::sync::Mutex::new(Some(tx)),
                    begin_calls: AtomicUsize::new(0),
                }),
                rx,
            )
        }
    }

    #[async_trait]
    impl AuthorizationClient for DeferredClient {
        async fn initialize(&self) -> Result<()> {
            Ok(())
        }

        async fn begin_sign_in(&self, on_user_state_changed: UserStateListener) -> Result<()> {
            self.begin_calls.fetch_add(1, Ordering::SeqCst);
            let guard = self.listeners.lock().await;
            guard
                .as_ref()
                .expect("sender taken")
                .send(on_user_state_changed)
                .ok();
            Ok(())
        }
    }

    /// Client that drops the listener instead of firing it.
    struct ForgetfulClient;

    #[async_trait]
    impl AuthorizationClient for ForgetfulClient {
        async fn initialize(&self) -> Result<()> {
            Ok(())
        }

        async fn begin_sign_in(&self, on_user_state_changed: UserStateListener) -> Result<()> {
            drop(on_user_state_changed);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sign_in_resolves_with_token() {
        let client = Arc::new(StaticTokenClient::with_token(
            test_config(),
            AccessToken::new("abc"),
        ));
        let session = IdentitySession::new(client);

        let result = session.sign_in().await.unwrap();
        assert_eq!(result, Some(AccessToken::new("abc")));
    }

    #[tokio::test]
    async fn test_sign_in_resolves_with_none_on_decline() {
        let session = IdentitySession::new(Arc::new(StaticTokenClient::declined(test_config())));
        assert_eq!(session.sign_in().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_suspends_until_external_resolution() {
        let (client, mut listeners) = DeferredClient::new();
        let session = Arc::new(IdentitySession::new(client.clone()));

        let session_clone = session.clone();
        let pending = tokio::spawn(async move { session_clone.sign_in().await });

        // The handshake is parked; resolve it from "outside".
        let listener = listeners.recv().await.unwrap();
        listener(Some(AccessToken::new("external")));

        let result = pending.await.unwrap().unwrap();
        assert_eq!(result, Some(AccessToken::new("external")));
        assert_eq!(client.begin_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_sign_in_rejected() {
        let (client, mut listeners) = DeferredClient::new();
        let session = Arc::new(IdentitySession::new(client));

        let session_clone = session.clone();
        let pending = tokio::spawn(async move { session_clone.sign_in().await });

        // Wait until the first call has armed its listener.
        let listener = listeners.recv().await.unwrap();

        let second = session.sign_in().await;
        assert!(matches!(second, Err(AuthError::SignInInProgress)));

        listener(None);
        assert_eq!(pending.await.unwrap().unwrap(), None);
    }

    #[tokio::test]
    async fn test_dropped_listener_is_an_error() {
        let session = IdentitySession::new(Arc::new(ForgetfulClient));
        let result = session.sign_in().await;
        assert!(matches!(result, Err(AuthError::ListenerDropped)));
    }

    #[tokio::test]
    async fn test_session_usable_after_completed_sign_in() {
        let session = IdentitySession::new(Arc::new(StaticTokenClient::declined(test_config())));
        assert_eq!(session.sign_in().await.unwrap(), None);
        // The in-flight guard must release once the first call resolves.
        assert_eq!(session.sign_in().await.unwrap(), None);
    }
}
