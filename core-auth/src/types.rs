use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque access credential issued by the identity provider.
///
/// Valid once issued; expiry tracking is the provider's concern, not this
/// crate's. The token value never appears in `Debug` output.
///
/// # Examples
///
/// ```
/// use core_auth::AccessToken;
///
/// let token = AccessToken::new("eyJhbGciOi...");
/// assert_eq!(token.bearer(), "Bearer eyJhbGciOi...");
/// assert!(!format!("{:?}", token).contains("eyJhbGciOi"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The token formatted as an HTTP Authorization header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Never log credentials.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// Configuration handed to an [`AuthorizationClient`] implementation.
///
/// Carries the interactive flow's client identifier, redirect target and
/// requested scope string. What the provider does with them is its own
/// business; this crate treats the handshake as opaque.
///
/// [`AuthorizationClient`]: crate::client::AuthorizationClient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth-style client identifier
    pub client_id: String,
    /// Redirect target for the interactive callback
    pub redirect_uri: String,
    /// Space-separated scope string requested from the provider
    pub scope: String,
}

impl AuthConfig {
    /// Create a configuration for the interactive flow.
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scope: scope.into(),
        }
    }
}
