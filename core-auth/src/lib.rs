//! # Authentication Module
//!
//! Interactive sign-in session against an external identity provider.
//!
//! ## Overview
//!
//! This module bridges an externally-driven authentication handshake (the
//! user completes sign-in out-of-band, e.g. in a browser) to a single async
//! result: an access token, or nothing when the user declines. The provider
//! protocol itself lives behind the [`AuthorizationClient`] boundary; this
//! crate only owns the one-shot listener bridge and the session contract.
//!
//! ## Features
//!
//! - One-shot "user state changed" listener, consumed and never re-armed
//! - Single sign-in in flight per session instance
//! - Redacted token debug output
//! - Pluggable client implementations behind an async trait

pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use client::{AuthorizationClient, StaticTokenClient, UserStateListener};
pub use error::{AuthError, Result};
pub use session::IdentitySession;
pub use types::{AccessToken, AuthConfig};
