//! auth - Reddit script-app authentication
//!
//! # Components
//!
//! - [`RedditCredentials`] - client id/secret and bot account, kept in the secret store
//! - [`TokenProvider`] - trait for handing bearer tokens to the site adapter
//! - [`RedditAuth`] - password-grant implementation of `TokenProvider`
//!
//! # Security
//!
//! Passwords, client secrets and access tokens never appear in logs, error
//! messages or `Debug` output.

mod credentials;
mod errors;
mod provider;

pub use credentials::{RedditCredentials, BGG_TOKEN_KEY, REDDIT_CREDENTIALS_KEY};
pub use errors::AuthError;
pub use provider::{RedditAuth, EXPIRY_BUFFER_SECS};

use crate::secrets::SecretStore;

/// Provides bearer tokens to the site adapter.
///
/// Implementors must never log or expose token values.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a valid bearer token, requesting a new one if necessary.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotAuthenticated`] if no credentials exist
    /// - [`AuthError::InvalidCredentials`] if Reddit rejects them
    async fn bearer_token(&self) -> Result<String, AuthError>;

    /// Whether credentials are available. Does not contact the server.
    fn is_authenticated(&self) -> bool;

    /// The host this provider authenticates against.
    fn host(&self) -> &str;

    /// Forget any cached token so the next call requests a new one.
    fn invalidate(&self) {}
}

/// Read the optional BoardGameGeek token.
///
/// Store errors are logged and treated as "no token".
pub fn bgg_token(store: &dyn SecretStore) -> Option<String> {
    match store.get(BGG_TOKEN_KEY) {
        Ok(token) => token.filter(|t| !t.trim().is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "cannot read BoardGameGeek token");
            None
        }
    }
}
