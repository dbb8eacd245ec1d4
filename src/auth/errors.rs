//! auth::errors
//!
//! Authentication error types for the Reddit password grant.
//!
//! Messages never contain passwords, client secrets or access tokens.
//!
//! # Example
//!
//! ```
//! use gotw::auth::AuthError;
//!
//! let err = AuthError::NotAuthenticated;
//! assert!(err.to_string().contains("gotw auth"));
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No credentials are stored.
    #[error("no Reddit credentials stored. Run 'gotw auth'.")]
    NotAuthenticated,

    /// Reddit rejected the username/password or the app credentials.
    #[error("Reddit rejected the credentials ({0}). Run 'gotw auth' again.")]
    InvalidCredentials(String),

    /// The token endpoint answered with something we could not use.
    #[error("token request failed: {0}")]
    TokenRequest(String),

    /// Stored credentials cannot be parsed.
    #[error("invalid stored credentials: {0}")]
    InvalidCredentialRecord(String),

    #[error("secret store error: {0}")]
    SecretStore(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("Reddit API error: {status} - {message}")]
    RedditApi { status: u16, message: String },
}

impl AuthError {
    /// True for errors resolved by running `gotw auth`.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            AuthError::NotAuthenticated
                | AuthError::InvalidCredentials(_)
                | AuthError::InvalidCredentialRecord(_)
        )
    }

    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Network(_) => true,
            AuthError::RedditApi { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<crate::secrets::SecretError> for AuthError {
    fn from(err: crate::secrets::SecretError) -> Self {
        AuthError::SecretStore(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL: it carries no secret, but keeps messages short.
        AuthError::Network(err.without_url().to_string())
    }
}
