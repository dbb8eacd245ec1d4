//! auth::provider
//!
//! RedditAuth - TokenProvider implementation for a Reddit script app.
//!
//! Script apps use the OAuth password grant: the client id/secret are sent as
//! HTTP basic auth and the bot account's username/password as the form body.
//! There is no refresh token; a new access token is requested when the cached
//! one is within [`EXPIRY_BUFFER_SECS`] of expiring.
//!
//! # Example
//!
//! ```no_run
//! use gotw::auth::{RedditAuth, TokenProvider};
//! use gotw::core::paths::GotwPaths;
//! use gotw::secrets;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = GotwPaths::from_env().unwrap();
//! let store = secrets::create_store(secrets::DEFAULT_PROVIDER, &paths)?;
//! let auth = RedditAuth::new("https://www.reddit.com", "gotw/0.3", store);
//! let token = auth.bearer_token().await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::credentials::RedditCredentials;
use super::errors::AuthError;
use super::TokenProvider;
use crate::secrets::SecretStore;

/// Request a new token this long before the cached one expires.
pub const EXPIRY_BUFFER_SECS: i64 = 300;

/// An access token and when it stops working.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(EXPIRY_BUFFER_SECS)
    }
}

/// Body of `POST /api/v1/access_token`.
///
/// Reddit answers a wrong password with `200 {"error": "invalid_grant"}`,
/// so `error` is checked even on success statuses.
#[derive(Deserialize)]
struct TokenReply {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<serde_json::Value>,
}

pub struct RedditAuth {
    auth_base: String,
    user_agent: String,
    client: Client,
    store: Box<dyn SecretStore>,
    cache: RwLock<Option<CachedToken>>,
}

impl RedditAuth {
    /// `auth_base` is the host serving `/api/v1/access_token`
    /// (`https://www.reddit.com` in production).
    pub fn new(auth_base: &str, user_agent: &str, store: Box<dyn SecretStore>) -> Self {
        Self {
            auth_base: auth_base.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            client: Client::new(),
            store,
            cache: RwLock::new(None),
        }
    }

    fn token_url(&self) -> String {
        format!("{}/api/v1/access_token", self.auth_base)
    }

    fn cached(&self) -> Option<String> {
        let cache = self.cache.read().ok()?;
        cache
            .as_ref()
            .filter(|t| t.is_fresh(Utc::now()))
            .map(|t| t.access_token.clone())
    }

    fn update_cache(&self, token: Option<CachedToken>) {
        if let Ok(mut cache) = self.cache.write() {
            *cache = token;
        }
    }

    /// Persist new credentials and drop any cached token.
    pub fn store_credentials(&self, credentials: &RedditCredentials) -> Result<(), AuthError> {
        credentials.save(self.store.as_ref())?;
        self.update_cache(None);
        Ok(())
    }

    /// Delete stored credentials (logout).
    pub fn delete_credentials(&self) -> Result<(), AuthError> {
        RedditCredentials::delete(self.store.as_ref())?;
        self.update_cache(None);
        Ok(())
    }

    /// The stored bot username, if any.
    pub fn username(&self) -> Option<String> {
        RedditCredentials::load(self.store.as_ref())
            .ok()
            .flatten()
            .map(|c| c.username)
    }

    async fn request_token(&self, credentials: &RedditCredentials) -> Result<CachedToken, AuthError> {
        tracing::debug!(username = %credentials.username, "requesting Reddit access token");

        let response = self
            .client
            .post(self.token_url())
            .header(USER_AGENT, &self.user_agent)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidCredentials(
                "client id or secret rejected".into(),
            ));
        }
        if !status.is_success() {
            return Err(AuthError::RedditApi {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let reply: TokenReply = serde_json::from_str(&body)
            .map_err(|_| AuthError::TokenRequest("response is not a token reply".into()))?;

        if let Some(error) = reply.error {
            let code = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            return Err(AuthError::InvalidCredentials(code));
        }

        match (reply.access_token, reply.expires_in) {
            (Some(access_token), Some(expires_in)) => Ok(CachedToken {
                access_token,
                expires_at: Utc::now() + Duration::seconds(expires_in),
            }),
            _ => Err(AuthError::TokenRequest(
                "reply is missing access_token or expires_in".into(),
            )),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for RedditAuth {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }

        let credentials =
            RedditCredentials::load(self.store.as_ref())?.ok_or(AuthError::NotAuthenticated)?;
        let token = self.request_token(&credentials).await?;
        let access_token = token.access_token.clone();
        self.update_cache(Some(token));
        Ok(access_token)
    }

    fn is_authenticated(&self) -> bool {
        matches!(RedditCredentials::load(self.store.as_ref()), Ok(Some(_)))
    }

    fn host(&self) -> &str {
        &self.auth_base
    }

    fn invalidate(&self) {
        self.update_cache(None);
    }
}

impl std::fmt::Debug for RedditAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.cache.read().map(|c| c.is_some()).unwrap_or(false);
        f.debug_struct("RedditAuth")
            .field("auth_base", &self.auth_base)
            .field("user_agent", &self.user_agent)
            .field("has_cached_token", &cached)
            .finish_non_exhaustive()
    }
}
