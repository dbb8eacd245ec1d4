//! auth::credentials
//!
//! Reddit script-app credentials as stored in the secret store.
//!
//! The record is a JSON object under [`REDDIT_CREDENTIALS_KEY`]. `Debug` shows
//! the client id and username only.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::AuthError;
use crate::secrets::SecretStore;

/// Secret store key holding the Reddit credential record.
pub const REDDIT_CREDENTIALS_KEY: &str = "reddit.credentials";

/// Secret store key holding the optional BoardGameGeek API token.
pub const BGG_TOKEN_KEY: &str = "bgg.token";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl RedditCredentials {
    /// Load from `store`; `Ok(None)` when nothing is stored.
    pub fn load(store: &dyn SecretStore) -> Result<Option<Self>, AuthError> {
        match store.get(REDDIT_CREDENTIALS_KEY)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                // serde_json errors can quote input; keep only the position.
                .map_err(|e| {
                    AuthError::InvalidCredentialRecord(format!(
                        "line {} column {}",
                        e.line(),
                        e.column()
                    ))
                }),
            None => Ok(None),
        }
    }

    pub fn save(&self, store: &dyn SecretStore) -> Result<(), AuthError> {
        let json = serde_json::to_string(self)
            .map_err(|e| AuthError::InvalidCredentialRecord(e.to_string()))?;
        store.set(REDDIT_CREDENTIALS_KEY, &json)?;
        Ok(())
    }

    pub fn delete(store: &dyn SecretStore) -> Result<(), AuthError> {
        store.delete(REDDIT_CREDENTIALS_KEY)?;
        Ok(())
    }
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::FileSecretStore;
    use tempfile::TempDir;

    fn sample() -> RedditCredentials {
        RedditCredentials {
            client_id: "app-id".into(),
            client_secret: "app-secret-value".into(),
            username: "gotw_bot".into(),
            password: "hunter2".into(),
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let debug = format!("{:?}", sample());
        assert!(debug.contains("gotw_bot"));
        assert!(debug.contains("app-id"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("app-secret-value"));
    }

    #[test]
    fn save_load_delete() {
        let temp = TempDir::new().unwrap();
        let store = FileSecretStore::with_path(temp.path().join("secrets.toml"));

        assert!(RedditCredentials::load(&store).unwrap().is_none());
        sample().save(&store).unwrap();
        assert_eq!(RedditCredentials::load(&store).unwrap(), Some(sample()));

        RedditCredentials::delete(&store).unwrap();
        assert!(RedditCredentials::load(&store).unwrap().is_none());
    }

    #[test]
    fn corrupt_record_error_hides_content() {
        let temp = TempDir::new().unwrap();
        let store = FileSecretStore::with_path(temp.path().join("secrets.toml"));
        store
            .set(REDDIT_CREDENTIALS_KEY, "{\"password\": \"hunter2\"")
            .unwrap();

        let err = RedditCredentials::load(&store).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentialRecord(_)));
        assert!(!err.to_string().contains("hunter2"));
    }
}
