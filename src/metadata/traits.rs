//! metadata::traits
//!
//! The `MetadataSource` trait and the record it returns.
//!
//! # Design
//!
//! Lookups are async because every real source is a network service. A
//! successful lookup that finds nothing is `Ok(None)`, not an error: the
//! calendar check and the "next week" line both need to tell "no such game"
//! apart from "the source is down".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from metadata lookups.
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    /// The source rejected our credentials.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// The source returned an error status.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message or body excerpt
        message: String,
    },

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// One ranking line, e.g. `Board Game Rank: 523`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    /// Human-readable rank name.
    pub label: String,
    /// Rank value; may be non-numeric (`Not Ranked`).
    pub value: String,
}

/// Everything the announcement needs to know about one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    /// Source-side id, used for the game's page link.
    pub id: u64,
    /// Primary name as the source spells it.
    pub name: String,
    /// Image URL, possibly protocol-relative (`//cf.geekdo-images.com/...`).
    pub image: Option<String>,
    pub year: Option<i32>,
    pub designers: Vec<String>,
    pub publishers: Vec<String>,
    pub mechanics: Vec<String>,
    pub expansions: Vec<String>,
    pub min_players: u32,
    pub max_players: u32,
    /// Minutes.
    pub playing_time: u32,
    pub rating_average: f64,
    pub users_rated: u64,
    pub ranks: Vec<Rank>,
    pub description: String,
}

impl GameMetadata {
    /// Link to the game's page on the source site.
    pub fn page_url(&self) -> String {
        format!("https://boardgamegeek.com/boardgame/{}", self.id)
    }

    /// Image URL with a scheme, if there is an image.
    pub fn image_url(&self) -> Option<String> {
        self.image.as_deref().map(|image| {
            if image.starts_with("//") {
                format!("https:{}", image)
            } else {
                image.to_string()
            }
        })
    }
}

/// A source of game metadata.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one source can serve the whole
/// pipeline.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Source name for logs (e.g., "boardgamegeek").
    fn name(&self) -> &'static str;

    /// Look up a game by its exact name.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the source has no game by that name.
    ///
    /// # Errors
    ///
    /// Transport, rate-limit and decoding failures.
    async fn lookup(&self, name: &str) -> Result<Option<GameMetadata>, MetadataError>;
}
