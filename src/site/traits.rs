//! site::traits
//!
//! Collaborator traits for the discussion site hosting the wiki.
//!
//! The pipeline reads and writes wiki pages through [`DocumentStore`], posts
//! the announcement through [`Publisher`] and mails the moderators through
//! [`Notifier`]. One adapter usually implements all three.
//!
//! # Example
//!
//! ```
//! use gotw::site::mock::MockSite;
//! use gotw::site::{DocumentStore, Publisher};
//!
//! # tokio_test::block_on(async {
//! let site = MockSite::new().with_page("game_of_the_week", "hello");
//! assert_eq!(site.read("game_of_the_week").await.unwrap(), "hello");
//!
//! let id = site.publish("Game of the Week: Catan", "body").await.unwrap();
//! assert_eq!(site.posts()[0].id, id);
//! # });
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::ReferenceId;

#[derive(Debug, Clone, Error)]
pub enum SiteError {
    #[error("authentication required")]
    AuthRequired,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited")]
    RateLimited,

    /// The request was understood and refused (Reddit's `json.errors`).
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("network error: {0}")]
    NetworkError(String),
}

/// Wiki page storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get the store name (e.g. "reddit").
    fn name(&self) -> &'static str;

    /// Read a page's raw markdown.
    ///
    /// # Errors
    ///
    /// - [`SiteError::NotFound`] if the page does not exist
    async fn read(&self, page: &str) -> Result<String, SiteError>;

    /// Replace a page's content. `reason` is recorded in the page history.
    async fn write(&self, page: &str, text: &str, reason: &str) -> Result<(), SiteError>;
}

/// Posts announcements.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Submit a text post and return its id.
    async fn publish(&self, title: &str, body: &str) -> Result<ReferenceId, SiteError>;

    /// Mark a post as made by a moderator.
    async fn distinguish(&self, id: &ReferenceId) -> Result<(), SiteError>;

    /// Public URL of a published post.
    fn post_url(&self, id: &ReferenceId) -> String;
}

/// Sends mail to the moderators.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), SiteError>;
}
