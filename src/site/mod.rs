//! site
//!
//! Adapters for the discussion site: wiki pages, posts and modmail.
//!
//! # Modules
//!
//! - `traits`: [`DocumentStore`], [`Publisher`], [`Notifier`] and [`SiteError`]
//! - [`reddit`]: Reddit OAuth API client
//! - [`mock`]: In-memory site for deterministic testing

pub mod mock;
pub mod reddit;
mod traits;

pub use traits::*;
