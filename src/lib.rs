//! gotw - Game of the Week poster for subreddits
//!
//! Once a week gotw takes the first game from a calendar kept on a subreddit
//! wiki page, posts an announcement built from BoardGameGeek data, moves the
//! game into the wiki's archive and points the sidebar at the new post.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Runs Validate → Compose → Publish → Remind → UpdateArchive → UpdateSidebar
//! - [`core`] - Region grammar, page transformers, config, paths, journal and lock
//! - [`site`] - Reddit wiki, posts and modmail
//! - [`metadata`] - BoardGameGeek lookups
//! - [`auth`] - Reddit script-app authentication
//! - [`secrets`] - Secret storage abstraction
//! - [`ui`] - Announcement text, output and prompts
//!
//! # Correctness Invariants
//!
//! 1. Page transformers either return a fully rewritten page or an error
//! 2. Nothing is written before the calendar validates
//! 3. An announcement is published at most once per run
//! 4. A failed run can be resumed or discarded, never silently repeated

pub mod auth;
pub mod cli;
pub mod core;
pub mod engine;
pub mod metadata;
pub mod secrets;
pub mod site;
pub mod ui;
