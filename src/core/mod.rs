//! core
//!
//! Domain types, the region engine, and on-disk state.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ReferenceId, ArchiveEntry, etc.
//! - [`grammar`] - Marker literals and line patterns
//! - [`region`] - Locating and replacing delimited regions
//! - [`records`] - Parsing and rendering region records
//! - [`calendar`] - Promoting the queue head into the archive
//! - [`sidebar`] - Pointing the sidebar at the new announcement
//! - [`error`] - Region engine errors
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for gotw storage
//! - [`ops`] - Run journaling and locking
//!
//! # Design Principles
//!
//! - The region engine is pure: text in, text or error out
//! - A failed transformation never yields a partially edited document
//! - All formats are defined once, in [`grammar`]

pub mod calendar;
pub mod config;
pub mod error;
pub mod grammar;
pub mod ops;
pub mod paths;
pub mod records;
pub mod region;
pub mod sidebar;
pub mod types;
