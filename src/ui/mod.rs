//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`announcement`] - Weekly post text
//! - [`output`] - Output formatting and display
//! - [`prompts`] - Interactive prompts and confirmations

pub mod announcement;
pub mod output;
pub mod prompts;
