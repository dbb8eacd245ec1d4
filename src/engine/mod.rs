//! engine
//!
//! Orchestrates the weekly run.
//!
//! # Architecture
//!
//! The engine owns sequencing and recovery. It reads and writes through the
//! site and metadata traits and never talks HTTP itself:
//!
//! ```text
//! Validate -> Compose -> [confirm] -> Publish -> Remind -> UpdateArchive -> UpdateSidebar -> Done
//! ```
//!
//! Stages from Publish on are journaled (see [`crate::core::ops::journal`]).
//! A failed run leaves its journal behind for `gotw continue` or
//! `gotw abort`.
//!
//! # Invariants
//!
//! - Nothing is written to the site before the calendar validates and the
//!   announcement composes
//! - An announcement is published at most once per journal
//! - The wiki is only rewritten from a queue whose head is the posted game

pub mod pipeline;

pub use pipeline::{
    Collaborators, DryRunReport, Pipeline, PipelineError, PostOutcome, RunReport, RunSettings,
    Validated,
};

/// Execution context for commands.
///
/// Global settings derived from CLI flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Interactive mode enabled.
    pub interactive: bool,
    /// Skip confirmation prompts.
    pub assume_yes: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            debug: false,
            quiet: false,
            interactive: true,
            assume_yes: false,
        }
    }
}
