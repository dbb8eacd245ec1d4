//! cli
//!
//! Command-line interface layer for gotw.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, builds the HTTP
//! clients from configuration, and hands them to [`crate::engine`]. It never
//! edits pages itself.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;

use crate::engine::Context;
use crate::ui::output::Verbosity;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`. Errors carry the
/// process exit code; see [`exit_code`].
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(Verbosity::from_flags(cli.quiet, cli.debug));

    let ctx = Context {
        debug: cli.debug,
        quiet: cli.quiet,
        interactive: cli.interactive(),
        assume_yes: cli.assume_yes || cli.quiet,
    };

    let overrides = crate::core::config::Overrides {
        subreddit: cli.subreddit,
        wiki_page: cli.wiki_page,
    };
    commands::dispatch(cli.command, overrides, &ctx)
}

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// the verbosity flags.
fn init_logging(verbosity: Verbosity) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Process exit code for an error returned by [`run`].
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<crate::engine::PipelineError>())
        .map(|e| e.exit_code())
        .unwrap_or(1)
}
