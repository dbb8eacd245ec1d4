//! continue and abort commands - Resume or discard an interrupted run
//!
//! A run that fails after publishing leaves its journal in
//! `~/.gotw/runs/<subreddit>.json`:
//! - `continue`: finish the remaining stages without publishing again
//! - `abort`: delete the journal; nothing on the subreddit is undone

use anyhow::Result;

use super::{today, verbosity, Services};
use crate::core::config::Overrides;
use crate::engine::Context;
use crate::ui::output;

/// Resume an interrupted run.
pub fn continue_run(ctx: &Context, overrides: Overrides) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(continue_async(ctx, overrides))
}

async fn continue_async(ctx: &Context, overrides: Overrides) -> Result<()> {
    let services = Services::build(overrides)?;
    services.require_auth()?;

    let report = services.pipeline(today()).continue_run().await?;
    output::print(
        format!("Finished Game of the Week: {}\n{}", report.game, report.url),
        verbosity(ctx),
    );
    Ok(())
}

/// Discard an interrupted run.
pub fn abort(ctx: &Context, overrides: Overrides) -> Result<()> {
    let services = Services::build(overrides)?;
    let journal = services.pipeline(today()).abort()?;

    let posted = match &journal.reference {
        Some(reference) => format!(" (post {})", reference),
        None => String::new(),
    };
    output::print(
        format!(
            "Discarded run for '{}'{}, stopped before '{}'.",
            journal.game,
            posted,
            journal.next_stage()
        ),
        verbosity(ctx),
    );
    Ok(())
}
