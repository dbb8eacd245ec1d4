//! post and check commands
//!
//! `post` runs the weekly pipeline; `post --dry-run` and `check` only read.

use anyhow::Result;

use super::{today, verbosity, Services};
use crate::core::config::Overrides;
use crate::engine::{Context, PipelineError, PostOutcome};
use crate::ui::announcement::Announcement;
use crate::ui::output::{self, format_list, Verbosity};
use crate::ui::prompts;

/// Post this week's game.
pub fn post(ctx: &Context, overrides: Overrides, dry_run: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(post_async(ctx, overrides, dry_run))
}

async fn post_async(ctx: &Context, overrides: Overrides, dry_run: bool) -> Result<()> {
    let services = Services::build(overrides)?;
    services.require_auth()?;
    let verbosity = verbosity(ctx);
    let pipeline = services.pipeline(today());

    if dry_run {
        let report = pipeline.dry_run().await?;
        output::print(format!("Title: {}\n", report.announcement.title), verbosity);
        output::print(&report.announcement.body, verbosity);
        output::print(
            format!("Wiki page '{}':", pipeline.settings().wiki_page),
            verbosity,
        );
        output::print(&report.wiki_changes, verbosity);
        output::print(
            format!("\nSidebar page '{}':", pipeline.settings().sidebar_page),
            verbosity,
        );
        output::print(&report.sidebar_changes, verbosity);
        output::print("\nDry run: nothing was posted or written.", verbosity);
        return Ok(());
    }

    let outcome = pipeline
        .post(|announcement| confirm_publish(ctx, verbosity, announcement))
        .await;

    match outcome {
        Ok(PostOutcome::Posted(report)) => {
            output::print(
                format!("Posted Game of the Week: {}\n{}", report.game, report.url),
                verbosity,
            );
            Ok(())
        }
        Ok(PostOutcome::Declined { game }) => {
            output::print(format!("Not posted. '{}' stays on the calendar.", game), verbosity);
            Ok(())
        }
        Err(e) => {
            if resumable(&e) {
                output::warn(
                    "the announcement is live but the run did not finish. \
                     Fix the problem and run 'gotw continue'",
                    verbosity,
                );
            }
            Err(e.into())
        }
    }
}

/// Errors raised after the announcement was published.
fn resumable(err: &PipelineError) -> bool {
    matches!(
        err,
        PipelineError::WikiUpdate(_) | PipelineError::SidebarUpdate(_)
    )
}

fn confirm_publish(ctx: &Context, verbosity: Verbosity, announcement: &Announcement) -> bool {
    if ctx.assume_yes || !ctx.interactive {
        return true;
    }

    output::print(
        format!("Title: {}\n\n{}", announcement.title, announcement.body),
        verbosity,
    );
    match prompts::confirm("Publish this announcement?", false, ctx.interactive) {
        Ok(answer) => answer,
        Err(e) => {
            tracing::warn!(error = %e, "no confirmation");
            false
        }
    }
}

/// Validate the calendar without posting.
pub fn check(ctx: &Context, overrides: Overrides) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(check_async(ctx, overrides))
}

async fn check_async(ctx: &Context, overrides: Overrides) -> Result<()> {
    let services = Services::build(overrides)?;
    services.require_auth()?;
    let verbosity = verbosity(ctx);
    let pipeline = services.pipeline(today());

    let validated = pipeline.check().await?;
    output::print(
        format!(
            "Calendar on r/{} wiki '{}' is valid. Queued:\n{}",
            pipeline.settings().subreddit,
            pipeline.settings().wiki_page,
            format_list(&validated.queue, "  - ")
        ),
        verbosity,
    );

    if validated.queue.len() <= pipeline.settings().reminder_threshold {
        output::warn(
            format!(
                "only {} game(s) queued; moderators will be asked to top up after the next post",
                validated.queue.len()
            ),
            verbosity,
        );
    }
    Ok(())
}
