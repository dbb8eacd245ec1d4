//! preview command - Print an announcement without posting it

use anyhow::{Context as _, Result};

use super::{verbosity, Services};
use crate::core::calendar::read_queue;
use crate::core::config::Overrides;
use crate::engine::Context;
use crate::site::DocumentStore;
use crate::ui::announcement::compose_announcement;
use crate::ui::output;

/// Compose and print the announcement for `name`, or for the calendar head
/// when no name is given.
pub fn preview(
    ctx: &Context,
    overrides: Overrides,
    name: Option<&str>,
    next: Option<&str>,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(preview_async(ctx, overrides, name, next))
}

async fn preview_async(
    ctx: &Context,
    overrides: Overrides,
    name: Option<&str>,
    next: Option<&str>,
) -> Result<()> {
    let services = Services::build(overrides)?;

    let (game, next_game) = match name {
        Some(name) => (name.to_string(), next.map(str::to_string)),
        None => {
            services.require_auth()?;
            let page = services.config.wiki_page();
            let wiki = services
                .site
                .read(page)
                .await
                .with_context(|| format!("cannot read wiki page '{}'", page))?;
            let mut queue = read_queue(&wiki)
                .with_context(|| format!("no calendar on wiki page '{}'", page))?
                .into_iter();
            // read_queue never returns an empty queue
            let head = queue.next().unwrap_or_default();
            (head, next.map(str::to_string).or_else(|| queue.next()))
        }
    };

    let announcement = compose_announcement(&services.catalog, &game, next_game.as_deref())
        .await
        .with_context(|| format!("cannot compose an announcement for '{}'", game))?;

    output::print(
        format!("Title: {}\n\n{}", announcement.title, announcement.body),
        verbosity(ctx),
    );
    Ok(())
}
