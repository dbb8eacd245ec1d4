//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and builds the clients it needs ([`Services`])
//! 2. Calls the engine
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that talk to Reddit or BoardGameGeek are async. Each builds a
//! tokio runtime and blocks on its async body, so `dispatch` stays sync.

mod auth;
mod completion;
mod post;
mod preview;
mod recovery;

pub use auth::auth;
pub use completion::completion;
pub use post::{check, post};
pub use preview::preview;
pub use recovery::{abort, continue_run};

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use chrono::NaiveDate;

use crate::auth::{bgg_token, RedditAuth, TokenProvider};
use crate::cli::args::Command;
use crate::core::config::{Config, Overrides};
use crate::core::paths::GotwPaths;
use crate::engine::{Collaborators, Context, Pipeline, RunSettings};
use crate::metadata::bgg::BggClient;
use crate::secrets;
use crate::site::reddit::RedditClient;
use crate::ui::output::Verbosity;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, overrides: Overrides, ctx: &Context) -> Result<()> {
    match command {
        Command::Post { dry_run } => post(ctx, overrides, dry_run),
        Command::Continue => continue_run(ctx, overrides),
        Command::Abort => abort(ctx, overrides),
        Command::Check => check(ctx, overrides),
        Command::Preview { name, next } => {
            preview(ctx, overrides, name.as_deref(), next.as_deref())
        }
        Command::Auth { status, logout } => auth(ctx, status, logout),
        Command::Completion { shell } => completion(shell),
    }
}

/// Output verbosity for a context.
pub(crate) fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.quiet, ctx.debug)
}

/// Locate the state directory.
pub(crate) fn gotw_paths() -> Result<GotwPaths> {
    GotwPaths::from_env().context("cannot locate a home directory; set GOTW_HOME")
}

/// Load configuration and apply command-line overrides.
pub(crate) fn load_config(overrides: Overrides) -> Result<Config> {
    Config::load()
        .context("failed to load configuration")?
        .with_overrides(overrides)
        .context("invalid command-line override")
}

/// Build a [`RedditAuth`] over the configured secret store.
pub(crate) fn reddit_auth(config: &Config, paths: &GotwPaths) -> Result<RedditAuth> {
    let store = secrets::create_store(config.secrets_provider(), paths)
        .context("failed to initialize secret store")?;
    Ok(RedditAuth::new(
        config.reddit_auth_base(),
        &config.reddit_user_agent(),
        store,
    ))
}

/// Configured clients for one invocation.
pub(crate) struct Services {
    pub config: Config,
    pub paths: GotwPaths,
    pub site: RedditClient,
    pub catalog: BggClient,
    auth: Arc<RedditAuth>,
}

impl Services {
    /// Build the Reddit and BoardGameGeek clients. No network access.
    pub fn build(overrides: Overrides) -> Result<Self> {
        let config = load_config(overrides)?;
        let paths = gotw_paths()?;

        let auth = Arc::new(reddit_auth(&config, &paths)?);
        let site = RedditClient::new(
            config.reddit_api_base(),
            config.subreddit(),
            config.reddit_user_agent(),
            auth.clone() as Arc<dyn TokenProvider>,
        );

        let store = secrets::create_store(config.secrets_provider(), &paths)
            .context("failed to initialize secret store")?;
        let catalog = BggClient::new(config.bgg_api_base(), config.reddit_user_agent())
            .with_token(bgg_token(store.as_ref()));

        Ok(Self {
            config,
            paths,
            site,
            catalog,
            auth,
        })
    }

    /// Fail early with a hint when no Reddit credentials are stored.
    pub fn require_auth(&self) -> Result<()> {
        if !self.auth.is_authenticated() {
            bail!("Not authenticated with Reddit. Run 'gotw auth' first.");
        }
        Ok(())
    }

    pub fn pipeline(&self, today: NaiveDate) -> Pipeline<'_> {
        Pipeline::new(
            Collaborators::new(&self.site, &self.site, &self.site, &self.catalog),
            &self.paths,
            RunSettings::from_config(&self.config),
            today,
        )
    }
}

/// The date recorded in the archive.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
