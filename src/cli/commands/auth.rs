//! cli::commands::auth
//!
//! Store, inspect or delete the Reddit script-app credentials.
//!
//! # Design
//!
//! - Credentials go to the configured secret store, never to config files
//! - Secrets are read with `rpassword` and NEVER printed
//! - Storing new credentials is interactive only
//!
//! # Example
//!
//! ```bash
//! # Interactive (prompts for client id, secret, username, password)
//! gotw auth
//!
//! # Check status
//! gotw auth --status
//!
//! # Remove stored credentials
//! gotw auth --logout
//! ```

use anyhow::{bail, Context as _, Result};

use super::{gotw_paths, load_config, reddit_auth, verbosity};
use crate::auth::{RedditAuth, RedditCredentials, TokenProvider, BGG_TOKEN_KEY};
use crate::core::config::Overrides;
use crate::engine::Context;
use crate::secrets::{self, SecretStore};
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts;

/// Run the auth command.
pub fn auth(ctx: &Context, status: bool, logout: bool) -> Result<()> {
    let config = load_config(Overrides::default())?;
    let paths = gotw_paths()?;
    let reddit = reddit_auth(&config, &paths)?;
    let store = secrets::create_store(config.secrets_provider(), &paths)
        .context("failed to initialize secret store")?;
    let verbosity = verbosity(ctx);

    if status {
        return show_status(&reddit, store.as_ref(), ctx.quiet);
    }

    if logout {
        reddit
            .delete_credentials()
            .context("failed to remove stored credentials")?;
        store
            .delete(BGG_TOKEN_KEY)
            .context("failed to remove stored BoardGameGeek token")?;
        output::print("Logged out.", verbosity);
        return Ok(());
    }

    if !ctx.interactive {
        bail!("Storing credentials needs an interactive terminal. Run 'gotw auth' without --quiet.");
    }

    let credentials = prompt_credentials(ctx)?;
    reddit
        .store_credentials(&credentials)
        .context("failed to store credentials")?;
    output::print(
        format!("Credentials stored for u/{}.", credentials.username),
        verbosity,
    );

    if prompts::confirm("Store a BoardGameGeek API token?", false, ctx.interactive)? {
        let token = prompts::password("BoardGameGeek token", ctx.interactive)?;
        store
            .set(BGG_TOKEN_KEY, token.trim())
            .context("failed to store BoardGameGeek token")?;
    }

    verify(&reddit, verbosity)
}

/// Show authentication status. Never prints secret values.
fn show_status(reddit: &RedditAuth, store: &dyn SecretStore, quiet: bool) -> Result<()> {
    let username = reddit.username();
    let has_bgg = store.exists(BGG_TOKEN_KEY)?;

    if quiet {
        // Machine-readable output
        println!(
            "{}",
            if username.is_some() {
                "authenticated"
            } else {
                "not_authenticated"
            }
        );
        return Ok(());
    }

    match username {
        Some(user) => println!("Authenticated with Reddit as u/{}.", user),
        None => {
            println!("Not authenticated with Reddit.");
            println!("Run 'gotw auth' to store credentials.");
        }
    }
    println!(
        "BoardGameGeek token: {}",
        if has_bgg { "stored" } else { "not set" }
    );
    Ok(())
}

fn prompt_credentials(ctx: &Context) -> Result<RedditCredentials> {
    let client_id = prompts::input("Reddit app client id", None, ctx.interactive)?;
    let client_secret = prompts::password("Reddit app client secret", ctx.interactive)?;
    let username = prompts::input("Bot username", None, ctx.interactive)?;
    let password = prompts::password("Bot password", ctx.interactive)?;

    Ok(RedditCredentials {
        client_id,
        client_secret,
        username: username.trim_start_matches("u/").to_string(),
        password,
    })
}

/// Request a token once to check the stored credentials.
fn verify(reddit: &RedditAuth, verbosity: Verbosity) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(reddit.bearer_token()) {
        Ok(_) => output::print("Verified with Reddit.", verbosity),
        Err(e) if e.needs_reauth() => bail!("{}", e),
        Err(e) => output::warn(
            format!("credentials stored but could not be verified: {}", e),
            verbosity,
        ),
    }
    Ok(())
}
