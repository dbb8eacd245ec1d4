//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--subreddit <name>`: Override the configured subreddit
//! - `--wiki <page>`: Override the configured calendar wiki page
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--yes` / `-y`: Do not ask for confirmation

use clap::{Parser, Subcommand};

use crate::ui::prompts;

/// gotw - Post the Game of the Week to a subreddit
#[derive(Parser, Debug)]
#[command(name = "gotw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subreddit to post to (overrides config)
    #[arg(long, global = true, value_name = "NAME")]
    pub subreddit: Option<String>,

    /// Wiki page holding the calendar (overrides config)
    #[arg(long = "wiki", global = true, value_name = "PAGE")]
    pub wiki_page: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --yes
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Do not ask for confirmation before publishing
    #[arg(short = 'y', long = "yes", global = true)]
    pub assume_yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Prompts are shown only on a terminal and never with `--quiet`.
    pub fn interactive(&self) -> bool {
        !self.quiet && prompts::is_interactive()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Post this week's game
    #[command(
        name = "post",
        long_about = "Post this week's game.\n\n\
            Reads the calendar from the wiki, checks every queued game exists on \
            BoardGameGeek, posts the announcement for the first game, then moves \
            it into the archive and points the sidebar at the new post.\n\n\
            Moderators get modmail when the calendar is broken or running low.",
        after_help = "\
WORKFLOW EXAMPLES:
    # See what would happen without touching the subreddit
    gotw post --dry-run

    # Post, confirming first
    gotw post

    # Post from cron
    gotw post --yes

EXIT CODES:
    0  posted
    1  calendar not found on the wiki page (moderators notified), or other error
    2  calendar empty
    3  games not found on BoardGameGeek (moderators notified)
    4  announcement could not be composed
    5  wiki update failed (run 'gotw continue' after fixing)
    6  sidebar update failed (run 'gotw continue' after fixing)"
    )]
    Post {
        /// Show the announcement and page changes without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Resume an interrupted run
    #[command(
        name = "continue",
        long_about = "Resume a run that stopped after publishing.\n\n\
            Picks up at the first unfinished stage recorded in the run journal. \
            The announcement is never posted twice.",
        after_help = "\
WORKFLOW EXAMPLES:
    # The sidebar update failed; fix the sidebar, then
    gotw continue"
    )]
    Continue,

    /// Discard an interrupted run
    #[command(
        name = "abort",
        long_about = "Discard the run journal of an interrupted run.\n\n\
            Nothing on the subreddit is undone. Use this after finishing a \
            failed run by hand, or when a post may or may not have been made."
    )]
    Abort,

    /// Validate the calendar without posting
    #[command(
        name = "check",
        after_help = "\
WORKFLOW EXAMPLES:
    # Midweek sanity check of the calendar
    gotw check"
    )]
    Check,

    /// Print an announcement without posting it
    #[command(
        name = "preview",
        after_help = "\
WORKFLOW EXAMPLES:
    # Preview the announcement for the head of the calendar
    gotw preview

    # Preview any game
    gotw preview \"Brass: Birmingham\" --next Azul"
    )]
    Preview {
        /// Game to announce (defaults to the head of the calendar)
        name: Option<String>,

        /// Game to announce as next week's
        #[arg(long, value_name = "NAME")]
        next: Option<String>,
    },

    /// Store Reddit credentials
    #[command(
        name = "auth",
        long_about = "Store the Reddit script-app credentials used for posting.\n\n\
            Prompts for the client id, client secret, username and password. \
            Secrets are read without echo and stored in the local secret store.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Store credentials
    gotw auth

    # Check whether credentials are stored
    gotw auth --status

    # Remove stored credentials
    gotw auth --logout"
    )]
    Auth {
        /// Show current authentication status
        #[arg(long, conflicts_with = "logout")]
        status: bool,

        /// Remove stored credentials
        #[arg(long)]
        logout: bool,
    },

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
