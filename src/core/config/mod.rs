//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (`--subreddit`, `--wiki`), applied with [`Config::with_overrides`]
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$GOTW_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gotw/config.toml`
//! 3. `~/.gotw/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use gotw::core::config::{Config, Overrides};
//!
//! let config = Config::load()
//!     .unwrap()
//!     .with_overrides(Overrides {
//!         subreddit: Some("boardgames".into()),
//!         wiki_page: None,
//!     })
//!     .unwrap();
//!
//! println!("Posting to r/{}", config.subreddit());
//! println!("Calendar page: {}", config.wiki_page());
//! ```

pub mod schema;

pub use schema::{BggConfig, ConfigFile, RedditConfig, SecretsConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SUBREDDIT: &str = "boardgames";
pub const DEFAULT_WIKI_PAGE: &str = "game_of_the_week";
pub const DEFAULT_SIDEBAR_PAGE: &str = "config/sidebar";
pub const DEFAULT_REMINDER_THRESHOLD: usize = 2;
pub const DEFAULT_REDDIT_API_BASE: &str = "https://oauth.reddit.com";
pub const DEFAULT_REDDIT_AUTH_BASE: &str = "https://www.reddit.com";
pub const DEFAULT_BGG_API_BASE: &str = "https://boardgamegeek.com/xmlapi2";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub subreddit: Option<String>,
    pub wiki_page: Option<String>,
}

/// Resolved configuration.
///
/// Accessors apply defaults and command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed configuration file
    pub file: ConfigFile,
    overrides: Overrides,
    /// Path the file was loaded from (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or fails
    /// validation. A missing file is not an error (defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self {
            file,
            overrides: Overrides::default(),
            path: Some(path.to_path_buf()),
        })
    }

    fn find_config_file() -> Option<PathBuf> {
        // 1. $GOTW_CONFIG
        if let Ok(path) = std::env::var("GOTW_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. $XDG_CONFIG_HOME/gotw/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gotw/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. ~/.gotw/config.toml
        dirs::home_dir()
            .map(|home| home.join(".gotw/config.toml"))
            .filter(|path| path.exists())
    }

    /// Apply command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if an override is malformed.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self, ConfigError> {
        if let Some(subreddit) = &overrides.subreddit {
            schema::validate_subreddit(subreddit)?;
        }
        if let Some(page) = &overrides.wiki_page {
            schema::validate_page("wiki page", page)?;
        }
        self.overrides = overrides;
        Ok(self)
    }

    /// Get the canonical path for the config file.
    ///
    /// Returns `~/.gotw/config.toml`.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".gotw/config.toml"))
    }

    /// Write a config file atomically to `path`.
    ///
    /// Creates parent directories if needed.
    pub fn write_to(path: &Path, file: &ConfigFile) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut tmp = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        tmp.write_all(contents.as_bytes())
            .and_then(|_| tmp.sync_all())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Subreddit name without the `r/` prefix.
    pub fn subreddit(&self) -> &str {
        let name = self
            .overrides
            .subreddit
            .as_deref()
            .or(self.file.subreddit.as_deref())
            .unwrap_or(DEFAULT_SUBREDDIT);
        name.strip_prefix("r/").unwrap_or(name)
    }

    /// Wiki page holding the calendar and archive.
    pub fn wiki_page(&self) -> &str {
        self.overrides
            .wiki_page
            .as_deref()
            .or(self.file.wiki_page.as_deref())
            .unwrap_or(DEFAULT_WIKI_PAGE)
    }

    /// Wiki page holding the sidebar.
    pub fn sidebar_page(&self) -> &str {
        self.file
            .sidebar_page
            .as_deref()
            .unwrap_or(DEFAULT_SIDEBAR_PAGE)
    }

    pub fn reminder_threshold(&self) -> usize {
        self.file
            .reminder_threshold
            .unwrap_or(DEFAULT_REMINDER_THRESHOLD)
    }

    /// Defaults to `true`.
    pub fn distinguish(&self) -> bool {
        self.file.distinguish.unwrap_or(true)
    }

    pub fn reddit_user_agent(&self) -> String {
        self.file
            .reddit
            .as_ref()
            .and_then(|r| r.user_agent.clone())
            .unwrap_or_else(|| format!("gotw/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn reddit_api_base(&self) -> &str {
        self.file
            .reddit
            .as_ref()
            .and_then(|r| r.api_base.as_deref())
            .unwrap_or(DEFAULT_REDDIT_API_BASE)
    }

    pub fn reddit_auth_base(&self) -> &str {
        self.file
            .reddit
            .as_ref()
            .and_then(|r| r.auth_base.as_deref())
            .unwrap_or(DEFAULT_REDDIT_AUTH_BASE)
    }

    pub fn bgg_api_base(&self) -> &str {
        self.file
            .bgg
            .as_ref()
            .and_then(|b| b.api_base.as_deref())
            .unwrap_or(DEFAULT_BGG_API_BASE)
    }

    /// Defaults to "file".
    pub fn secrets_provider(&self) -> &str {
        self.file
            .secrets
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or("file")
    }

    /// Path the config was loaded from, if any.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
