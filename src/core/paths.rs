//! core::paths
//!
//! Centralized path routing for gotw state on disk.
//!
//! # Storage Layout
//!
//! All state lives under one root, `~/.gotw/` unless `$GOTW_HOME` is set:
//! - `config.toml` - Configuration (see [`crate::core::config`])
//! - `secrets.toml` - File secret store (0600)
//! - `lock` - Exclusive run lock
//! - `runs/<subreddit>.json` - Run journal of the last interrupted run
//!
//! No code outside this module should compute these locations.
//!
//! # Example
//!
//! ```
//! use gotw::core::paths::GotwPaths;
//! use std::path::PathBuf;
//!
//! let paths = GotwPaths::new(PathBuf::from("/home/mod/.gotw"));
//! assert_eq!(
//!     paths.run_journal_path("boardgames"),
//!     PathBuf::from("/home/mod/.gotw/runs/boardgames.json")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the state root.
pub const HOME_ENV: &str = "GOTW_HOME";

/// Paths to every file gotw reads or writes outside the config search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GotwPaths {
    root: PathBuf,
}

impl GotwPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve the root from `$GOTW_HOME`, falling back to `~/.gotw`.
    ///
    /// Returns `None` when neither is available.
    pub fn from_env() -> Option<Self> {
        if let Ok(root) = std::env::var(HOME_ENV) {
            if !root.is_empty() {
                return Some(Self::new(PathBuf::from(root)));
            }
        }
        dirs::home_dir().map(|home| Self::new(home.join(".gotw")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.root.join("secrets.toml")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("lock")
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }

    /// Journal of the in-flight run for one subreddit.
    pub fn run_journal_path(&self, subreddit: &str) -> PathBuf {
        self.runs_dir().join(format!("{}.json", subreddit))
    }

    /// Create the root and `runs/` directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an IO error if directory creation fails.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.runs_dir())?;
        Ok(())
    }
}
