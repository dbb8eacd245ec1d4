//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Example
//!
//! ```toml
//! subreddit = "boardgames"
//! wiki_page = "game_of_the_week"
//! sidebar_page = "config/sidebar"
//! reminder_threshold = 2
//! distinguish = true
//!
//! [reddit]
//! user_agent = "gotw/0.3 by u/boardgames_mods"
//!
//! [bgg]
//! api_base = "https://boardgamegeek.com/xmlapi2"
//!
//! [secrets]
//! provider = "file"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing: names must be non-empty and free of
//! path separators where they end up in URLs, and base URLs must parse.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Subreddit the bot posts to (without `r/`)
    pub subreddit: Option<String>,

    /// Wiki page holding the calendar and archive
    pub wiki_page: Option<String>,

    /// Wiki page holding the sidebar
    pub sidebar_page: Option<String>,

    /// Remind moderators when this many games or fewer remain queued
    pub reminder_threshold: Option<usize>,

    /// Distinguish the announcement as a moderator post
    pub distinguish: Option<bool>,

    /// Reddit endpoint settings
    pub reddit: Option<RedditConfig>,

    /// BoardGameGeek endpoint settings
    pub bgg: Option<BggConfig>,

    /// Secret storage settings
    pub secrets: Option<SecretsConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(subreddit) = &self.subreddit {
            validate_subreddit(subreddit)?;
        }

        for (key, page) in [
            ("wiki_page", &self.wiki_page),
            ("sidebar_page", &self.sidebar_page),
        ] {
            if let Some(page) = page {
                validate_page(key, page)?;
            }
        }

        if let Some(reddit) = &self.reddit {
            reddit.validate()?;
        }
        if let Some(bgg) = &self.bgg {
            bgg.validate()?;
        }
        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }

        Ok(())
    }
}

/// Reddit endpoint configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RedditConfig {
    /// User-Agent sent with every request
    pub user_agent: Option<String>,

    /// OAuth API base (default: `https://oauth.reddit.com`)
    pub api_base: Option<String>,

    /// Token endpoint base (default: `https://www.reddit.com`)
    pub auth_base: Option<String>,
}

impl RedditConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(agent) = &self.user_agent {
            if agent.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "reddit.user_agent cannot be empty".to_string(),
                ));
            }
        }
        validate_url("reddit.api_base", self.api_base.as_deref())?;
        validate_url("reddit.auth_base", self.auth_base.as_deref())
    }
}

/// BoardGameGeek endpoint configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BggConfig {
    /// XML API2 base (default: `https://boardgamegeek.com/xmlapi2`)
    pub api_base: Option<String>,
}

impl BggConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("bgg.api_base", self.api_base.as_deref())
    }
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Provider to use (only "file")
    pub provider: Option<String>,
}

impl SecretsConfig {
    /// Valid secret providers.
    pub const VALID_PROVIDERS: &'static [&'static str] = &["file"];

    /// Validate the secrets configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if !Self::VALID_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid secrets provider '{}', must be one of: {}",
                    provider,
                    Self::VALID_PROVIDERS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// Subreddit names are letters, digits and underscores.
pub fn validate_subreddit(name: &str) -> Result<(), ConfigError> {
    let name = name.strip_prefix("r/").unwrap_or(name);
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::InvalidValue(format!(
            "invalid subreddit '{}'",
            name
        )));
    }
    Ok(())
}

/// Wiki page names may contain `/` but not empty segments.
pub fn validate_page(key: &str, page: &str) -> Result<(), ConfigError> {
    if page.is_empty() || page.split('/').any(str::is_empty) || page.contains(char::is_whitespace)
    {
        return Err(ConfigError::InvalidValue(format!(
            "invalid {} '{}'",
            key, page
        )));
    }
    Ok(())
}

fn validate_url(key: &str, value: Option<&str>) -> Result<(), ConfigError> {
    if let Some(value) = value {
        reqwest::Url::parse(value)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid {} '{}': {}", key, value, e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod config_file {
        use super::*;

        #[test]
        fn defaults() {
            let config = ConfigFile::default();
            assert!(config.subreddit.is_none());
            assert!(config.reminder_threshold.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn roundtrip() {
            let config = ConfigFile {
                subreddit: Some("boardgames".to_string()),
                wiki_page: Some("game_of_the_week".to_string()),
                sidebar_page: Some("config/sidebar".to_string()),
                reminder_threshold: Some(3),
                distinguish: Some(false),
                reddit: Some(RedditConfig {
                    user_agent: Some("gotw-test".to_string()),
                    api_base: Some("https://oauth.reddit.com".to_string()),
                    auth_base: None,
                }),
                bgg: Some(BggConfig {
                    api_base: Some("https://boardgamegeek.com/xmlapi2".to_string()),
                }),
                secrets: Some(SecretsConfig {
                    provider: Some("file".to_string()),
                }),
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: ConfigFile = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                subreddit = "boardgames"
                unknown_field = true
            "#;
            let result: Result<ConfigFile, _> = toml::from_str(toml);
            assert!(result.is_err());
        }

        #[test]
        fn reject_unknown_nested_fields() {
            let toml = r#"
                [reddit]
                token = "nope"
            "#;
            let result: Result<ConfigFile, _> = toml::from_str(toml);
            assert!(result.is_err());
        }

        #[test]
        fn invalid_subreddit() {
            let config = ConfigFile {
                subreddit: Some("board games".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn r_prefix_accepted() {
            assert!(validate_subreddit("r/boardgames").is_ok());
        }

        #[test]
        fn nested_wiki_page_accepted() {
            let config = ConfigFile {
                sidebar_page: Some("config/sidebar".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn empty_page_segment_rejected() {
            let config = ConfigFile {
                wiki_page: Some("config//sidebar".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }

    mod endpoints {
        use super::*;

        #[test]
        fn bad_url_rejected() {
            let config = BggConfig {
                api_base: Some("not a url".to_string()),
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn blank_user_agent_rejected() {
            let config = RedditConfig {
                user_agent: Some("  ".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }

    mod secrets_config {
        use super::*;

        #[test]
        fn valid_file_provider() {
            let config = SecretsConfig {
                provider: Some("file".to_string()),
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn keychain_not_supported() {
            let config = SecretsConfig {
                provider: Some("keychain".to_string()),
            };
            assert!(config.validate().is_err());
        }
    }
}
