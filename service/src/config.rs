//! Service configuration: TOML file with serde defaults, secrets from the
//! environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable consulted for the API token when the config file
/// does not carry one.
pub const TOKEN_ENV_VAR: &str = "OWNERGATE_GITHUB_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no API token: set `github.token` or OWNERGATE_GITHUB_TOKEN")]
    MissingToken,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Repository owner (user or organization).
    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub repo: String,

    /// API token; falls back to [`TOKEN_ENV_VAR`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            owner: String::new(),
            repo: String::new(),
            token: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Gap between successive team-membership requests.
    #[serde(default = "default_team_sync_gap_ms")]
    pub team_sync_gap_ms: u64,

    /// Settling delay before creating a check-run.
    #[serde(default = "default_check_run_settle_ms")]
    pub check_run_settle_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            team_sync_gap_ms: default_team_sync_gap_ms(),
            check_run_settle_ms: default_check_run_settle_ms(),
        }
    }
}

impl PacingConfig {
    pub fn team_sync_gap(&self) -> Duration {
        Duration::from_millis(self.team_sync_gap_ms)
    }

    pub fn check_run_settle(&self) -> Duration {
        Duration::from_millis(self.check_run_settle_ms)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Whether files with no owner anywhere block approval.
    #[serde(default)]
    pub ownerless_blocks: bool,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_team_sync_gap_ms() -> u64 {
    1_000
}

fn default_check_run_settle_ms() -> u64 {
    2_000
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The API token from the config file or the environment.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        if let Some(token) = &self.github.token
            && !token.is_empty()
        {
            return Ok(token.clone());
        }
        match std::env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(ConfigError::MissingToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gets_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.github.api_base, "https://api.github.com");
        assert_eq!(config.pacing.team_sync_gap(), Duration::from_secs(1));
        assert_eq!(config.pacing.check_run_settle(), Duration::from_secs(2));
        assert!(!config.policy.ownerless_blocks);
    }

    #[test]
    fn fields_override_defaults() {
        let text = r#"
            [github]
            owner = "acme"
            repo = "widgets"

            [pacing]
            team_sync_gap_ms = 250

            [policy]
            ownerless_blocks = true
        "#;
        let config: ServiceConfig = toml::from_str(text).unwrap();
        assert_eq!(config.github.owner, "acme");
        assert_eq!(config.pacing.team_sync_gap(), Duration::from_millis(250));
        assert_eq!(config.pacing.check_run_settle(), Duration::from_secs(2));
        assert!(config.policy.ownerless_blocks);
    }

    #[test]
    fn config_token_wins_over_missing_env() {
        let config = ServiceConfig {
            github: GithubConfig {
                token: Some("tok".to_string()),
                ..GithubConfig::default()
            },
            ..ServiceConfig::default()
        };
        assert_eq!(config.resolve_token().unwrap(), "tok");
    }
}
