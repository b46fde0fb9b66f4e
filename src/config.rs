use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::collect::StripPrefix;
use crate::paths::paths;
use crate::provision::{DEFAULT_COMMIT_MESSAGE, DEFAULT_MAIN_BRANCH, ProvisionSettings};
use crate::remote::DEFAULT_GITLAB_HOST;

/// Top-level configuration structure loaded from `config.toml`.
///
/// Every key is optional; a missing section falls back to its defaults.
///
/// Example TOML:
/// ```toml
/// [gitlab]
/// base_url  = "https://gitlab.example.com"
/// token_env = "GITLAB_TOKEN"
///
/// [scaffold]
/// default_branch = "main"
/// commit_message = "initialized by rscaf"
/// ```
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub gitlab: GitLabConfig,
    pub scaffold: ScaffoldConfig,
}

/// The `[gitlab]` section: where and how to reach the hosting service.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GitLabConfig {
    pub base_url: Option<String>,
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token_env: "GITLAB_TOKEN".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GitLabConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_GITLAB_HOST)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The `[scaffold]` section: how the rendered tree is published.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScaffoldConfig {
    pub default_branch: String,
    pub commit_message: String,
    pub strip_segments: Option<usize>,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            default_branch: DEFAULT_MAIN_BRANCH.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            strip_segments: None,
        }
    }
}

impl Config {
    /// Orchestrator settings derived from this configuration.
    pub fn provision_settings(&self) -> ProvisionSettings {
        ProvisionSettings {
            default_branch: self.scaffold.default_branch.clone(),
            commit_message: self.scaffold.commit_message.clone(),
            default_base_url: self.gitlab.base_url().to_string(),
            strip: match self.scaffold.strip_segments {
                Some(n) => StripPrefix::Segments(n),
                None => StripPrefix::Root,
            },
        }
    }
}

/// Load and parse `config.toml` into a [`Config`] structure.
///
/// # Errors
/// - Returns an error if `explicit` is given and cannot be read.
/// - Returns an error if parsing the TOML fails, or if
///   `scaffold.default_branch` is blank or contains whitespace.
///
/// # Notes
/// - Without `explicit`, the path is resolved using [`paths()`] and a
///   missing file yields [`Config::default()`].
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = paths()?;
            if !p.config.exists() {
                return Ok(Config::default());
            }
            p.config
        }
    };
    let txt = fs::read_to_string(&path)
        .with_context(|| format!("config not found: {}", path.display()))?;
    parse_config(&txt).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_config(txt: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(txt)?;
    let branch = &cfg.scaffold.default_branch;
    if branch.is_empty() || branch.chars().any(char::is_whitespace) {
        bail!("scaffold.default_branch {:?} is not a usable branch name", branch);
    }
    Ok(cfg)
}
