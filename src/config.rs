//! TOML configuration.
//!
//! ```toml
//! [repo]
//! url = "https://github.com/acme/skills"
//! branch = "main"        # optional
//! shallow = true
//!
//! [cache]
//! dir = "~/.skills-cache"
//! auto_sync = true
//!
//! [retrieval]
//! max_candidates = 20
//!
//! [index]
//! exclude_globs = ["drafts/**"]
//! ```
//!
//! Every section is optional. A missing config file yields the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder repository URL meaning "not configured yet".
pub const DEFAULT_REPO_URL: &str = "https://github.com/user/claude-skills-collection";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepoConfig {
    #[serde(default = "default_repo_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default)]
    pub shallow: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            url: default_repo_url(),
            branch: None,
            shallow: false,
        }
    }
}

fn default_repo_url() -> String {
    DEFAULT_REPO_URL.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            auto_sync: default_auto_sync(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("~/.skills-cache")
}
fn default_auto_sync() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
        }
    }
}

fn default_max_candidates() -> usize {
    skill_harness_core::prefilter::DEFAULT_MAX_RESULTS
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct IndexConfig {
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl RepoConfig {
    /// True once the URL has been changed from the placeholder.
    pub fn is_configured(&self) -> bool {
        let url = self.url.trim();
        !url.is_empty() && url != DEFAULT_REPO_URL
    }
}

impl Config {
    /// Cache directory with `~` expanded.
    pub fn cache_dir(&self) -> PathBuf {
        expand_home(&self.cache.dir)
    }

    /// Working copy of the skills repository.
    pub fn repo_path(&self) -> PathBuf {
        self.cache_dir().join("repo")
    }

    pub fn index_path(&self) -> PathBuf {
        self.cache_dir().join("index.json")
    }

    pub fn usage_path(&self) -> PathBuf {
        self.cache_dir().join("usage.json")
    }
}

/// Default location of the config file: `~/.skills-config.toml`.
pub fn default_config_path() -> PathBuf {
    expand_home(Path::new("~/.skills-config.toml"))
}

/// Replace a leading `~` with the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.retrieval.max_candidates < 1 {
        anyhow::bail!("retrieval.max_candidates must be >= 1");
    }
    if config.cache.dir.as_os_str().is_empty() {
        anyhow::bail!("cache.dir must not be empty");
    }
    Ok(())
}

/// Write the config back to disk as TOML.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    validate(config)?;
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    crate::persist::write_atomic(path, content.as_bytes())
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}
