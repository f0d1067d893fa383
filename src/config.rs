//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/nutrilog.sqlite"
//!
//! [extractor]
//! strategy = "keyword"        # tagged | keyword | remote
//!
//! [extractor.remote]
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//! mode = "items"              # items | aggregate
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            remote: RemoteConfig::default(),
        }
    }
}

fn default_strategy() -> String {
    "keyword".to_string()
}

/// Settings for the model-backed extractor.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            mode: default_mode(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_mode() -> String {
    "items".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}

impl Config {
    /// Defaults with the database under `./data`.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/nutrilog.sqlite"),
            },
            extractor: ExtractorConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    match config.extractor.strategy.as_str() {
        "tagged" | "keyword" | "remote" => {}
        other => anyhow::bail!(
            "Unknown extractor strategy: '{}'. Must be tagged, keyword, or remote.",
            other
        ),
    }

    let remote = &config.extractor.remote;
    match remote.mode.as_str() {
        "items" | "aggregate" => {}
        other => anyhow::bail!(
            "Unknown extractor.remote.mode: '{}'. Must be items or aggregate.",
            other
        ),
    }
    if remote.timeout_secs == 0 {
        anyhow::bail!("extractor.remote.timeout_secs must be > 0");
    }
    if remote.model.trim().is_empty() {
        anyhow::bail!("extractor.remote.model must not be empty");
    }

    Ok(())
}
