use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use tracing::warn;
use url::Url;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub renderer_url: String,
    pub targets_file: String,
    pub max_runtime_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            renderer_url: env::var("RENDERER_URL").context("RENDERER_URL must be set")?,
            targets_file: env::var("TARGETS_FILE").unwrap_or_else(|_| "targets.json".to_string()),
            max_runtime_secs: env::var("CAMPAIGN_MAX_RUNTIME_SECS")
                .unwrap_or_else(|_| "7200".to_string())
                .parse()
                .context("CAMPAIGN_MAX_RUNTIME_SECS must be a valid number")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TargetsFile {
    #[serde(default)]
    target_urls: Vec<String>,
}

/// Load the ordered target seed list from the configured JSON file.
pub fn load_targets(path: &str) -> Result<Vec<Url>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read targets file {}", path))?;
    let file: TargetsFile =
        serde_json::from_str(&raw).with_context(|| format!("Invalid targets file {}", path))?;

    let mut targets = Vec::new();
    for entry in file.target_urls {
        match Url::parse(entry.trim()) {
            Ok(url) => targets.push(url),
            Err(e) => warn!(url = %entry, error = %e, "Skipping unparseable target URL"),
        }
    }

    Ok(targets)
}
