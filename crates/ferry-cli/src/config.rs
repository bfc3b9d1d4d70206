//! Configuration management for Ferry CLI
//!
//! Config file location: ~/.ferry/config.toml
//!
//! Example config:
//! ```toml
//! [default]
//! endpoint = "http://localhost:9000"
//! access_key = "minioadmin"
//! secret_key = "minioadmin"
//! region = "us-east-1"
//!
//! [production]
//! endpoint = "https://s3.example.com"
//! access_key = "prod-access-key"
//! secret_key = "prod-secret-key"
//! part_size = 16777216
//! ```

use anyhow::{Context, Result};
use ferry_core::{DEFAULT_CONCURRENCY, DEFAULT_PART_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// One CLI profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// S3 endpoint URL
    pub endpoint: Option<String>,

    /// Access key ID
    pub access_key: Option<String>,

    /// Secret access key
    pub secret_key: Option<String>,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Path style access (use path instead of virtual hosted style)
    #[serde(default = "default_true")]
    pub path_style: bool,

    /// Multipart part size (bytes)
    #[serde(default = "default_part_size")]
    pub part_size: u64,

    /// Concurrent part transfers per job
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Transfer rate cap in bytes per second (unset = unlimited)
    #[serde(default)]
    pub rate_limit: Option<u64>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_part_size() -> u64 {
    DEFAULT_PART_SIZE
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_key: None,
            secret_key: None,
            region: default_region(),
            path_style: true,
            part_size: DEFAULT_PART_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            rate_limit: None,
        }
    }
}

/// Configuration file with multiple profiles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub profiles: HashMap<String, Config>,
}

impl Config {
    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let home = directories::BaseDirs::new()
            .context("Could not determine home directory")?
            .home_dir()
            .to_path_buf();

        Ok(home.join(".ferry"))
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file and environment
    pub fn load(profile: Option<&str>) -> Result<Self> {
        let profile_name = profile.unwrap_or("default");

        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config_file: ConfigFile =
                toml::from_str(&content).with_context(|| "Failed to parse config file")?;

            config_file
                .profiles
                .get(profile_name)
                .cloned()
                .unwrap_or_default()
        } else {
            Config::default()
        };

        // Override with environment variables if present
        if let Ok(endpoint) = std::env::var("FERRY_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL") {
            config.endpoint = Some(endpoint);
        }
        if let Ok(access_key) = std::env::var("FERRY_ACCESS_KEY") {
            config.access_key = Some(access_key);
        }
        if let Ok(access_key) = std::env::var("AWS_ACCESS_KEY_ID") {
            config.access_key = Some(access_key);
        }
        if let Ok(secret_key) = std::env::var("FERRY_SECRET_KEY") {
            config.secret_key = Some(secret_key);
        }
        if let Ok(secret_key) = std::env::var("AWS_SECRET_ACCESS_KEY") {
            config.secret_key = Some(secret_key);
        }
        if let Ok(region) = std::env::var("FERRY_REGION") {
            config.region = region;
        }
        if let Ok(region) = std::env::var("AWS_REGION") {
            config.region = region;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, profile: Option<&str>) -> Result<()> {
        let profile_name = profile.unwrap_or("default");
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut config_file = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            toml::from_str(&content).unwrap_or_default()
        } else {
            ConfigFile::default()
        };

        config_file
            .profiles
            .insert(profile_name.to_string(), self.clone());

        let content = toml::to_string_pretty(&config_file)?;
        fs::write(&config_path, content)?;

        Ok(())
    }

    /// Validate that credentials are present
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_none() {
            anyhow::bail!("Endpoint not configured. Set FERRY_ENDPOINT or use 'ferry configure'");
        }
        if self.access_key.is_none() {
            anyhow::bail!(
                "Access key not configured. Set FERRY_ACCESS_KEY or use 'ferry configure'"
            );
        }
        if self.secret_key.is_none() {
            anyhow::bail!(
                "Secret key not configured. Set FERRY_SECRET_KEY or use 'ferry configure'"
            );
        }
        Ok(())
    }
}
