//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
///
/// Built once at startup and passed by reference into every stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sitemap URL or local file path
    #[serde(default = "defaults::sitemap")]
    pub sitemap: String,

    /// Directory holding cached page bodies
    #[serde(default = "defaults::cache_dir")]
    pub cache_dir: PathBuf,

    /// HTTP client settings
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.sitemap.trim().is_empty() {
            return Err(AppError::validation("sitemap is empty"));
        }
        if self.cache_dir.as_os_str().is_empty() {
            return Err(AppError::validation("cache_dir is empty"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_attempts == 0 {
            return Err(AppError::validation("crawler.max_attempts must be > 0"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sitemap: defaults::sitemap(),
            cache_dir: defaults::cache_dir(),
            crawler: CrawlerConfig::default(),
        }
    }
}

/// HTTP client and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Total attempts per request, including the first one
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            retry_backoff_ms: defaults::retry_backoff(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn sitemap() -> String {
        "https://geoscan.nrcan.gc.ca/googlesitemapGCxml.xml".into()
    }
    pub fn cache_dir() -> PathBuf {
        PathBuf::from(".").join(".geoscanr")
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; geoscanr/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_backoff() -> u64 {
        1000
    }
}
