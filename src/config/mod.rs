//! Configuration management for the haul harvester
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{CollectionLimit, DescriptorStatus, ScraperCategory, ScraperDescriptor};
use crate::scraper::listing::ListingSpec;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run orchestration settings
    pub harvest: HarvestConfig,

    /// HTTP fetcher settings shared by the built-in scrapers
    pub fetcher: FetcherConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Registry override; empty means the built-in site table
    pub sites: Vec<SiteEntry>,

    /// Additional or replacement listing definitions
    pub listings: Vec<ListingSpec>,
}

/// Run orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Directory receiving snapshot and final artifacts
    pub output_dir: PathBuf,

    /// Pause between two sites, in seconds
    pub inter_site_delay_secs: u64,

    /// Per-site collection budget in seconds (0 disables the timeout)
    pub site_timeout_secs: u64,

    /// File name prefix for artifacts
    pub snapshot_prefix: String,

    /// Write Prometheus run metrics next to the final artifact
    pub write_metrics: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            inter_site_delay_secs: 30,
            site_timeout_secs: 3600,
            snapshot_prefix: String::from("haul"),
            write_metrics: false,
        }
    }
}

/// HTTP fetcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Fixed user agent; rotates through a browser pool when unset
    pub user_agent: Option<String>,

    /// Enable cookie persistence
    pub enable_cookies: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: None,
            enable_cookies: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive for this level; `verbose` forces debug output
    pub fn filter_directive(&self, verbose: bool) -> String {
        if verbose {
            String::from("haul=debug,info")
        } else {
            format!("haul={},warn", self.level.to_lowercase())
        }
    }
}

/// One `[[sites]]` entry of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteEntry {
    pub name: String,

    /// Scraper identity; defaults to the site name
    #[serde(default)]
    pub scraper: Option<String>,

    #[serde(default)]
    pub limit: CollectionLimit,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub category: ScraperCategory,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl From<&SiteEntry> for ScraperDescriptor {
    fn from(entry: &SiteEntry) -> Self {
        let scraper = entry.scraper.clone().unwrap_or_else(|| entry.name.clone());
        let status = if entry.enabled {
            DescriptorStatus::Ready
        } else {
            DescriptorStatus::Failed
        };

        ScraperDescriptor::new(&entry.name, scraper, entry.priority)
            .with_limit(entry.limit)
            .with_category(entry.category)
            .with_status(status)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = HarvestConfig::default();

        let output_dir = std::env::var("HAUL_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let inter_site_delay_secs = std::env::var("HAUL_INTER_SITE_DELAY")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.inter_site_delay_secs);

        let site_timeout_secs = std::env::var("HAUL_SITE_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.site_timeout_secs);

        let snapshot_prefix =
            std::env::var("HAUL_SNAPSHOT_PREFIX").unwrap_or(defaults.snapshot_prefix);

        let write_metrics = std::env::var("HAUL_WRITE_METRICS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(defaults.write_metrics);

        let request_timeout_secs = std::env::var("HAUL_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let user_agent = std::env::var("HAUL_USER_AGENT").ok();

        let log_level = std::env::var("HAUL_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format = std::env::var("HAUL_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            harvest: HarvestConfig {
                output_dir,
                inter_site_delay_secs,
                site_timeout_secs,
                snapshot_prefix,
                write_metrics,
            },
            fetcher: FetcherConfig {
                request_timeout_secs,
                user_agent,
                enable_cookies: true,
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
            sites: Vec::new(),
            listings: Vec::new(),
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` when given, otherwise from the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.harvest.snapshot_prefix.trim().is_empty() {
            anyhow::bail!("snapshot_prefix must not be empty");
        }

        if self
            .harvest
            .snapshot_prefix
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*'))
        {
            anyhow::bail!(
                "snapshot_prefix contains characters not allowed in file names: {}",
                self.harvest.snapshot_prefix
            );
        }

        if self.fetcher.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if !matches!(
            self.logging.level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            anyhow::bail!("unknown log level '{}'", self.logging.level);
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json', got '{}'", self.logging.format);
        }

        let mut seen = HashSet::new();
        for site in &self.sites {
            if site.name.trim().is_empty() {
                anyhow::bail!("site name must not be empty");
            }
            if !seen.insert(site.name.as_str()) {
                anyhow::bail!("duplicate site name: {}", site.name);
            }
        }

        Ok(())
    }

    /// Pause between two sites
    #[must_use]
    pub fn inter_site_delay(&self) -> Duration {
        Duration::from_secs(self.harvest.inter_site_delay_secs)
    }

    /// Per-site collection budget, `None` when disabled
    #[must_use]
    pub fn site_timeout(&self) -> Option<Duration> {
        match self.harvest.site_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
