use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gate::DEFAULT_CAPACITY;
use crate::retry::RetryPolicy;
use crate::transport::CurlOptions;

/// Default directory (relative to the working directory) for fetched pages.
pub const DEFAULT_OUTPUT_DIR: &str = "DownloadedPages";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per URL (including the first).
    pub max_attempts: u32,
    /// Base of the exponential backoff in seconds: attempt n waits base^n.
    pub backoff_base: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: 2.0,
            max_delay_secs: 60,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: cfg.max_attempts.max(1),
            backoff_base: cfg.backoff_base,
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/fetchgate/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchgateConfig {
    /// Maximum number of URLs fetched at the same time.
    pub max_concurrent: usize,
    /// Directory pages are written to.
    pub output_dir: PathBuf,
    /// Connect timeout per request, in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout (headers and body), in seconds.
    pub request_timeout_secs: u64,
    /// URLs to fetch when none are given on the command line.
    pub urls: Option<Vec<String>>,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for FetchgateConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_CAPACITY,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            connect_timeout_secs: 15,
            request_timeout_secs: 300,
            urls: None,
            retry: None,
        }
    }
}

impl FetchgateConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            ..CurlOptions::default()
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchgate")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchgateConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchgateConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<FetchgateConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: FetchgateConfig = toml::from_str(&data)
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
