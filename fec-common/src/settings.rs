//! Pipeline settings (TOML bootstrap)
//!
//! Optional `config/pipeline.toml`; every field has a built-in default so a
//! missing default file is not an error. Resolution order for each value:
//!
//! 1. Environment variable (`FEC_API_BASE`, `FEC_DATA_ROOT`,
//!    `FEC_BURST_SLEEP_MS`, `FEC_MAX_RETRIES`)
//! 2. TOML file
//! 3. Built-in default

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{PageLimits, RequestPolicy, FEC_API_BASE};
use crate::raw::RawSource;
use crate::{Error, Result};

pub const DEFAULT_SETTINGS_PATH: &str = "config/pipeline.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub api: ApiSettings,
    pub data_root: Option<PathBuf>,
    pub rate_limit: RateLimitSettings,
    pub pagination: PaginationSettings,
    pub ingest: IngestSettings,
    pub warehouse: WarehouseSettings,
    pub bundle: BundleSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: FEC_API_BASE.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub listing_delay_ms: u64,
    pub itemized_delay_ms: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            listing_delay_ms: 250,
            itemized_delay_ms: 1200,
            max_retries: 5,
            backoff_base_ms: 5_000,
            backoff_max_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub per_page: u32,
    pub max_offset_pages: u32,
    pub max_keyset_pages: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            per_page: 100,
            max_offset_pages: 50,
            max_keyset_pages: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Raw sources fetched per entity
    pub sources: Vec<RawSource>,
    /// Cycle used when the target config lists none
    pub default_cycle: u16,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            sources: RawSource::ALL.to_vec(),
            default_cycle: 2026,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarehouseSettings {
    pub top_vendors: usize,
    pub top_donors: usize,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            top_vendors: 500,
            top_donors: 25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BundleSettings {
    pub top_donors: usize,
    pub top_states: usize,
    pub top_employers: usize,
    pub top_vendors: usize,
}

impl Default for BundleSettings {
    fn default() -> Self {
        Self {
            top_donors: 25,
            top_states: 60,
            top_employers: 50,
            top_vendors: 50,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PipelineSettings {
    /// Load settings
    ///
    /// `explicit` names a file the operator asked for; failing to read it is a
    /// configuration error. Without it the default path is tried and its
    /// absence falls back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_SETTINGS_PATH);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read settings {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
            .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Invalid settings TOML: {}", e)))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(base) = std::env::var("FEC_API_BASE") {
            if !base.trim().is_empty() {
                self.api.base_url = base.trim().to_string();
            }
        }
        if let Ok(root) = std::env::var("FEC_DATA_ROOT") {
            if !root.trim().is_empty() {
                self.data_root = Some(PathBuf::from(root.trim()));
            }
        }
        if let Some(ms) = env_number::<u64>("FEC_BURST_SLEEP_MS")? {
            self.rate_limit.itemized_delay_ms = ms;
        }
        if let Some(n) = env_number::<u32>("FEC_MAX_RETRIES")? {
            self.rate_limit.max_retries = n;
        }
        Ok(())
    }

    /// Data root: CLI argument, then settings/env, then `./data`
    pub fn data_root(&self, cli_arg: Option<&Path>) -> PathBuf {
        cli_arg
            .map(Path::to_path_buf)
            .or_else(|| self.data_root.clone())
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn request_policy(&self) -> RequestPolicy {
        RequestPolicy {
            listing_delay: Duration::from_millis(self.rate_limit.listing_delay_ms),
            itemized_delay: Duration::from_millis(self.rate_limit.itemized_delay_ms),
            max_retries: self.rate_limit.max_retries,
            backoff_base: Duration::from_millis(self.rate_limit.backoff_base_ms),
            backoff_max: Duration::from_millis(self.rate_limit.backoff_max_ms),
            timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }

    pub fn offset_limits(&self) -> PageLimits {
        PageLimits {
            per_page: self.pagination.per_page,
            max_pages: self.pagination.max_offset_pages,
        }
    }

    pub fn keyset_limits(&self) -> PageLimits {
        PageLimits {
            per_page: self.pagination.per_page,
            max_pages: self.pagination.max_keyset_pages,
        }
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} must be a number, got {:?}", name, v))),
        _ => Ok(None),
    }
}
