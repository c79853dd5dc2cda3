//! Configuration loaded from `~/.config/geofix/config.json`.
//!
//! Every field has a default; a missing default file simply means defaults.
//! Unknown keys are rejected so typos surface instead of being ignored.

use crate::location::providers::{FallbackLocality, ProviderKind, DEFAULT_PRIORITY};
use crate::location::geocoder::NOMINATIM_REVERSE_URL;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A fixed device position, for hosts that know where they are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceFix {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_fix_accuracy")]
    pub accuracy_meters: f64,
}

fn default_fix_accuracy() -> f64 {
    10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeoConfig {
    pub cache_ttl_secs: u64,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    /// `accept-language` for reverse geocoding.
    pub language: String,
    /// IP providers in priority order.
    pub providers: Vec<ProviderKind>,
    /// Per-provider URL overrides.
    pub endpoints: BTreeMap<ProviderKind, String>,
    pub geocoder_endpoint: String,
    pub fallback: FallbackLocality,
    pub device: Option<DeviceFix>,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 600,
            http_timeout_secs: 5,
            user_agent: format!("geofix/{}", env!("CARGO_PKG_VERSION")),
            language: "en".into(),
            providers: DEFAULT_PRIORITY.to_vec(),
            endpoints: BTreeMap::new(),
            geocoder_endpoint: NOMINATIM_REVERSE_URL.into(),
            fallback: FallbackLocality::default(),
            device: None,
            log_level: "info".into(),
        }
    }
}

impl GeoConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("geofix")
            .join("config.json")
    }

    /// Load from the default path; absent file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path; the file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache_ttl_secs must be positive".into()));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid("http_timeout_secs must be positive".into()));
        }
        let f = &self.fallback;
        if !(-90.0..=90.0).contains(&f.latitude) || !(-180.0..=180.0).contains(&f.longitude) {
            return Err(ConfigError::Invalid(format!(
                "fallback coordinates out of range ({}, {})",
                f.latitude, f.longitude
            )));
        }
        if f.latitude == 0.0 && f.longitude == 0.0 {
            return Err(ConfigError::Invalid(
                "fallback coordinates 0,0 are reserved for \"no data\"".into(),
            ));
        }
        if f.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "unknown fallback timezone '{}'",
                f.timezone
            )));
        }
        if let Some(fix) = &self.device {
            if !(-90.0..=90.0).contains(&fix.latitude) || !(-180.0..=180.0).contains(&fix.longitude) {
                return Err(ConfigError::Invalid("device coordinates out of range".into()));
            }
            if !(fix.accuracy_meters.is_finite() && fix.accuracy_meters >= 0.0) {
                return Err(ConfigError::Invalid("device accuracy must be >= 0".into()));
            }
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn endpoint_for(&self, kind: ProviderKind) -> String {
        self.endpoints
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.default_endpoint().to_string())
    }
}
