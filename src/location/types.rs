//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Sentinel for string fields with no data.
pub const UNKNOWN: &str = "Unknown";
/// Sentinel for two-letter codes with no data.
pub const UNKNOWN_CODE: &str = "XX";
/// Fixed accuracy assigned to every IP-derived record (city-level granularity).
pub const IP_ACCURACY_METERS: f64 = 50_000.0;

/// Where a location came from, derived from its accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Gps,
    Wifi,
    Cell,
    Ip,
    /// Device coordinates enriched with IP network metadata.
    Hybrid,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gps => write!(f, "gps"),
            Self::Wifi => write!(f, "wifi"),
            Self::Cell => write!(f, "cell"),
            Self::Ip => write!(f, "ip"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Classify a raw accuracy radius. This is the only place the thresholds live.
///
/// NaN falls through every comparison and lands on `(Ip, Low)`.
pub fn classify(accuracy_meters: f64) -> (LocationSource, Confidence) {
    if accuracy_meters <= 10.0 {
        (LocationSource::Gps, Confidence::High)
    } else if accuracy_meters <= 100.0 {
        (LocationSource::Wifi, Confidence::High)
    } else if accuracy_meters <= 1000.0 {
        (LocationSource::Cell, Confidence::Medium)
    } else {
        (LocationSource::Ip, Confidence::Low)
    }
}

/// Human-readable description of the error radius a user should expect.
pub fn expected_error(accuracy_meters: f64) -> String {
    let scale = match classify(accuracy_meters).0 {
        LocationSource::Gps => "street level",
        LocationSource::Wifi => "block level",
        LocationSource::Cell => "neighbourhood level",
        _ => "city level",
    };
    if accuracy_meters >= 1000.0 {
        format!("within ~{:.0} km ({})", accuracy_meters / 1000.0, scale)
    } else {
        format!("within ~{:.0} m ({})", accuracy_meters, scale)
    }
}

/// Format coordinates as `59.3293°N, 18.0686°E`.
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lon.abs(), ew)
}

/// The unit of truth produced by adapters and the merge engine.
///
/// `accuracy_meters`, `source`, `confidence` and `served_from_cache` are
/// private. The accuracy is fixed at construction and alone decides source and
/// confidence (a merge only relabels the source as hybrid); the cache flag is
/// only set by the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRecord {
    pub latitude: f64,
    pub longitude: f64,
    accuracy_meters: f64,

    pub country: String,
    pub country_code: String,
    pub region: String,
    pub region_code: String,
    pub city: String,
    pub district: Option<String>,
    pub postal_code: String,

    pub ip: String,
    pub isp: String,
    pub organization: String,
    pub autonomous_system_number: String,

    pub timezone: String,
    pub currency: Option<String>,
    pub languages: Option<Vec<String>>,

    source: LocationSource,
    confidence: Confidence,

    pub is_vpn: bool,
    pub is_proxy: bool,
    pub is_mobile_network: bool,

    pub resolved_at_epoch_millis: i64,
    served_from_cache: bool,
}

impl LocationRecord {
    fn blank(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        let (source, confidence) = classify(accuracy_meters);
        Self {
            latitude,
            longitude,
            accuracy_meters,
            country: UNKNOWN.into(),
            country_code: UNKNOWN_CODE.into(),
            region: UNKNOWN.into(),
            region_code: UNKNOWN_CODE.into(),
            city: UNKNOWN.into(),
            district: None,
            postal_code: UNKNOWN.into(),
            ip: UNKNOWN.into(),
            isp: UNKNOWN.into(),
            organization: UNKNOWN.into(),
            autonomous_system_number: UNKNOWN.into(),
            timezone: UNKNOWN.into(),
            currency: None,
            languages: None,
            source,
            confidence,
            is_vpn: false,
            is_proxy: false,
            is_mobile_network: false,
            resolved_at_epoch_millis: chrono::Utc::now().timestamp_millis(),
            served_from_cache: false,
        }
    }

    /// A record built from a device fix; source and confidence follow the accuracy.
    pub fn from_fix(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self::blank(latitude, longitude, accuracy_meters)
    }

    /// A record built from IP geolocation: always `ip`/`low` at 50 km.
    pub fn from_ip(latitude: f64, longitude: f64) -> Self {
        Self::blank(latitude, longitude, IP_ACCURACY_METERS)
    }

    pub fn accuracy_meters(&self) -> f64 {
        self.accuracy_meters
    }

    pub fn source(&self) -> LocationSource {
        self.source
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// True only for records handed out by the cache.
    pub fn served_from_cache(&self) -> bool {
        self.served_from_cache
    }

    /// False for the `0.0/0.0` "no data" sentinel.
    pub fn has_coordinates(&self) -> bool {
        !(self.latitude == 0.0 && self.longitude == 0.0)
    }

    /// Overwrite the address fields carried by `address`, leaving the rest alone.
    pub fn apply_address(&mut self, address: AddressFields) {
        if let Some(v) = address.country {
            self.country = v;
        }
        if let Some(v) = address.country_code {
            self.country_code = v;
        }
        if let Some(v) = address.region {
            self.region = v;
        }
        if let Some(v) = address.region_code {
            self.region_code = v;
        }
        if let Some(v) = address.city {
            self.city = v;
        }
        if address.district.is_some() {
            self.district = address.district;
        }
        if let Some(v) = address.postal_code {
            self.postal_code = v;
        }
    }

    pub(crate) fn into_hybrid(mut self) -> Self {
        self.source = LocationSource::Hybrid;
        self
    }

    pub(crate) fn into_cached(mut self) -> Self {
        self.served_from_cache = true;
        self
    }

    pub(crate) fn into_fresh(mut self) -> Self {
        self.served_from_cache = false;
        self
    }

    pub fn display_line(&self) -> String {
        let place = match (self.city.as_str(), self.country.as_str()) {
            (UNKNOWN, UNKNOWN) => "Unknown place".to_string(),
            (city, UNKNOWN) => city.to_string(),
            (UNKNOWN, country) => country.to_string(),
            (city, country) => format!("{}, {}", city, country),
        };
        let cached = if self.served_from_cache { " [cached]" } else { "" };
        format!(
            "\u{1F4CD} {}\n  \u{1F552} {}\n  \u{1F4D0} {} ({})\n  \u{1F4E1} {}/{}{}",
            place,
            self.timezone,
            format_coords(self.latitude, self.longitude),
            expected_error(self.accuracy_meters()),
            self.source,
            self.confidence,
            cached,
        )
    }
}

/// Address fields produced by reverse geocoding. `None` means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
}

impl AddressFields {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Options for a single `get_location` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationOptions {
    pub enable_high_accuracy: bool,
    pub timeout_millis: u64,
    pub max_cached_age_millis: u64,
    pub fallback_to_ip: bool,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_millis: 10_000,
            max_cached_age_millis: 0,
            fallback_to_ip: true,
        }
    }
}

impl LocationOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }

    pub fn max_cached_age(&self) -> Duration {
        Duration::from_millis(self.max_cached_age_millis)
    }
}

/// Read-only view of the last cached resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum AccuracyStats {
    None,
    Resolved {
        source: LocationSource,
        confidence: Confidence,
        accuracy_meters: f64,
        expected_error: String,
    },
}

impl From<&LocationRecord> for AccuracyStats {
    fn from(record: &LocationRecord) -> Self {
        Self::Resolved {
            source: record.source(),
            confidence: record.confidence(),
            accuracy_meters: record.accuracy_meters(),
            expected_error: expected_error(record.accuracy_meters()),
        }
    }
}

/// Why the positioning capability produced no fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("timed out")]
    Timeout,
}

impl PositionError {
    /// Wire reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::PositionUnavailable => "position-unavailable",
            Self::Timeout => "timeout",
        }
    }
}

/// Location resolution errors. None of these reach `get_location` callers.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("device position unavailable: {0}")]
    PositionUnavailable(PositionError),
    #[error("provider {provider} unavailable: {reason}")]
    ProviderUnavailable {
        provider: &'static str,
        reason: String,
    },
    #[error("reverse geocoding unavailable: {0}")]
    GeocodeUnavailable(String),
}

impl LocationError {
    pub(crate) fn provider(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider,
            reason: reason.into(),
        }
    }
}
