//! On-device positioning.
//!
//! The platform capability sits behind [`PositionSource`]. [`DeviceLocator`]
//! bounds it by the requested timeout, validates the fix and hands the
//! coordinates to the reverse geocoder for address fields.

use super::geocoder::ReverseGeocoder;
use super::types::{LocationError, LocationOptions, LocationRecord, PositionError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Accuracy floor reported for a coarse (low-accuracy) fix.
pub const COARSE_ACCURACY_METERS: f64 = 100.0;

/// A raw position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    /// When the platform acquired the fix.
    pub timestamp_epoch_millis: i64,
}

/// What the positioning capability is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest platform-cached fix acceptable; zero demands a fresh one.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self::from(&LocationOptions::default())
    }
}

impl From<&LocationOptions> for PositionOptions {
    fn from(opts: &LocationOptions) -> Self {
        Self {
            enable_high_accuracy: opts.enable_high_accuracy,
            timeout: opts.timeout(),
            maximum_age: opts.max_cached_age(),
        }
    }
}

/// The platform's positioning capability.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<Fix, PositionError>;
}

/// A fixed, known position (e.g. a surveyed installation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
}

/// Without high accuracy the position is rounded to three decimals and the
/// reported radius never drops below [`COARSE_ACCURACY_METERS`].
#[async_trait]
impl PositionSource for StaticPosition {
    async fn current_position(&self, options: &PositionOptions) -> Result<Fix, PositionError> {
        let timestamp_epoch_millis = chrono::Utc::now().timestamp_millis();
        if options.enable_high_accuracy {
            return Ok(Fix {
                latitude: self.latitude,
                longitude: self.longitude,
                accuracy_meters: self.accuracy_meters,
                timestamp_epoch_millis,
            });
        }
        Ok(Fix {
            latitude: (self.latitude * 1000.0).round() / 1000.0,
            longitude: (self.longitude * 1000.0).round() / 1000.0,
            accuracy_meters: self.accuracy_meters.max(COARSE_ACCURACY_METERS),
            timestamp_epoch_millis,
        })
    }
}

/// No positioning hardware.
pub struct NoPositioning;

#[async_trait]
impl PositionSource for NoPositioning {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Fix, PositionError> {
        Err(PositionError::PositionUnavailable)
    }
}

/// The on-device adapter.
pub struct DeviceLocator {
    source: Arc<dyn PositionSource>,
    geocoder: Arc<dyn ReverseGeocoder>,
}

impl DeviceLocator {
    pub fn new(source: Arc<dyn PositionSource>, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self { source, geocoder }
    }

    /// Get a fix within `options.timeout`, then reverse geocode it.
    pub async fn locate(&self, options: &PositionOptions) -> Result<LocationRecord, LocationError> {
        let fix = match tokio::time::timeout(options.timeout, self.source.current_position(options)).await {
            Ok(Ok(fix)) => fix,
            Ok(Err(e)) => return Err(LocationError::PositionUnavailable(e)),
            Err(_) => return Err(LocationError::PositionUnavailable(PositionError::Timeout)),
        };

        if !is_usable(&fix) {
            debug!(?fix, "discarding unusable device fix");
            return Err(LocationError::PositionUnavailable(PositionError::PositionUnavailable));
        }
        if is_stale(&fix, options, chrono::Utc::now().timestamp_millis()) {
            debug!(?fix, max_age_ms = options.maximum_age.as_millis() as u64, "discarding stale device fix");
            return Err(LocationError::PositionUnavailable(PositionError::PositionUnavailable));
        }

        let mut record = LocationRecord::from_fix(fix.latitude, fix.longitude, fix.accuracy_meters);
        let address = self.geocoder.reverse_geocode(fix.latitude, fix.longitude).await;
        record.apply_address(address);
        Ok(record)
    }
}

fn is_usable(fix: &Fix) -> bool {
    let coords_ok = (-90.0..=90.0).contains(&fix.latitude)
        && (-180.0..=180.0).contains(&fix.longitude)
        && !(fix.latitude == 0.0 && fix.longitude == 0.0);
    coords_ok && fix.accuracy_meters.is_finite() && fix.accuracy_meters >= 0.0
}

/// A fix acquired for this request is at most `timeout` old; a platform-cached
/// one may be up to `maximum_age` older than that.
fn is_stale(fix: &Fix, options: &PositionOptions, now: i64) -> bool {
    let budget = options.maximum_age.saturating_add(options.timeout);
    let age = now.saturating_sub(fix.timestamp_epoch_millis);
    age > i64::try_from(budget.as_millis()).unwrap_or(i64::MAX)
}
