//! Location resolver: orchestrates the fallback chain.
//!
//! Flow: Cache → device fix (+ reverse geocode) → IP providers in priority
//! order (fallback, or enrichment via merge) → static default.
//!
//! `get_location` never fails; every failure degrades to a lower-confidence
//! record.

use super::cache::LocationCache;
use super::device::{DeviceLocator, NoPositioning, PositionOptions, PositionSource, StaticPosition};
use super::geocoder::{NominatimGeocoder, ReverseGeocoder};
use super::http::HttpClient;
use super::merge::merge;
use super::providers::{FallbackLocality, IpGeolocator, LocationProvider};
use super::types::{AccuracyStats, LocationOptions, LocationRecord};
use crate::config::GeoConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The location service. Construct once per process and share it (`Arc`).
pub struct LocationService {
    device: Option<DeviceLocator>,
    providers: Vec<Arc<dyn LocationProvider>>,
    fallback: FallbackLocality,
    cache: LocationCache,
}

impl LocationService {
    pub fn new(
        device: Option<DeviceLocator>,
        providers: Vec<Arc<dyn LocationProvider>>,
        fallback: FallbackLocality,
        cache: LocationCache,
    ) -> Self {
        Self {
            device,
            providers,
            fallback,
            cache,
        }
    }

    /// Wire up the real adapters described by `config`.
    pub fn from_config(config: &GeoConfig) -> Self {
        let http = HttpClient::new(config.http_timeout(), &config.user_agent);

        let providers = config
            .providers
            .iter()
            .map(|&kind| {
                let endpoint = config.endpoint_for(kind);
                IpGeolocator::with_endpoint(kind, http.clone(), endpoint).into_shared()
            })
            .collect();

        let geocoder: Arc<dyn ReverseGeocoder> = Arc::new(NominatimGeocoder::new(
            http,
            config.geocoder_endpoint.clone(),
            config.language.clone(),
        ));
        let source: Arc<dyn PositionSource> = match config.device {
            Some(fix) => Arc::new(StaticPosition {
                latitude: fix.latitude,
                longitude: fix.longitude,
                accuracy_meters: fix.accuracy_meters,
            }),
            None => Arc::new(NoPositioning),
        };

        info!(
            providers = ?config.providers,
            ttl_secs = config.cache_ttl_secs,
            device = config.device.is_some(),
            "location service ready"
        );

        Self::new(
            Some(DeviceLocator::new(source, geocoder)),
            providers,
            config.fallback.clone(),
            LocationCache::new(config.cache_ttl()),
        )
    }

    /// Resolve the current location. Always returns a record.
    pub async fn get_location(&self, options: &LocationOptions) -> LocationRecord {
        // 1. Cache
        if let Some(hit) = self.cache.get() {
            debug!(source = %hit.source(), "location served from cache");
            return hit;
        }

        let mut record = self.resolve_uncached(options).await;
        record.resolved_at_epoch_millis = chrono::Utc::now().timestamp_millis();
        self.cache.put(record.clone());

        info!(
            source = %record.source(),
            confidence = %record.confidence(),
            city = %record.city,
            "location resolved"
        );
        record.into_fresh()
    }

    /// Diagnostics for the last cached resolution.
    pub fn accuracy_stats(&self) -> AccuracyStats {
        self.cache
            .last()
            .map(|rec| AccuracyStats::from(&rec))
            .unwrap_or(AccuracyStats::None)
    }

    /// Drop the cached record so the next call resolves again.
    pub fn invalidate(&self) {
        debug!("location cache invalidated");
        self.cache.invalidate();
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    async fn resolve_uncached(&self, options: &LocationOptions) -> LocationRecord {
        // 2. Device
        let device = self.locate_device(options).await;

        match (device, options.fallback_to_ip) {
            // 3. Device only
            (Some(device), false) => device,
            // 4. Device enriched by IP
            (Some(device), true) => match self.resolve_ip().await {
                Some(ip) => merge(&device, &ip),
                None => device,
            },
            // 5./6. IP alone, then the static default
            (None, true) => self.resolve_ip().await.unwrap_or_else(|| self.default_record()),
            (None, false) => self.default_record(),
        }
    }

    async fn locate_device(&self, options: &LocationOptions) -> Option<LocationRecord> {
        let locator = self.device.as_ref()?;
        match locator.locate(&PositionOptions::from(options)).await {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }

    /// Providers strictly in order; the first usable record wins.
    async fn resolve_ip(&self) -> Option<LocationRecord> {
        for provider in &self.providers {
            match provider.resolve().await {
                Ok(record) if record.has_coordinates() => {
                    debug!(provider = provider.name(), "IP provider answered");
                    return Some(record);
                }
                Ok(_) => warn!(provider = provider.name(), "no usable coordinates, trying next provider"),
                Err(e) => warn!("{}, trying next provider", e),
            }
        }
        None
    }

    fn default_record(&self) -> LocationRecord {
        warn!(city = %self.fallback.city, "all location sources failed, using static default");
        self.fallback.to_record()
    }
}
