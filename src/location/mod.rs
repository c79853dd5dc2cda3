//! Location subsystem for geofix.
//!
//! Resolves the client's location from a device fix and a chain of IP
//! geolocation providers, merges the results, and caches the answer.

pub mod cache;
pub mod device;
pub mod geocoder;
pub mod http;
pub mod merge;
pub mod providers;
pub mod resolver;
pub mod types;

pub use cache::LocationCache;
pub use device::{DeviceLocator, Fix, NoPositioning, PositionOptions, PositionSource, StaticPosition};
pub use geocoder::{NoGeocoder, NominatimGeocoder, ReverseGeocoder};
pub use merge::merge;
pub use providers::{FallbackLocality, IpGeolocator, LocationProvider, ProviderKind};
pub use resolver::LocationService;
pub use types::{
    classify, format_coords, AccuracyStats, AddressFields, Confidence, LocationError,
    LocationOptions, LocationRecord, LocationSource, PositionError,
};
