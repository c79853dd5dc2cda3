//! geofix: best-effort client geolocation.
//!
//! A device fix is tried first and enriched by reverse geocoding; IP
//! geolocation providers fill in or take over, and the answer is cached for a
//! few minutes. See [`location::LocationService`].

pub mod config;
pub mod location;
pub mod logging;
pub mod server;

#[cfg(test)]
mod testing;
