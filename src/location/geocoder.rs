//! Reverse geocoding: coordinates → address fields.
//!
//! Enrichment only. A failed lookup is logged and yields empty
//! [`AddressFields`]; it never fails the device path.

use super::http::HttpClient;
use super::providers::{clean, country_code};
use super::types::{AddressFields, LocationError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> AddressFields;
}

/// Geocoder that never enriches.
pub struct NoGeocoder;

#[async_trait]
impl ReverseGeocoder for NoGeocoder {
    async fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> AddressFields {
        AddressFields::default()
    }
}

// ─── Nominatim ──────────────────────────────────────────────────

#[derive(Deserialize, Debug, Default)]
struct NominatimReverse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Deserialize, Debug, Default)]
struct NominatimAddress {
    country: Option<String>,
    country_code: Option<String>,
    state: Option<String>,
    province: Option<String>,
    region: Option<String>,
    county: Option<String>,
    #[serde(rename = "ISO3166-2-lvl4")]
    iso_lvl4: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    city_district: Option<String>,
    suburb: Option<String>,
    borough: Option<String>,
    postcode: Option<String>,
}

pub struct NominatimGeocoder {
    http: HttpClient,
    endpoint: String,
    language: String,
}

impl NominatimGeocoder {
    pub fn new(http: HttpClient, endpoint: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            language: language.into(),
        }
    }

    fn query(&self, latitude: f64, longitude: f64) -> Vec<(&'static str, String)> {
        vec![
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("format", "jsonv2".into()),
            ("addressdetails", "1".into()),
            ("accept-language", self.language.clone()),
        ]
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<AddressFields, LocationError> {
        let body: NominatimReverse = self
            .http
            .get_json_with_query(self.endpoint.clone(), self.query(latitude, longitude))
            .await
            .map_err(|e| LocationError::GeocodeUnavailable(e.to_string()))?;
        address_from_reverse(body)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> AddressFields {
        match self.lookup(latitude, longitude).await {
            Ok(address) => {
                debug!(city = ?address.city, country = ?address.country_code, "reverse geocoded");
                address
            }
            Err(e) => {
                warn!("{}", e);
                AddressFields::default()
            }
        }
    }
}

fn address_from_reverse(body: NominatimReverse) -> Result<AddressFields, LocationError> {
    if let Some(err) = body.error {
        return Err(LocationError::GeocodeUnavailable(err));
    }
    let a = body
        .address
        .ok_or_else(|| LocationError::GeocodeUnavailable("no address in response".into()))?;

    // "SE-AB" → "AB"
    let region_code = a
        .iso_lvl4
        .as_deref()
        .and_then(|iso| iso.split_once('-'))
        .map(|(_, sub)| sub.to_uppercase())
        .and_then(|s| clean(Some(s)));

    Ok(AddressFields {
        country: clean(a.country),
        country_code: country_code(a.country_code.as_deref()),
        region: clean(a.state.or(a.province).or(a.region).or(a.county)),
        region_code,
        city: clean(a.city.or(a.town).or(a.village).or(a.hamlet)),
        district: clean(a.city_district.or(a.suburb).or(a.borough)),
        postal_code: clean(a.postcode),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;
    use std::time::Duration;

    const STOCKHOLM: &str = r#"{
        "place_id": 1,
        "display_name": "Drottninggatan, Norrmalm, Stockholm, Sverige",
        "address": {
            "road": "Drottninggatan",
            "suburb": "Norrmalm",
            "city": "Stockholm",
            "county": "Stockholms län",
            "ISO3166-2-lvl4": "SE-AB",
            "postcode": "111 51",
            "country": "Sverige",
            "country_code": "se"
        }
    }"#;

    fn geocoder(base: &str) -> NominatimGeocoder {
        let http = HttpClient::new(Duration::from_secs(2), "geofix-test");
        NominatimGeocoder::new(http, format!("{}/reverse", base), "sv")
    }

    #[test]
    fn test_address_from_reverse() {
        let body: NominatimReverse = serde_json::from_str(STOCKHOLM).unwrap();
        let address = address_from_reverse(body).unwrap();
        assert_eq!(address.city.as_deref(), Some("Stockholm"));
        assert_eq!(address.district.as_deref(), Some("Norrmalm"));
        assert_eq!(address.region.as_deref(), Some("Stockholms län"));
        assert_eq!(address.region_code.as_deref(), Some("AB"));
        assert_eq!(address.country_code.as_deref(), Some("SE"));
        assert_eq!(address.postal_code.as_deref(), Some("111 51"));
    }

    #[test]
    fn test_town_used_when_no_city() {
        let body: NominatimReverse = serde_json::from_str(
            r#"{"address": {"town": "Kiruna", "country_code": "se"}}"#,
        )
        .unwrap();
        let address = address_from_reverse(body).unwrap();
        assert_eq!(address.city.as_deref(), Some("Kiruna"));
        assert!(address.region_code.is_none());
    }

    #[test]
    fn test_error_body_rejected() {
        let body: NominatimReverse =
            serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        assert!(matches!(
            address_from_reverse(body),
            Err(LocationError::GeocodeUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_reverse_geocode_over_http() {
        let base = serve(Router::new().route("/reverse", get(|| async { STOCKHOLM }))).await;
        let address = geocoder(&base).reverse_geocode(59.3326, 18.0649).await;
        assert_eq!(address.city.as_deref(), Some("Stockholm"));
    }

    #[tokio::test]
    async fn test_reverse_geocode_failure_is_empty() {
        let base = serve(Router::new().route(
            "/reverse",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        ))
        .await;
        let address = geocoder(&base).reverse_geocode(59.3326, 18.0649).await;
        assert!(address.is_empty());
    }

    #[tokio::test]
    async fn test_request_carries_coordinates_and_language() {
        let strict = Router::new().route(
            "/reverse",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let expected = [
                    ("lat", "59.5"),
                    ("lon", "18.25"),
                    ("format", "jsonv2"),
                    ("addressdetails", "1"),
                    ("accept-language", "sv"),
                ];
                if expected.iter().all(|(k, v)| q.get(*k).map(String::as_str) == Some(*v)) {
                    (StatusCode::OK, STOCKHOLM)
                } else {
                    (StatusCode::BAD_REQUEST, "{}")
                }
            }),
        );
        let base = serve(strict).await;
        let address = geocoder(&base).reverse_geocode(59.5, 18.25).await;
        assert_eq!(address.city.as_deref(), Some("Stockholm"));
    }
}
