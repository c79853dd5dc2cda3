//! Location providers: IP geolocation services and the static fallback locality.
//!
//! Every IP adapter issues one GET, decodes its provider-specific body and
//! normalizes it into a coarse `ip`/`low` [`LocationRecord`]. A body that
//! decodes to `0.0, 0.0` is "nothing usable" and counts as a failure.

use super::http::HttpClient;
use super::types::{LocationError, LocationRecord, UNKNOWN, UNKNOWN_CODE};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// One external location source.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn resolve(&self) -> Result<LocationRecord, LocationError>;

    /// Provider name (for logs).
    fn name(&self) -> &'static str;
}

// ─── Provider catalogue ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "ip-api.com")]
    IpApiCom,
    #[serde(rename = "ipapi.co")]
    IpApiCo,
    #[serde(rename = "ipwho.is")]
    IpWhoIs,
    #[serde(rename = "ipinfo.io")]
    IpInfo,
}

/// Most detailed service first.
pub const DEFAULT_PRIORITY: [ProviderKind; 4] = [
    ProviderKind::IpApiCom,
    ProviderKind::IpApiCo,
    ProviderKind::IpWhoIs,
    ProviderKind::IpInfo,
];

impl ProviderKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::IpApiCom => "ip-api.com",
            Self::IpApiCo => "ipapi.co",
            Self::IpWhoIs => "ipwho.is",
            Self::IpInfo => "ipinfo.io",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            // The free tier is plain HTTP only.
            Self::IpApiCom => "http://ip-api.com/json/?fields=status,message,country,countryCode,region,regionName,city,district,zip,lat,lon,timezone,currency,isp,org,as,mobile,proxy,query",
            Self::IpApiCo => "https://ipapi.co/json/",
            Self::IpWhoIs => "https://ipwho.is/",
            Self::IpInfo => "https://ipinfo.io/json",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An HTTP IP-geolocation adapter.
pub struct IpGeolocator {
    kind: ProviderKind,
    http: HttpClient,
    endpoint: String,
}

impl IpGeolocator {
    pub fn with_endpoint(kind: ProviderKind, http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            kind,
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn into_shared(self) -> Arc<dyn LocationProvider> {
        Arc::new(self)
    }

    async fn fetch<T>(&self) -> Result<T, LocationError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.http
            .get_json(self.endpoint.clone())
            .await
            .map_err(|e| LocationError::provider(self.kind.name(), e.to_string()))
    }
}

#[async_trait]
impl LocationProvider for IpGeolocator {
    async fn resolve(&self) -> Result<LocationRecord, LocationError> {
        let record = match self.kind {
            ProviderKind::IpApiCom => from_ip_api_com(self.fetch().await?),
            ProviderKind::IpApiCo => from_ipapi_co(self.fetch().await?),
            ProviderKind::IpWhoIs => from_ipwho_is(self.fetch().await?),
            ProviderKind::IpInfo => from_ipinfo(self.fetch().await?),
        }
        .map_err(|reason| LocationError::provider(self.kind.name(), reason))?;

        let record = accept(record).map_err(|reason| LocationError::provider(self.kind.name(), reason))?;
        trace!(
            provider = self.kind.name(),
            city = %record.city,
            country = %record.country_code,
            "IP lookup"
        );
        Ok(record)
    }

    fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Reject the `0,0` sentinel and out-of-range coordinates.
fn accept(record: LocationRecord) -> Result<LocationRecord, String> {
    if !record.has_coordinates() {
        return Err("no usable coordinates (0,0)".into());
    }
    if !(-90.0..=90.0).contains(&record.latitude) || !(-180.0..=180.0).contains(&record.longitude) {
        return Err(format!(
            "coordinates out of range ({}, {})",
            record.latitude, record.longitude
        ));
    }
    Ok(record)
}

// ─── Normalization helpers ──────────────────────────────────────

/// Trim; empty becomes `None`.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Upper-cased two-letter code, or `None`.
pub(crate) fn country_code(value: Option<&str>) -> Option<String> {
    let code = value?.trim().to_uppercase();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code)
    } else {
        None
    }
}

fn text(value: Option<String>) -> String {
    clean(value).unwrap_or_else(|| UNKNOWN.into())
}

fn code(value: Option<&str>) -> String {
    country_code(value).unwrap_or_else(|| UNKNOWN_CODE.into())
}

/// Region codes vary in length ("CA", "AB", "ENG"); only the shape is checked.
fn region_code(value: Option<&str>) -> String {
    value
        .map(|s| s.trim().to_uppercase())
        .filter(|s| (1..=3).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| UNKNOWN_CODE.into())
}

/// "AS3301 Telia Company AB", "as3301" or "3301" → "AS3301".
fn asn_label(value: Option<&str>) -> String {
    value
        .and_then(|s| s.split_whitespace().next())
        .map(|tok| tok.trim_start_matches(|c| c == 'A' || c == 'a' || c == 'S' || c == 's'))
        .and_then(|digits| digits.parse::<u64>().ok())
        .map(|n| format!("AS{}", n))
        .unwrap_or_else(|| UNKNOWN.into())
}

/// Only IANA names survive.
fn timezone(value: Option<String>) -> String {
    clean(value)
        .filter(|tz| tz.parse::<chrono_tz::Tz>().is_ok())
        .unwrap_or_else(|| UNKNOWN.into())
}

/// "en-US,es-US,haw" → ["en-US", "es-US", "haw"].
fn languages(value: Option<&str>) -> Option<Vec<String>> {
    let list: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

// ─── ip-api.com ─────────────────────────────────────────────────

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct IpApiComBody {
    status: Option<String>,
    message: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    region: Option<String>,
    region_name: Option<String>,
    city: Option<String>,
    district: Option<String>,
    zip: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    timezone: Option<String>,
    currency: Option<String>,
    isp: Option<String>,
    org: Option<String>,
    #[serde(rename = "as")]
    asn: Option<String>,
    mobile: Option<bool>,
    proxy: Option<bool>,
    query: Option<String>,
}

fn from_ip_api_com(b: IpApiComBody) -> Result<LocationRecord, String> {
    if b.status.as_deref() != Some("success") {
        return Err(b.message.unwrap_or_else(|| "status is not success".into()));
    }
    let mut rec = LocationRecord::from_ip(b.lat.unwrap_or(0.0), b.lon.unwrap_or(0.0));
    rec.country = text(b.country);
    rec.country_code = code(b.country_code.as_deref());
    rec.region = text(b.region_name);
    rec.region_code = region_code(b.region.as_deref());
    rec.city = text(b.city);
    rec.district = clean(b.district);
    rec.postal_code = text(b.zip);
    rec.ip = text(b.query);
    rec.isp = text(b.isp);
    rec.organization = text(b.org);
    rec.autonomous_system_number = asn_label(b.asn.as_deref());
    rec.timezone = timezone(b.timezone);
    rec.currency = clean(b.currency);
    // `proxy` covers proxy, VPN and Tor exits alike.
    rec.is_proxy = b.proxy.unwrap_or(false);
    rec.is_vpn = rec.is_proxy;
    rec.is_mobile_network = b.mobile.unwrap_or(false);
    Ok(rec)
}

// ─── ipapi.co ───────────────────────────────────────────────────

#[derive(Deserialize, Debug, Default)]
struct IpApiCoBody {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    ip: Option<String>,
    city: Option<String>,
    region: Option<String>,
    region_code: Option<String>,
    country_name: Option<String>,
    country_code: Option<String>,
    postal: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
    currency: Option<String>,
    languages: Option<String>,
    asn: Option<String>,
    org: Option<String>,
}

fn from_ipapi_co(b: IpApiCoBody) -> Result<LocationRecord, String> {
    if b.error {
        return Err(b.reason.unwrap_or_else(|| "error flag set".into()));
    }
    let mut rec = LocationRecord::from_ip(b.latitude.unwrap_or(0.0), b.longitude.unwrap_or(0.0));
    rec.country = text(b.country_name);
    rec.country_code = code(b.country_code.as_deref());
    rec.region = text(b.region);
    rec.region_code = region_code(b.region_code.as_deref());
    rec.city = text(b.city);
    rec.postal_code = text(b.postal);
    rec.ip = text(b.ip);
    rec.isp = text(b.org.clone());
    rec.organization = text(b.org);
    rec.autonomous_system_number = asn_label(b.asn.as_deref());
    rec.timezone = timezone(b.timezone);
    rec.currency = clean(b.currency);
    rec.languages = languages(b.languages.as_deref());
    Ok(rec)
}

// ─── ipwho.is ───────────────────────────────────────────────────

#[derive(Deserialize, Debug, Default)]
struct IpWhoConnection {
    asn: Option<u64>,
    org: Option<String>,
    isp: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct IpWhoTimezone {
    id: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct IpWhoSecurity {
    #[serde(default)]
    vpn: bool,
    #[serde(default)]
    proxy: bool,
}

#[derive(Deserialize, Debug, Default)]
struct IpWhoCurrency {
    code: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct IpWhoIsBody {
    success: Option<bool>,
    message: Option<String>,
    ip: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    region: Option<String>,
    region_code: Option<String>,
    city: Option<String>,
    postal: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    connection: IpWhoConnection,
    #[serde(default)]
    timezone: IpWhoTimezone,
    #[serde(default)]
    security: IpWhoSecurity,
    #[serde(default)]
    currency: IpWhoCurrency,
}

fn from_ipwho_is(b: IpWhoIsBody) -> Result<LocationRecord, String> {
    if b.success != Some(true) {
        return Err(b.message.unwrap_or_else(|| "success flag not set".into()));
    }
    let mut rec = LocationRecord::from_ip(b.latitude.unwrap_or(0.0), b.longitude.unwrap_or(0.0));
    rec.country = text(b.country);
    rec.country_code = code(b.country_code.as_deref());
    rec.region = text(b.region);
    rec.region_code = region_code(b.region_code.as_deref());
    rec.city = text(b.city);
    rec.postal_code = text(b.postal);
    rec.ip = text(b.ip);
    rec.isp = text(b.connection.isp);
    rec.organization = text(b.connection.org);
    rec.autonomous_system_number = asn_label(b.connection.asn.map(|n| n.to_string()).as_deref());
    rec.timezone = timezone(b.timezone.id);
    rec.currency = clean(b.currency.code);
    rec.is_vpn = b.security.vpn;
    rec.is_proxy = b.security.proxy;
    Ok(rec)
}

// ─── ipinfo.io ──────────────────────────────────────────────────

#[derive(Deserialize, Debug, Default)]
struct IpInfoPrivacy {
    #[serde(default)]
    vpn: bool,
    #[serde(default)]
    proxy: bool,
}

#[derive(Deserialize, Debug, Default)]
struct IpInfoBody {
    #[serde(default)]
    bogon: bool,
    ip: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    loc: Option<String>,
    org: Option<String>,
    postal: Option<String>,
    timezone: Option<String>,
    #[serde(default)]
    privacy: IpInfoPrivacy,
}

/// "37.3860,-122.0838" → (37.386, -122.0838); anything else → (0, 0).
fn parse_loc(loc: Option<&str>) -> (f64, f64) {
    loc.and_then(|s| s.split_once(','))
        .and_then(|(lat, lon)| Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?)))
        .unwrap_or((0.0, 0.0))
}

fn from_ipinfo(b: IpInfoBody) -> Result<LocationRecord, String> {
    if b.bogon {
        return Err("bogon address".into());
    }
    let (lat, lon) = parse_loc(b.loc.as_deref());
    let mut rec = LocationRecord::from_ip(lat, lon);

    // "AS15169 Google LLC" → asn + organization
    let org = clean(b.org);
    let org_name = org
        .as_deref()
        .and_then(|o| o.split_once(' '))
        .map(|(_, name)| name.to_string());

    // ipinfo only returns the ISO code.
    rec.country_code = code(b.country.as_deref());
    rec.region = text(b.region);
    rec.city = text(b.city);
    rec.postal_code = text(b.postal);
    rec.ip = text(b.ip);
    rec.autonomous_system_number = asn_label(org.as_deref());
    rec.organization = text(org_name.clone());
    rec.isp = text(org_name);
    rec.timezone = timezone(b.timezone);
    rec.is_vpn = b.privacy.vpn;
    rec.is_proxy = b.privacy.proxy;
    Ok(rec)
}

// ─── Static fallback ────────────────────────────────────────────

/// The locality reported when every other source fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackLocality {
    pub city: String,
    pub region: String,
    pub country: String,
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl Default for FallbackLocality {
    fn default() -> Self {
        Self {
            city: "London".into(),
            region: "England".into(),
            country: "United Kingdom".into(),
            country_code: "GB".into(),
            latitude: 51.5074,
            longitude: -0.1278,
            timezone: "Europe/London".into(),
        }
    }
}

impl FallbackLocality {
    /// The static default record: `ip`/`low`, no network metadata.
    pub fn to_record(&self) -> LocationRecord {
        let mut rec = LocationRecord::from_ip(self.latitude, self.longitude);
        rec.city = self.city.clone();
        rec.region = self.region.clone();
        rec.country = self.country.clone();
        rec.country_code = self.country_code.clone();
        rec.timezone = self.timezone.clone();
        rec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::types::{Confidence, LocationSource, IP_ACCURACY_METERS};
    use crate::testing::serve;
    use approx::assert_relative_eq;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::time::Duration;

    const IP_API_COM: &str = r#"{
        "status": "success", "country": "Sweden", "countryCode": "SE",
        "region": "AB", "regionName": "Stockholm County", "city": "Stockholm",
        "district": "", "zip": "111 52", "lat": 59.3293, "lon": 18.0686,
        "timezone": "Europe/Stockholm", "currency": "SEK", "isp": "Telia Company AB",
        "org": "Telia Sverige", "as": "AS3301 Telia Company AB",
        "mobile": true, "proxy": false, "hosting": false, "query": "81.224.1.1"
    }"#;

    const IPAPI_CO: &str = r#"{
        "ip": "8.8.8.8", "city": "Mountain View", "region": "California",
        "region_code": "CA", "country_name": "United States", "country_code": "US",
        "postal": "94043", "latitude": 37.42301, "longitude": -122.083352,
        "timezone": "America/Los_Angeles", "currency": "USD",
        "languages": "en-US,es-US,haw,fr", "asn": "AS15169", "org": "GOOGLE"
    }"#;

    const IPWHO_IS: &str = r#"{
        "ip": "2.248.0.1", "success": true, "country": "Sweden", "country_code": "SE",
        "region": "Skåne County", "region_code": "M", "city": "Malmö", "postal": "211 19",
        "latitude": 55.604981, "longitude": 13.003822,
        "connection": {"asn": 3301, "org": "Telia", "isp": "Telia Company AB"},
        "timezone": {"id": "Europe/Stockholm", "utc": "+01:00"},
        "security": {"vpn": true, "proxy": false}
    }"#;

    const IPINFO: &str = r#"{
        "ip": "8.8.8.8", "city": "Mountain View", "region": "California",
        "country": "US", "loc": "37.4056,-122.0775", "org": "AS15169 Google LLC",
        "postal": "94043", "timezone": "America/Los_Angeles"
    }"#;

    #[test]
    fn test_ip_api_com_normalized() {
        let rec = from_ip_api_com(serde_json::from_str(IP_API_COM).unwrap()).unwrap();
        assert_eq!(rec.country, "Sweden");
        assert_eq!(rec.country_code, "SE");
        assert_eq!(rec.region, "Stockholm County");
        assert_eq!(rec.region_code, "AB");
        assert!(rec.district.is_none());
        assert_eq!(rec.autonomous_system_number, "AS3301");
        assert_eq!(rec.ip, "81.224.1.1");
        assert!(rec.is_mobile_network);
        assert!(!rec.is_proxy);
        assert_eq!(rec.source(), LocationSource::Ip);
        assert_eq!(rec.confidence(), Confidence::Low);
        assert_relative_eq!(rec.accuracy_meters(), IP_ACCURACY_METERS);
    }

    #[test]
    fn test_ip_api_com_hosting_is_not_vpn() {
        let datacenter = IP_API_COM.replace(r#""hosting": false"#, r#""hosting": true"#);
        let rec = from_ip_api_com(serde_json::from_str(&datacenter).unwrap()).unwrap();
        assert!(!rec.is_vpn);
        assert!(!rec.is_proxy);

        let tunnelled = IP_API_COM.replace(r#""proxy": false"#, r#""proxy": true"#);
        let rec = from_ip_api_com(serde_json::from_str(&tunnelled).unwrap()).unwrap();
        assert!(rec.is_vpn);
        assert!(rec.is_proxy);
    }

    #[test]
    fn test_ip_api_com_fail_status() {
        let body = serde_json::from_str(r#"{"status":"fail","message":"reserved range"}"#).unwrap();
        assert_eq!(from_ip_api_com(body).unwrap_err(), "reserved range");
    }

    #[test]
    fn test_ipapi_co_normalized() {
        let rec = from_ipapi_co(serde_json::from_str(IPAPI_CO).unwrap()).unwrap();
        assert_relative_eq!(rec.latitude, 37.42301);
        assert_eq!(rec.city, "Mountain View");
        assert_eq!(rec.region_code, "CA");
        assert_eq!(rec.isp, "GOOGLE");
        assert_eq!(rec.currency.as_deref(), Some("USD"));
        assert_eq!(
            rec.languages,
            Some(vec!["en-US".into(), "es-US".into(), "haw".into(), "fr".into()])
        );
    }

    #[test]
    fn test_ipapi_co_error_flag() {
        let body = serde_json::from_str(r#"{"error":true,"reason":"RateLimited"}"#).unwrap();
        assert_eq!(from_ipapi_co(body).unwrap_err(), "RateLimited");
    }

    #[test]
    fn test_ipwho_is_normalized() {
        let rec = from_ipwho_is(serde_json::from_str(IPWHO_IS).unwrap()).unwrap();
        assert_eq!(rec.city, "Malmö");
        assert_eq!(rec.autonomous_system_number, "AS3301");
        assert_eq!(rec.isp, "Telia Company AB");
        assert_eq!(rec.timezone, "Europe/Stockholm");
        assert!(rec.is_vpn);
        assert!(rec.currency.is_none());
    }

    #[test]
    fn test_ipwho_is_unsuccessful() {
        let body =
            serde_json::from_str(r#"{"success":false,"message":"Invalid IP address"}"#).unwrap();
        assert!(from_ipwho_is(body).is_err());
    }

    #[test]
    fn test_ipinfo_normalized() {
        let rec = from_ipinfo(serde_json::from_str(IPINFO).unwrap()).unwrap();
        assert_relative_eq!(rec.latitude, 37.4056);
        assert_relative_eq!(rec.longitude, -122.0775);
        assert_eq!(rec.country_code, "US");
        assert_eq!(rec.country, UNKNOWN);
        assert_eq!(rec.autonomous_system_number, "AS15169");
        assert_eq!(rec.organization, "Google LLC");
    }

    #[test]
    fn test_ipinfo_missing_loc_is_sentinel() {
        let rec = from_ipinfo(serde_json::from_str(r#"{"ip":"10.0.0.1"}"#).unwrap()).unwrap();
        assert!(!rec.has_coordinates());
        assert!(accept(rec).is_err());
    }

    #[test]
    fn test_accept_rejects_zero_zero() {
        assert!(accept(LocationRecord::from_ip(0.0, 0.0)).is_err());
        assert!(accept(LocationRecord::from_ip(91.0, 10.0)).is_err());
        assert!(accept(LocationRecord::from_ip(0.0, 10.0)).is_ok());
    }

    #[test]
    fn test_helpers() {
        assert_eq!(asn_label(Some("AS3301 Telia")), "AS3301");
        assert_eq!(asn_label(Some("as15169")), "AS15169");
        assert_eq!(asn_label(Some("15169")), "AS15169");
        assert_eq!(asn_label(Some("n/a")), UNKNOWN);
        assert_eq!(asn_label(None), UNKNOWN);

        assert_eq!(code(Some("se")), "SE");
        assert_eq!(code(Some("SWE")), UNKNOWN_CODE);
        assert_eq!(code(None), UNKNOWN_CODE);

        assert_eq!(timezone(Some("Europe/Oslo".into())), "Europe/Oslo");
        assert_eq!(timezone(Some("Mars/Olympus".into())), UNKNOWN);
        assert_eq!(text(Some("   ".into())), UNKNOWN);

        assert_eq!(parse_loc(Some("1.5, -2.25")), (1.5, -2.25));
        assert_eq!(parse_loc(Some("garbage")), (0.0, 0.0));
        assert!(languages(Some(" , ")).is_none());
    }

    #[test]
    fn test_fallback_record() {
        let rec = FallbackLocality::default().to_record();
        assert_eq!(rec.city, "London");
        assert_eq!(rec.timezone, "Europe/London");
        assert_eq!(rec.source(), LocationSource::Ip);
        assert_eq!(rec.confidence(), Confidence::Low);
        assert_eq!(rec.isp, UNKNOWN);
    }

    #[test]
    fn test_provider_kind_serde_names() {
        let json = serde_json::to_string(&DEFAULT_PRIORITY).unwrap();
        assert_eq!(json, r#"["ip-api.com","ipapi.co","ipwho.is","ipinfo.io"]"#);
        let kind: ProviderKind = serde_json::from_str(r#""ipinfo.io""#).unwrap();
        assert_eq!(kind, ProviderKind::IpInfo);
    }

    fn fixture_router() -> Router {
        Router::new()
            .route("/ip-api", get(|| async { IP_API_COM }))
            .route("/ipapi", get(|| async { IPAPI_CO }))
            .route("/ipwho", get(|| async { IPWHO_IS }))
            .route("/ipinfo", get(|| async { IPINFO }))
            .route("/zero", get(|| async { r#"{"status":"success","lat":0.0,"lon":0.0}"# }))
            .route("/down", get(|| async { (StatusCode::BAD_GATEWAY, "upstream") }))
    }

    fn adapter(kind: ProviderKind, url: String) -> IpGeolocator {
        let http = HttpClient::new(Duration::from_secs(2), "geofix-test");
        IpGeolocator::with_endpoint(kind, http, url)
    }

    #[tokio::test]
    async fn test_adapters_over_http() {
        let base = serve(fixture_router()).await;
        let cases = [
            (ProviderKind::IpApiCom, "/ip-api", "Stockholm"),
            (ProviderKind::IpApiCo, "/ipapi", "Mountain View"),
            (ProviderKind::IpWhoIs, "/ipwho", "Malmö"),
            (ProviderKind::IpInfo, "/ipinfo", "Mountain View"),
        ];
        for (kind, path, city) in cases {
            let rec = adapter(kind, format!("{}{}", base, path)).resolve().await.unwrap();
            assert_eq!(rec.city, city, "{}", kind);
        }
    }

    #[tokio::test]
    async fn test_adapter_rejects_zero_coordinates() {
        let base = serve(fixture_router()).await;
        let err = adapter(ProviderKind::IpApiCom, format!("{}/zero", base))
            .resolve()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LocationError::ProviderUnavailable { provider: "ip-api.com", .. }
        ));
    }

    #[tokio::test]
    async fn test_adapter_http_failure() {
        let base = serve(fixture_router()).await;
        let err = adapter(ProviderKind::IpWhoIs, format!("{}/down", base))
            .resolve()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_adapter_wrong_shape_is_failure() {
        let base = serve(fixture_router()).await;
        // ipinfo body against the ipwho.is decoder.
        let err = adapter(ProviderKind::IpWhoIs, format!("{}/ipinfo", base))
            .resolve()
            .await
            .unwrap_err();
        assert!(matches!(err, LocationError::ProviderUnavailable { .. }));
    }
}
