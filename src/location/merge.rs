//! Merge a device fix with an IP record into a hybrid record.

use super::types::{LocationRecord, UNKNOWN, UNKNOWN_CODE};

/// Combine `primary` (device) with `secondary` (IP).
///
/// Coordinates, accuracy and confidence come from the device; network
/// metadata, risk flags, currency and languages come from IP; address fields
/// and timezone prefer the device unless it only holds a sentinel.
pub fn merge(primary: &LocationRecord, secondary: &LocationRecord) -> LocationRecord {
    let mut out = primary.clone();

    out.country = prefer(&primary.country, &secondary.country, UNKNOWN);
    out.country_code = prefer(&primary.country_code, &secondary.country_code, UNKNOWN_CODE);
    out.region = prefer(&primary.region, &secondary.region, UNKNOWN);
    out.region_code = prefer(&primary.region_code, &secondary.region_code, UNKNOWN_CODE);
    out.city = prefer(&primary.city, &secondary.city, UNKNOWN);
    out.district = primary.district.clone().or_else(|| secondary.district.clone());
    out.postal_code = prefer(&primary.postal_code, &secondary.postal_code, UNKNOWN);
    out.timezone = prefer(&primary.timezone, &secondary.timezone, UNKNOWN);

    out.ip = secondary.ip.clone();
    out.isp = secondary.isp.clone();
    out.organization = secondary.organization.clone();
    out.autonomous_system_number = secondary.autonomous_system_number.clone();
    out.is_vpn = secondary.is_vpn;
    out.is_proxy = secondary.is_proxy;
    out.is_mobile_network = secondary.is_mobile_network;

    out.currency = secondary.currency.clone();
    out.languages = secondary.languages.clone();

    out.into_hybrid()
}

fn prefer(primary: &str, secondary: &str, sentinel: &str) -> String {
    if primary == sentinel {
        secondary.to_string()
    } else {
        primary.to_string()
    }
}
