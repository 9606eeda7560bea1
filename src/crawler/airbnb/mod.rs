//! airbnb.com crawlers: search pagination, detail enrichment, and the
//! discovery/extraction plumbing they share.

pub mod detail;
pub mod fields;
pub mod search;
pub mod signature;
pub mod state;

use reqwest::header::HeaderMap;
use url::Url;

use crate::http::{header_map, USER_AGENT};

pub const ROOMS_BASE: &str = "https://www.airbnb.com/rooms/";

/// Header set for persisted-query API calls. The upstream service rejects
/// requests missing the platform headers or the bootstrap API key.
pub fn api_headers(markup: &str, referer: &str) -> HeaderMap {
    let api_key = state::api_key(markup);
    header_map(&[
        ("authority", "www.airbnb.com"),
        ("accept", "*/*"),
        ("accept-language", "en-US,en;q=0.9"),
        ("content-type", "application/json"),
        ("referer", referer),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-origin"),
        ("user-agent", USER_AGENT),
        ("x-airbnb-api-key", &api_key),
        ("x-airbnb-graphql-platform", "web"),
        ("x-airbnb-graphql-platform-client", "minimalist-niobe"),
        ("x-airbnb-supports-airlock-v2", "true"),
        ("x-csrf-token", "null"),
        ("x-csrf-without-token", "1"),
        ("x-niobe-short-circuited", "true"),
    ])
}

/// Filter parameters carried from the origin search URL onto every room URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarriedParams {
    pub adults: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
}

impl CarriedParams {
    /// Parse from an origin search URL's query (`adults`, `checkin`,
    /// `checkout` keys).
    pub fn from_origin(origin_url: &str) -> Self {
        let mut params = Self::default();
        let Ok(url) = Url::parse(origin_url) else {
            return params;
        };
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "adults" => params.adults = Some(value.into_owned()),
                "checkin" => params.check_in = Some(value.into_owned()),
                "checkout" => params.check_out = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

/// Canonical room URL: a pure function of listing id and carried filter
/// parameters, with a fixed parameter order so repeated calls yield an
/// identical string.
pub fn room_url(listing_id: &str, carried: &CarriedParams) -> String {
    let id = listing_id.trim();
    if id.is_empty() {
        return String::new();
    }
    let mut query = Vec::new();
    if let Some(adults) = &carried.adults {
        query.push(format!("adults={}", urlencoding::encode(adults)));
    }
    if let Some(check_in) = &carried.check_in {
        query.push(format!("check_in={}", urlencoding::encode(check_in)));
    }
    if let Some(check_out) = &carried.check_out {
        query.push(format!("check_out={}", urlencoding::encode(check_out)));
    }
    if query.is_empty() {
        format!("{}{}", ROOMS_BASE, id)
    } else {
        format!("{}{}?{}", ROOMS_BASE, id, query.join("&"))
    }
}

/// Check-in/check-out dates from the origin URL query.
pub fn check_dates(origin_url: &str) -> (String, String) {
    let carried = CarriedParams::from_origin(origin_url);
    (
        carried.check_in.unwrap_or_default(),
        carried.check_out.unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str =
        "https://www.airbnb.com/s/Kissimmee/homes?adults=4&checkin=2024-05-19&checkout=2024-05-24";

    #[test]
    fn room_url_is_deterministic() {
        let carried = CarriedParams::from_origin(ORIGIN);
        let first = room_url("42", &carried);
        let second = room_url("42", &carried);
        assert_eq!(first, second);
        assert_eq!(
            first,
            "https://www.airbnb.com/rooms/42?adults=4&check_in=2024-05-19&check_out=2024-05-24"
        );
    }

    #[test]
    fn room_url_without_carried_params_is_bare() {
        assert_eq!(
            room_url(" 42 ", &CarriedParams::default()),
            "https://www.airbnb.com/rooms/42"
        );
        assert_eq!(room_url("", &CarriedParams::default()), "");
    }

    #[test]
    fn check_dates_come_from_origin_query() {
        let (check_in, check_out) = check_dates(ORIGIN);
        assert_eq!(check_in, "2024-05-19");
        assert_eq!(check_out, "2024-05-24");

        let (none_in, none_out) = check_dates("https://www.airbnb.com/s/x/homes");
        assert!(none_in.is_empty() && none_out.is_empty());
    }
}
