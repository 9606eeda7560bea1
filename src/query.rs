//! Query-string synthesis: merge user filter parameters into a search URL
//! using the site's own query keys.

use chrono::NaiveDate;
use url::Url;

use crate::config::QueryFilters;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%B %d, %Y", "%b %d, %Y"];

/// Merge filters over the base URL's existing query. Keys already present in
/// the URL are replaced; everything else is appended in a fixed order.
pub fn generate_query_url(base: &str, filters: &QueryFilters) -> String {
    let Ok(mut url) = Url::parse(base) else {
        return base.to_string();
    };

    let overrides = site_query_pairs(filters);
    if overrides.is_empty() {
        return base.to_string();
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !overrides.iter().any(|(ok, _)| ok == k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in kept.iter().chain(overrides.iter()) {
            pairs.append_pair(k, v);
        }
    }
    url.to_string()
}

/// Map filter names onto site query keys, normalizing values along the way.
fn site_query_pairs(filters: &QueryFilters) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    if let Some(v) = &filters.bedroom {
        pairs.push(("min_bedrooms".into(), v.clone()));
    }
    if let Some(d) = &filters.checkin {
        pairs.push(("checkin".into(), normalize_date(d)));
    }
    if let Some(d) = &filters.checkout {
        pairs.push(("checkout".into(), normalize_date(d)));
    }
    if let Some(v) = &filters.bed {
        pairs.push(("min_beds".into(), v.clone()));
    }
    if let Some(v) = &filters.price_min {
        pairs.push(("price_min".into(), v.clone()));
    }
    if let Some(v) = &filters.price_max {
        pairs.push(("price_max".into(), v.clone()));
    }
    if let Some(v) = &filters.adults {
        pairs.push(("adults".into(), v.clone()));
    }
    if truthy(&filters.pool) {
        pairs.push(("amenities[]".into(), "7".into()));
    }
    if truthy(&filters.waterfront) {
        pairs.push(("kg_and_tags[]".into(), "Tag:686".into()));
    }
    pairs
}

fn truthy(value: &Option<String>) -> bool {
    value
        .as_deref()
        .is_some_and(|v| v.to_lowercase().contains("true"))
}

/// Normalize a user-supplied date to `%Y-%m-%d`; unparseable input passes
/// through unchanged.
fn normalize_date(input: &str) -> String {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input.trim(), format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    input.to_string()
}
