//! Canonical field extraction from listing JSON.
//!
//! Two upstream shapes feed the same record: the search-result item shape and
//! the detail-page (`stayProductDetailPage`) shape, plus the checkout price
//! breakdown. Every extractor is total — any missing or wrong-typed path
//! degrades to the field's zero-value without touching sibling fields.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::json::{self, leading_int, money, pluck};

static RATING_SCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9.]+) out").unwrap());
static RATING_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) reviews").unwrap());

/// Search-result item shape.
pub mod search {
    use super::*;

    pub fn listing_id(item: &Value) -> String {
        let id = json::str_at(item, &["listing", "id"]);
        if !id.is_empty() {
            return id.to_string();
        }
        json::str_at(item, &["listingId"]).to_string()
    }

    /// Skinny items carry no inline pricing and need live-pricing enrichment.
    pub fn is_skinny(item: &Value) -> bool {
        json::str_at(item, &["__typename"]) == "SkinnyListingItem"
    }

    pub fn title(item: &Value) -> String {
        json::str_at(item, &["listing", "title"]).to_string()
    }

    pub fn description(item: &Value) -> String {
        json::str_at(item, &["listing", "name"]).to_string()
    }

    /// Primary nightly price, falling back to the discounted figure.
    pub fn price_per_night(item: &Value) -> f64 {
        let line = pluck(item, &["pricingQuote", "structuredStayDisplayPrice", "primaryLine"]);
        let text = json::str_at(line, &["price"]);
        let text = if text.is_empty() {
            json::str_at(line, &["discountedPrice"])
        } else {
            text
        };
        if text.is_empty() {
            0.0
        } else {
            money(text)
        }
    }

    pub fn orig_price_per_night(item: &Value) -> f64 {
        let text = json::str_at(
            item,
            &["pricingQuote", "structuredStayDisplayPrice", "primaryLine", "originalPrice"],
        );
        if text.is_empty() {
            0.0
        } else {
            money(text)
        }
    }

    pub fn total_price(item: &Value) -> f64 {
        let text = json::str_at(
            item,
            &["pricingQuote", "structuredStayDisplayPrice", "secondaryLine", "price"],
        );
        if text.is_empty() {
            0.0
        } else {
            money(text)
        }
    }

    /// Score from the accessibility label, e.g. "4.92 out of 5 stars, 128 reviews".
    pub fn rating_score(item: &Value) -> f64 {
        let label = json::str_at(item, &["listing", "avgRatingA11yLabel"]);
        RATING_SCORE_RE
            .captures(label)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0.0)
    }

    pub fn rating_count(item: &Value) -> i64 {
        let label = json::str_at(item, &["listing", "avgRatingA11yLabel"]);
        RATING_COUNT_RE
            .captures(label)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    }

    pub fn image_url(item: &Value) -> String {
        json::str_at(item, &["listing", "contextualPictures", "0", "picture"]).to_string()
    }

    pub fn labels(item: &Value) -> Vec<String> {
        json::arr_at(item, &["listing", "formattedBadges"])
            .iter()
            .filter_map(|badge| badge.get("text").and_then(Value::as_str))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Detail-page (`stayProductDetailPage`) shape.
pub mod detail {
    use super::*;

    fn metadata(room: &Value) -> &Value {
        pluck(room, &["sections", "metadata"])
    }

    fn sharing_config<'a>(room: &'a Value, key: &str) -> &'a Value {
        pluck(metadata(room), &["sharingConfig", key])
    }

    fn event_logging(room: &Value, key: &str) -> f64 {
        json::f64_at(metadata(room), &["loggingContext", "eventDataLogging", key])
    }

    fn sbui_sections(room: &Value) -> &[Value] {
        json::arr_at(
            room,
            &["sections", "sbuiData", "sectionConfiguration", "root", "sections"],
        )
    }

    fn plain_sections(room: &Value) -> &[Value] {
        json::arr_at(room, &["sections", "sections"])
    }

    /// Sharing title, first `·` segment only — the raw value appends room
    /// stats to the listing name.
    pub fn title(room: &Value) -> String {
        sharing_config(room, "title")
            .as_str()
            .and_then(|t| t.split('·').next())
            .unwrap_or("")
            .trim()
            .to_string()
    }

    pub fn description(room: &Value) -> String {
        json::str_at(
            metadata(room),
            &["seoFeatures", "ogTags", "ogDescription"],
        )
        .to_string()
    }

    pub fn image_url(room: &Value) -> String {
        json::str_at(metadata(room), &["sharingConfig", "imageUrl"]).to_string()
    }

    pub fn rating_score(room: &Value) -> f64 {
        json::f64_at(metadata(room), &["sharingConfig", "starRating"])
    }

    pub fn rating_count(room: &Value) -> i64 {
        json::i64_at(metadata(room), &["sharingConfig", "reviewCount"])
    }

    pub fn property_type(room: &Value) -> String {
        json::str_at(metadata(room), &["sharingConfig", "propertyType"]).to_string()
    }

    pub fn person_capacity(room: &Value) -> i64 {
        json::i64_at(metadata(room), &["sharingConfig", "personCapacity"])
    }

    pub fn cleanliness(room: &Value) -> f64 {
        event_logging(room, "cleanlinessRating")
    }

    pub fn accuracy(room: &Value) -> f64 {
        event_logging(room, "accuracyRating")
    }

    pub fn location_rating(room: &Value) -> f64 {
        event_logging(room, "locationRating")
    }

    pub fn communication(room: &Value) -> f64 {
        event_logging(room, "communicationRating")
    }

    pub fn check_in_rating(room: &Value) -> f64 {
        event_logging(room, "checkinRating")
    }

    /// Coordinates are carried as numbers but reported as strings; zero means
    /// absent and is reported as "".
    pub fn latitude(room: &Value) -> String {
        coordinate(room, "listingLat")
    }

    pub fn longitude(room: &Value) -> String {
        coordinate(room, "listingLng")
    }

    fn coordinate(room: &Value, key: &str) -> String {
        let v = event_logging(room, key);
        if v == 0.0 {
            String::new()
        } else {
            v.to_string()
        }
    }

    pub fn host_name(room: &Value) -> String {
        sbui_sections(room)
            .iter()
            .find(|s| json::str_at(s, &["sectionId"]) == "HOST_OVERVIEW_DEFAULT")
            .map(|s| json::str_at(s, &["sectionData", "title"]))
            .map(|t| t.replace("Hosted by", "").trim().to_string())
            .unwrap_or_default()
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct RoomCounts {
        pub bedrooms: i64,
        pub baths: i64,
        pub beds: i64,
    }

    /// Bed/bath/bedroom counts from the overview line titles: each count key
    /// is matched against the titles containing it and the leading integer
    /// token is taken. "bedroom" is checked before "beds" so "3 bedrooms"
    /// never satisfies the bed count.
    pub fn room_counts(room: &Value) -> RoomCounts {
        let mut counts = RoomCounts::default();
        let Some(section) = sbui_sections(room)
            .iter()
            .find(|s| json::str_at(s, &["sectionId"]) == "OVERVIEW_DEFAULT_V2")
        else {
            return counts;
        };
        let items = json::arr_at(section, &["sectionData", "overviewItems"]);
        let titles: Vec<&str> = items
            .iter()
            .map(|item| json::str_at(item, &["title"]))
            .collect();

        let find = |key: &str| {
            titles
                .iter()
                .find(|t| t.contains(key))
                .map(|t| leading_int(t))
                .unwrap_or(0)
        };
        counts.bedrooms = find("bedroom");
        counts.baths = find("bath");
        counts.beds = titles
            .iter()
            .find(|t| t.contains("bed") && !t.contains("bedroom"))
            .map(|t| leading_int(t))
            .unwrap_or(0);
        counts
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct Amenities {
        pub kitchen: bool,
        pub pool: bool,
        pub extras: Vec<String>,
    }

    /// Amenity flags: case-insensitive title match for the two named
    /// amenities; any other available amenity lands in `extras`; unavailable
    /// amenities are dropped entirely.
    pub fn amenities(room: &Value) -> Amenities {
        let mut out = Amenities::default();
        let Some(section) = plain_sections(room)
            .iter()
            .find(|s| json::str_at(s, &["sectionId"]) == "AMENITIES_DEFAULT")
        else {
            return out;
        };
        for group in json::arr_at(section, &["section", "seeAllAmenitiesGroups"]) {
            for item in json::arr_at(group, &["amenities"]) {
                let title = json::str_at(item, &["title"]);
                let available = pluck(item, &["available"]).as_bool().unwrap_or(false);
                let lower = title.to_lowercase();
                if lower.contains("kitchen") {
                    out.kitchen = available;
                } else if lower.contains("pool") {
                    out.pool = available;
                } else if available && !title.is_empty() {
                    out.extras.push(title.to_string());
                }
            }
        }
        out
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct Fees {
        pub cleaning_fee: f64,
        pub service_fee: f64,
    }

    /// Cleaning/service fees from the booking-sheet price details: the fee
    /// name (underscores as spaces) is matched against item descriptions and
    /// the matched price string parsed with the shared currency policy.
    pub fn fees(room: &Value) -> Fees {
        let mut out = Fees::default();
        let Some(section) = plain_sections(room)
            .iter()
            .find(|s| json::str_at(s, &["sectionComponentType"]) == "BOOK_IT_CALENDAR_SHEET")
        else {
            return out;
        };
        let items = json::arr_at(
            section,
            &["section", "structuredDisplayPrice", "explanationData", "priceDetails", "0", "items"],
        );
        let lookup = |fee_key: &str| {
            let needle = fee_key.replace('_', " ");
            items
                .iter()
                .find(|item| {
                    json::str_at(item, &["description"])
                        .to_lowercase()
                        .contains(&needle)
                })
                .map(|item| money(json::str_at(item, &["priceString"])))
                .unwrap_or(0.0)
        };
        out.cleaning_fee = lookup("cleaning_fee");
        out.service_fee = lookup("service_fee");
        out
    }

    /// Checkout product id from the overview section's logging data.
    pub fn product_id(room: &Value) -> String {
        sbui_sections(room)
            .iter()
            .find(|s| json::str_at(s, &["sectionId"]).contains("OVERVIEW_DEFAULT_V2"))
            .map(|s| json::str_at(s, &["loggingData", "eventData", "productId"]).to_string())
            .unwrap_or_default()
    }
}

/// Checkout (`stayCheckout`) price breakdown shape.
pub mod checkout {
    use super::*;

    fn first_price_item(data: &Value) -> &Value {
        pluck(
            data,
            &[
                "sections",
                "temporaryQuickPayData",
                "bootstrapPayments",
                "productPriceBreakdown",
                "priceBreakdown",
                "priceItems",
                "0",
            ],
        )
    }

    /// Nightly rate from the breakdown title, e.g. "$45.00 x 3 nights".
    pub fn price_per_night(data: &Value) -> f64 {
        let title = json::str_at(first_price_item(data), &["localizedTitle"]);
        if title.is_empty() {
            0.0
        } else {
            money(title)
        }
    }

    pub fn total_price(data: &Value) -> f64 {
        let text = json::str_at(first_price_item(data), &["total", "amountFormatted"]);
        if text.is_empty() {
            0.0
        } else {
            money(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rating_label_splits_into_score_and_count() {
        let item = json!({"listing": {"avgRatingA11yLabel": "4.92 out of 5 stars, 128 reviews"}});
        assert_eq!(search::rating_score(&item), 4.92);
        assert_eq!(search::rating_count(&item), 128);
    }

    #[test]
    fn absent_rating_label_defaults_to_zero() {
        let item = json!({"listing": {}});
        assert_eq!(search::rating_score(&item), 0.0);
        assert_eq!(search::rating_count(&item), 0);
        assert_eq!(search::rating_score(&json!(null)), 0.0);
    }

    #[test]
    fn price_prefers_primary_then_discounted() {
        let primary = json!({"pricingQuote": {"structuredStayDisplayPrice": {
            "primaryLine": {"price": "$120", "discountedPrice": "$99"}}}});
        assert_eq!(search::price_per_night(&primary), 120.0);

        let discounted = json!({"pricingQuote": {"structuredStayDisplayPrice": {
            "primaryLine": {"discountedPrice": "$99"}}}});
        assert_eq!(search::price_per_night(&discounted), 99.0);

        assert_eq!(search::price_per_night(&json!({})), 0.0);
    }

    #[test]
    fn listing_id_falls_back_to_flat_key() {
        assert_eq!(search::listing_id(&json!({"listing": {"id": " 42 "}})), "42");
        assert_eq!(search::listing_id(&json!({"listingId": "77"})), "77");
        assert_eq!(search::listing_id(&json!({})), "");
    }

    #[test]
    fn skinny_items_are_detected_by_typename() {
        assert!(search::is_skinny(&json!({"__typename": "SkinnyListingItem"})));
        assert!(!search::is_skinny(&json!({"__typename": "StaySearchResult"})));
    }

    #[test]
    fn badges_become_labels() {
        let item = json!({"listing": {"formattedBadges": [
            {"text": " Guest favorite "}, {"text": "Superhost"}, {"no_text": 1}]}});
        assert_eq!(search::labels(&item), vec!["Guest favorite", "Superhost"]);
    }

    fn room_fixture() -> Value {
        json!({"sections": {
            "metadata": {
                "sharingConfig": {
                    "title": "Lakeside villa · 8 bedrooms · 10 beds",
                    "starRating": 4.8,
                    "reviewCount": 52,
                    "propertyType": "Entire villa",
                    "personCapacity": 12,
                    "imageUrl": "https://img.example/1.jpg"
                },
                "seoFeatures": {"ogTags": {"ogDescription": "A villa by the lake."}},
                "loggingContext": {"eventDataLogging": {
                    "cleanlinessRating": 4.9,
                    "accuracyRating": 4.7,
                    "communicationRating": 5.0,
                    "locationRating": 4.6,
                    "checkinRating": 4.8,
                    "listingLat": 28.31,
                    "listingLng": -81.45
                }}
            },
            "sbuiData": {"sectionConfiguration": {"root": {"sections": [
                {"sectionId": "HOST_OVERVIEW_DEFAULT",
                 "sectionData": {"title": "Hosted by Maria"}},
                {"sectionId": "OVERVIEW_DEFAULT_V2",
                 "loggingData": {"eventData": {"productId": "cHJvZHVjdDo0Mg=="}},
                 "sectionData": {"overviewItems": [
                    {"title": "12 guests"}, {"title": "8 bedrooms"},
                    {"title": "10 beds"}, {"title": "6 baths"}]}}
            ]}}},
            "sections": [
                {"sectionId": "AMENITIES_DEFAULT", "section": {"seeAllAmenitiesGroups": [
                    {"amenities": [
                        {"title": "Kitchen", "available": true},
                        {"title": "Private pool", "available": true},
                        {"title": "Ocean view", "available": true},
                        {"title": "Washer", "available": false}]}]}},
                {"sectionComponentType": "BOOK_IT_CALENDAR_SHEET", "section": {
                    "structuredDisplayPrice": {"explanationData": {"priceDetails": [
                        {"items": [
                            {"description": "Cleaning fee", "priceString": "$150"},
                            {"description": "Airbnb service fee", "priceString": "$98.50"},
                            {"description": "$45.00 x 3 nights", "priceString": "$135"}]}
                    ]}}}}
            ]
        }})
    }

    #[test]
    fn detail_metadata_fields() {
        let room = room_fixture();
        assert_eq!(detail::title(&room), "Lakeside villa");
        assert_eq!(detail::description(&room), "A villa by the lake.");
        assert_eq!(detail::rating_score(&room), 4.8);
        assert_eq!(detail::rating_count(&room), 52);
        assert_eq!(detail::property_type(&room), "Entire villa");
        assert_eq!(detail::person_capacity(&room), 12);
        assert_eq!(detail::host_name(&room), "Maria");
        assert_eq!(detail::latitude(&room), "28.31");
        assert_eq!(detail::longitude(&room), "-81.45");
        assert_eq!(detail::cleanliness(&room), 4.9);
        assert_eq!(detail::accuracy(&room), 4.7);
        assert_eq!(detail::product_id(&room), "cHJvZHVjdDo0Mg==");
    }

    #[test]
    fn room_counts_take_leading_integers() {
        let counts = detail::room_counts(&room_fixture());
        assert_eq!(
            counts,
            detail::RoomCounts { bedrooms: 8, baths: 6, beds: 10 }
        );
        assert_eq!(detail::room_counts(&json!({})), detail::RoomCounts::default());
    }

    #[test]
    fn amenity_flags_and_extras() {
        let a = detail::amenities(&room_fixture());
        assert!(a.kitchen);
        assert!(a.pool);
        assert_eq!(a.extras, vec!["Ocean view"]);
    }

    #[test]
    fn unavailable_named_amenity_stays_false() {
        let room = json!({"sections": {"sections": [
            {"sectionId": "AMENITIES_DEFAULT", "section": {"seeAllAmenitiesGroups": [
                {"amenities": [{"title": "Kitchen", "available": false}]}]}}]}});
        let a = detail::amenities(&room);
        assert!(!a.kitchen);
        assert!(a.extras.is_empty());
    }

    #[test]
    fn fees_match_by_description() {
        let fees = detail::fees(&room_fixture());
        assert_eq!(fees.cleaning_fee, 150.0);
        assert_eq!(fees.service_fee, 98.5);
        assert_eq!(detail::fees(&json!({})), detail::Fees::default());
    }

    #[test]
    fn checkout_breakdown_prices() {
        let data = json!({"sections": {"temporaryQuickPayData": {"bootstrapPayments": {
            "productPriceBreakdown": {"priceBreakdown": {"priceItems": [
                {"localizedTitle": "$45.00 x 3 nights",
                 "total": {"amountFormatted": "$135.00"}}]}}}}}});
        assert_eq!(checkout::price_per_night(&data), 45.0);
        assert_eq!(checkout::total_price(&data), 135.0);
        assert_eq!(checkout::price_per_night(&json!({})), 0.0);
    }

    #[test]
    fn extractors_are_total_on_wrong_types() {
        let junk = json!({"sections": "nope", "listing": 4, "pricingQuote": []});
        assert_eq!(detail::title(&junk), "");
        assert_eq!(detail::host_name(&junk), "");
        assert_eq!(detail::amenities(&junk), detail::Amenities::default());
        assert_eq!(search::title(&junk), "");
        assert_eq!(search::image_url(&junk), "");
        assert!(search::labels(&junk).is_empty());
    }
}
