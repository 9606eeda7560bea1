use chrono::{DateTime, Utc};
use serde::Serialize;

/// One flat listing row. The serialized key set (including the historically
/// misspelled `lattitude`/`longtitude`) is a stable contract for downstream
/// consumers and must not change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListingRecord {
    pub check_in_date: String,
    pub check_out_date: String,
    pub rank: u32,
    pub label: String,
    pub url: String,
    pub description: String,
    pub currency: String,
    pub price_per_night: f64,
    pub orig_price_per_night: f64,
    pub total_price: f64,
    pub rating_score: f64,
    pub rating_count: i64,
    pub labels: Vec<String>,
    pub image_url: String,
    pub host_name: String,
    pub cleanliness: f64,
    pub accuracy: f64,
    pub location_rate: f64,
    pub communication: f64,
    pub check_in_rating: f64,
    pub guest: i64,
    pub baths: i64,
    pub beds: i64,
    pub bedrooms: i64,
    pub kitchen: bool,
    pub pool: bool,
    pub lattitude: String,
    pub longtitude: String,
    pub amenities: Vec<String>,
    pub cleaning_fee: f64,
    pub service_fee: f64,
    pub property_type: String,
}

/// Column order for the CSV sink; matches the serialized field order.
pub const FIELDS: &[&str] = &[
    "check_in_date",
    "check_out_date",
    "rank",
    "label",
    "url",
    "description",
    "currency",
    "price_per_night",
    "orig_price_per_night",
    "total_price",
    "rating_score",
    "rating_count",
    "labels",
    "image_url",
    "host_name",
    "cleanliness",
    "accuracy",
    "location_rate",
    "communication",
    "check_in_rating",
    "guest",
    "baths",
    "beds",
    "bedrooms",
    "kitchen",
    "pool",
    "lattitude",
    "longtitude",
    "amenities",
    "cleaning_fee",
    "service_fee",
    "property_type",
];

impl ListingRecord {
    /// Field values in `FIELDS` order, lists joined with `; `.
    pub fn csv_values(&self) -> Vec<String> {
        vec![
            self.check_in_date.clone(),
            self.check_out_date.clone(),
            self.rank.to_string(),
            self.label.clone(),
            self.url.clone(),
            self.description.clone(),
            self.currency.clone(),
            self.price_per_night.to_string(),
            self.orig_price_per_night.to_string(),
            self.total_price.to_string(),
            self.rating_score.to_string(),
            self.rating_count.to_string(),
            self.labels.join("; "),
            self.image_url.clone(),
            self.host_name.clone(),
            self.cleanliness.to_string(),
            self.accuracy.to_string(),
            self.location_rate.to_string(),
            self.communication.to_string(),
            self.check_in_rating.to_string(),
            self.guest.to_string(),
            self.baths.to_string(),
            self.beds.to_string(),
            self.bedrooms.to_string(),
            self.kitchen.to_string(),
            self.pool.to_string(),
            self.lattitude.clone(),
            self.longtitude.clone(),
            self.amenities.join("; "),
            self.cleaning_fee.to_string(),
            self.service_fee.to_string(),
            self.property_type.clone(),
        ]
    }
}

/// Result of one crawl invocation: the ordered records plus the metadata the
/// output sink persists alongside them.
#[derive(Debug, Serialize)]
pub struct CrawlOutcome {
    pub url: String,
    pub crawl_start: DateTime<Utc>,
    pub crawl_finish: DateTime<Utc>,
    pub records: Vec<ListingRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_values_match_field_count() {
        let record = ListingRecord::default();
        assert_eq!(record.csv_values().len(), FIELDS.len());
    }

    #[test]
    fn serialized_keys_preserve_upstream_spelling() {
        let record = ListingRecord::default();
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("lattitude"));
        assert!(obj.contains_key("longtitude"));
        assert_eq!(obj.len(), FIELDS.len());
        for key in FIELDS {
            assert!(obj.contains_key(*key), "missing key {}", key);
        }
    }
}
