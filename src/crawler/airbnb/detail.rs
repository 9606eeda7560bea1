//! Detail-page enrichment: a second discovery+fetch cycle against the PDP
//! sections API, and — for listings needing live pricing — a third against
//! the checkout pricing API. Every failure here degrades to defaults; the
//! enricher never aborts the listing it is augmenting.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use super::fields::{checkout, detail};
use super::signature::{SignatureResolver, STAYS_PDP_SECTIONS};
use super::{api_headers, state};
use crate::config::CrawlConfig;
use crate::crawler::Crawler;
use crate::http::HttpClient;
use crate::json::pluck;
use crate::record::ListingRecord;

const API_BASE: &str = "https://www.airbnb.com/api/v3";

/// Reduced section-id set for the lighter page-data call; the full variable
/// set pulls every PDP section and is only needed once per room.
const SECTION_ALLOWLIST: &[&str] = &[
    "CANCELLATION_POLICY_PICKER_MODAL",
    "BOOK_IT_CALENDAR_SHEET",
    "POLICIES_DEFAULT",
    "BOOK_IT_SIDEBAR",
    "URGENCY_COMMITMENT_SIDEBAR",
    "BOOK_IT_NAV",
    "BOOK_IT_FLOATING_FOOTER",
    "EDUCATION_FOOTER_BANNER",
    "URGENCY_COMMITMENT",
    "EDUCATION_FOOTER_BANNER_MODAL",
];

/// Detail-page fields, applied over a search-shape record when present.
#[derive(Debug, Default)]
pub struct DetailBasic {
    pub label: String,
    pub description: String,
    pub image_url: String,
    pub rating_score: f64,
    pub rating_count: i64,
    pub property_type: String,
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
    pub product_id: String,
}

#[derive(Debug, Default)]
pub struct DetailPricing {
    pub price_per_night: f64,
    pub total_price: f64,
}

#[derive(Debug, Default)]
pub struct DetailData {
    pub basic: Option<DetailBasic>,
    pub pricing: Option<DetailPricing>,
}

impl DetailData {
    /// Merge into a record: detail values win over search-shape values, as
    /// the detail page is the richer source.
    pub fn apply(&self, record: &mut ListingRecord) {
        if let Some(b) = &self.basic {
            record.label = b.label.clone();
            record.description = b.description.clone();
            record.image_url = b.image_url.clone();
            record.rating_score = b.rating_score;
            record.rating_count = b.rating_count;
            record.property_type = b.property_type.clone();
            record.host_name = b.host_name.clone();
            record.cleanliness = b.cleanliness;
            record.accuracy = b.accuracy;
            record.location_rate = b.location_rate;
            record.communication = b.communication;
            record.check_in_rating = b.check_in_rating;
            record.guest = b.guest;
            record.baths = b.baths;
            record.beds = b.beds;
            record.bedrooms = b.bedrooms;
            record.kitchen = b.kitchen;
            record.pool = b.pool;
            record.lattitude = b.lattitude.clone();
            record.longtitude = b.longtitude.clone();
            record.amenities = b.amenities.clone();
            record.cleaning_fee = b.cleaning_fee;
            record.service_fee = b.service_fee;
        }
        if let Some(p) = &self.pricing {
            record.price_per_night = p.price_per_night;
            record.total_price = p.total_price;
        }
    }
}

pub struct DetailEnricher<'a> {
    http: &'a HttpClient,
}

impl<'a> DetailEnricher<'a> {
    pub fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    /// Fetch the room page and run the PDP (and optionally checkout)
    /// discovery+extraction cycles. Signatures are resolved through the
    /// session-wide cache.
    pub async fn enrich(
        &self,
        signatures: &mut SignatureResolver,
        room_url: &str,
        with_price: bool,
    ) -> DetailData {
        let mut data = DetailData::default();
        if room_url.is_empty() {
            return data;
        }
        debug!("Fetching detail page {}", room_url);
        let Ok(markup) = self.http.get(room_url, None).await else {
            return data;
        };

        data.basic = self.fetch_basic(signatures, room_url, &markup).await;
        if with_price {
            let product_id = data
                .basic
                .as_ref()
                .map(|b| b.product_id.clone())
                .unwrap_or_default();
            data.pricing = self
                .fetch_pricing(signatures, room_url, &markup, &product_id)
                .await;
        }
        data
    }

    async fn fetch_basic(
        &self,
        signatures: &mut SignatureResolver,
        room_url: &str,
        markup: &str,
    ) -> Option<DetailBasic> {
        let sig = signatures
            .resolve(self.http, markup, &STAYS_PDP_SECTIONS)
            .await?;
        let headers = api_headers(markup, room_url);

        // Full variable set once for coordinates, amenities, and the product
        // id; the trimmed call covers everything else.
        let initial_url = pdp_api_url(markup, &sig, true)?;
        let initial = self.fetch_room_tree(&initial_url, &headers).await;
        let sections_url = pdp_api_url(markup, &sig, false)?;
        let room = self.fetch_room_tree(&sections_url, &headers).await;
        if initial.is_null() && room.is_null() {
            return None;
        }

        let counts = detail::room_counts(&room);
        let amenities = detail::amenities(&initial);
        let fees = detail::fees(&room);
        Some(DetailBasic {
            label: detail::title(&room),
            description: detail::description(&room),
            image_url: detail::image_url(&room),
            rating_score: detail::rating_score(&room),
            rating_count: detail::rating_count(&room),
            property_type: detail::property_type(&room),
            host_name: detail::host_name(&room),
            cleanliness: detail::cleanliness(&room),
            accuracy: detail::accuracy(&room),
            location_rate: detail::location_rating(&room),
            communication: detail::communication(&room),
            check_in_rating: detail::check_in_rating(&room),
            guest: detail::person_capacity(&room),
            baths: counts.baths,
            beds: counts.beds,
            bedrooms: counts.bedrooms,
            kitchen: amenities.kitchen,
            pool: amenities.pool,
            lattitude: detail::latitude(&initial),
            longtitude: detail::longitude(&initial),
            amenities: amenities.extras,
            cleaning_fee: fees.cleaning_fee,
            service_fee: fees.service_fee,
            product_id: detail::product_id(&initial),
        })
    }

    async fn fetch_pricing(
        &self,
        signatures: &mut SignatureResolver,
        room_url: &str,
        markup: &str,
        product_id: &str,
    ) -> Option<DetailPricing> {
        if product_id.is_empty() {
            return None;
        }
        let sig = signatures.resolve_checkout(self.http, markup).await?;
        let url = checkout_api_url(room_url, &sig, product_id)?;
        let headers = api_headers(markup, room_url);
        let body = self.http.get(&url, Some(&headers)).await.ok()?;
        let parsed: Value = serde_json::from_str(&body).ok()?;
        let data = pluck(&parsed, &["data", "presentation", "stayCheckout"]);
        if data.is_null() {
            return None;
        }
        Some(DetailPricing {
            price_per_night: checkout::price_per_night(data),
            total_price: checkout::total_price(data),
        })
    }

    async fn fetch_room_tree(
        &self,
        api_url: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> Value {
        let Ok(body) = self.http.get(api_url, Some(headers)).await else {
            return Value::Null;
        };
        let Ok(parsed) = serde_json::from_str::<Value>(&body) else {
            return Value::Null;
        };
        pluck(&parsed, &["data", "presentation", "stayProductDetailPage"]).clone()
    }
}

/// PDP sections API URL: the page's own variables (optionally trimmed to the
/// section-id allowlist) plus the persisted-query extension.
fn pdp_api_url(markup: &str, sig: &str, initial: bool) -> Option<String> {
    let mut variables = state::pdp_variables(markup);
    if variables.is_null() {
        return None;
    }
    if !initial {
        variables
            .get_mut("pdpSectionsRequest")?
            .as_object_mut()?
            .insert("sectionIds".into(), json!(SECTION_ALLOWLIST));
    }
    let variables_txt = serde_json::to_string(&variables).ok()?;
    Some(persisted_query_url(
        "StaysPdpSections",
        sig,
        &variables_txt,
    ))
}

/// Checkout pricing API URL from the room URL's carried dates/guest counts
/// and the discovered product id.
fn checkout_api_url(room_url: &str, sig: &str, product_id: &str) -> Option<String> {
    let variables = checkout_variables(room_url, product_id)?;
    let variables_txt = serde_json::to_string(&variables).ok()?;
    Some(persisted_query_url("stayCheckout", sig, &variables_txt))
}

fn checkout_variables(room_url: &str, product_id: &str) -> Option<Value> {
    let url = Url::parse(room_url).ok()?;
    let mut check_in = None;
    let mut check_out = None;
    let mut adults = 10i64;
    let mut children = 0i64;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "check_in" => check_in = Some(value.into_owned()),
            "check_out" => check_out = Some(value.into_owned()),
            "adults" => adults = value.parse().unwrap_or(adults),
            "children" => children = value.parse().unwrap_or(children),
            _ => {}
        }
    }
    let check_in = check_in?;
    let check_out = check_out?;
    Some(json!({
        "input": {
            "businessTravel": {"workTrip": false},
            "checkinDate": check_in,
            "checkoutDate": check_out,
            "guestCounts": {
                "numberOfAdults": adults,
                "numberOfChildren": children,
                "numberOfInfants": 0,
                "numberOfPets": 0
            },
            "guestCurrencyOverride": "USD",
            "listingDetail": {},
            "lux": {},
            "metadata": {
                "internalFlags": [
                    "LAUNCH_LOGIN_PHONE_AUTH",
                    "LAUNCH_WEB_SBUI_MIGRATION_V2",
                    "LAUNCH_WEB_SBUI_MIGRATION_V3"
                ]
            },
            "org": {},
            "productId": product_id,
            "addOn": {"carbonOffsetParams": {"isSelected": false}},
            "quickPayData": null
        },
        "isLeanFragment": false
    }))
}

fn persisted_query_url(operation: &str, sig: &str, variables: &str) -> String {
    let extensions = format!(
        r#"{{"persistedQuery":{{"version":1,"sha256Hash":"{}"}}}}"#,
        sig
    );
    format!(
        "{}/{}/{}?operationName={}&locale=en&currency=USD&variables={}&extensions={}",
        API_BASE,
        operation,
        sig,
        operation,
        urlencoding::encode(variables),
        urlencoding::encode(&extensions)
    )
}

/// Standalone single-room crawler, reachable through the registry.
pub struct DetailCrawler {
    http: HttpClient,
}

impl DetailCrawler {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Crawler for DetailCrawler {
    async fn execute(&self, config: &CrawlConfig) -> Vec<ListingRecord> {
        let mut signatures = SignatureResolver::new();
        let enricher = DetailEnricher::new(&self.http);
        info!("Crawling detail page {}", config.url);
        let data = enricher
            .enrich(&mut signatures, &config.url, config.with_price)
            .await;

        let (check_in, check_out) = room_dates(&config.url);
        let mut record = ListingRecord {
            check_in_date: check_in,
            check_out_date: check_out,
            rank: 1,
            url: config.url.clone(),
            currency: "USD".into(),
            ..Default::default()
        };
        data.apply(&mut record);
        vec![record]
    }
}

/// Dates from a room URL, accepting both query-key spellings.
fn room_dates(room_url: &str) -> (String, String) {
    let Ok(url) = Url::parse(room_url) else {
        return (String::new(), String::new());
    };
    let mut check_in = String::new();
    let mut check_out = String::new();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "check_in" | "checkin" => check_in = value.into_owned(),
            "check_out" | "checkout" => check_out = value.into_owned(),
            _ => {}
        }
    }
    (check_in, check_out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM_URL: &str =
        "https://www.airbnb.com/rooms/42?adults=4&check_in=2024-05-19&check_out=2024-05-24";

    #[test]
    fn checkout_variables_carry_dates_and_guests() {
        let vars = checkout_variables(ROOM_URL, "prod-1").unwrap();
        assert_eq!(vars["input"]["checkinDate"], "2024-05-19");
        assert_eq!(vars["input"]["checkoutDate"], "2024-05-24");
        assert_eq!(vars["input"]["guestCounts"]["numberOfAdults"], 4);
        assert_eq!(vars["input"]["productId"], "prod-1");
    }

    #[test]
    fn checkout_variables_require_dates() {
        assert!(checkout_variables("https://www.airbnb.com/rooms/42", "prod-1").is_none());
    }

    #[test]
    fn pdp_api_url_trims_section_ids_for_light_call() {
        let markup = std::fs::read_to_string("tests/fixtures/search_page.html").unwrap();
        let full = pdp_api_url(&markup, "sig0", true).unwrap();
        let light = pdp_api_url(&markup, "sig0", false).unwrap();
        assert!(full.starts_with("https://www.airbnb.com/api/v3/StaysPdpSections/sig0?"));
        assert!(!full.contains("BOOK_IT_SIDEBAR"));
        let decoded = urlencoding::decode(&light).unwrap().into_owned();
        assert!(decoded.contains("BOOK_IT_SIDEBAR"));
        assert!(decoded.contains("\"sha256Hash\":\"sig0\""));
    }

    #[test]
    fn detail_data_applies_over_record() {
        let data = DetailData {
            basic: Some(DetailBasic {
                label: "Villa".into(),
                baths: 6,
                kitchen: true,
                amenities: vec!["Ocean view".into()],
                ..Default::default()
            }),
            pricing: Some(DetailPricing {
                price_per_night: 45.0,
                total_price: 135.0,
            }),
        };
        let mut record = ListingRecord {
            label: "search title".into(),
            price_per_night: 99.0,
            ..Default::default()
        };
        data.apply(&mut record);
        assert_eq!(record.label, "Villa");
        assert_eq!(record.baths, 6);
        assert!(record.kitchen);
        assert_eq!(record.price_per_night, 45.0);
        assert_eq!(record.total_price, 135.0);
    }

    #[test]
    fn empty_detail_data_leaves_record_alone() {
        let mut record = ListingRecord {
            label: "search title".into(),
            ..Default::default()
        };
        DetailData::default().apply(&mut record);
        assert_eq!(record.label, "search title");
    }

    #[test]
    fn room_dates_accept_both_spellings() {
        assert_eq!(
            room_dates(ROOM_URL),
            ("2024-05-19".into(), "2024-05-24".into())
        );
        assert_eq!(
            room_dates("https://www.airbnb.com/rooms/42?checkin=a&checkout=b"),
            ("a".into(), "b".into())
        );
    }
}
