//! Search pagination: the page-by-page crawl loop.
//!
//! The loop is fully sequential and best-effort. A failed fetch, an empty
//! page, or a payload that cannot be built all terminate pagination and
//! return whatever was accumulated — the crawl boundary never raises for
//! upstream misbehavior.

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::HeaderMap;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::detail::DetailEnricher;
use super::fields::search as fields;
use super::signature::{SignatureResolver, STAYS_SEARCH};
use super::{api_headers, check_dates, room_url, state, CarriedParams};
use crate::config::CrawlConfig;
use crate::crawler::Crawler;
use crate::http::HttpClient;
use crate::record::ListingRecord;

const API_BASE: &str = "https://www.airbnb.com/api/v3/StaysSearch";

pub struct SearchCrawler {
    http: HttpClient,
}

impl SearchCrawler {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn crawl(&self, config: &CrawlConfig) -> Vec<ListingRecord> {
        let origin = config.url.clone();
        let carried = CarriedParams::from_origin(&origin);
        let (check_in, check_out) = check_dates(&origin);
        let mut signatures = SignatureResolver::new();

        let mut records: Vec<ListingRecord> = Vec::new();
        let mut next_url = origin.clone();
        let mut payload: Option<String> = None;
        let mut headers: Option<HeaderMap> = None;
        let mut first_markup: Option<String> = None;
        let mut page: u32 = 1;
        let mut next_rank: u32 = 1;

        loop {
            info!("Connecting to: {}", next_url);
            let body = match (&payload, &headers) {
                (Some(p), Some(h)) => self.http.post(&next_url, h, p.clone()).await,
                _ => self.http.get(&next_url, None).await,
            };
            let Ok(body) = body else {
                warn!("Fetch failed on page {}, returning partial results", page);
                break;
            };

            if first_markup.is_none() {
                first_markup = Some(body.clone());
            }
            let initial = first_markup.as_deref().unwrap_or_default();

            info!("Parsing page {}", page);
            let page_state = parse_page_state(&body);
            let items: Vec<Value> = state::listing_items(&page_state).to_vec();
            if items.is_empty() {
                info!("No listing items on page {}, stopping", page);
                break;
            }

            let page_records = self
                .parse_items(
                    &mut signatures,
                    &items,
                    &carried,
                    &check_in,
                    &check_out,
                    next_rank,
                )
                .await;
            if page_records.is_empty() {
                break;
            }
            // Rank carries across pages: next page starts where this one ended.
            next_rank += page_records.len() as u32;
            records.extend(page_records);

            let Some(sig) = signatures.resolve(&self.http, initial, &STAYS_SEARCH).await else {
                info!("Search operation signature unavailable, stopping");
                break;
            };

            let initial_state = state::deferred_state(initial);
            payload = build_search_payload(&initial_state, page, &sig);
            if payload.is_none() {
                info!("No next-page payload, stopping");
                break;
            }
            if headers.is_none() {
                headers = Some(api_headers(initial, &origin));
            }
            next_url = search_api_url(&sig);

            if let Some(limit) = config.page_limit {
                if page >= limit {
                    info!("Page limit {} reached", limit);
                    break;
                }
            }
            page += 1;
        }

        records
    }

    /// Extract one page's records, detail-enriching each listing. Skinny
    /// items carry no inline pricing and additionally get the live-pricing
    /// cycle.
    async fn parse_items(
        &self,
        signatures: &mut SignatureResolver,
        items: &[Value],
        carried: &CarriedParams,
        check_in: &str,
        check_out: &str,
        start_rank: u32,
    ) -> Vec<ListingRecord> {
        let enricher = DetailEnricher::new(&self.http);
        let pb = ProgressBar::new(items.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} listings")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        let mut records = Vec::with_capacity(items.len());
        for (offset, item) in items.iter().enumerate() {
            let url = room_url(&fields::listing_id(item), carried);
            let mut record = ListingRecord {
                check_in_date: check_in.to_string(),
                check_out_date: check_out.to_string(),
                rank: start_rank + offset as u32,
                label: fields::title(item),
                url: url.clone(),
                description: fields::description(item),
                currency: "USD".into(),
                price_per_night: fields::price_per_night(item),
                orig_price_per_night: fields::orig_price_per_night(item),
                total_price: fields::total_price(item),
                rating_score: fields::rating_score(item),
                rating_count: fields::rating_count(item),
                labels: fields::labels(item),
                image_url: fields::image_url(item),
                ..Default::default()
            };

            let with_price = fields::is_skinny(item);
            let data = enricher.enrich(signatures, &url, with_price).await;
            data.apply(&mut record);
            records.push(record);
            pb.inc(1);
        }
        pb.finish_and_clear();
        records
    }
}

#[async_trait]
impl Crawler for SearchCrawler {
    async fn execute(&self, config: &CrawlConfig) -> Vec<ListingRecord> {
        self.crawl(config).await
    }
}

/// A response body is either page markup or a raw API JSON body; tell them
/// apart by shape.
fn parse_page_state(body: &str) -> Value {
    if looks_like_html(body) {
        state::deferred_state(body)
    } else {
        serde_json::from_str(body).unwrap_or(Value::Null)
    }
}

fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start();
    head.get(..15)
        .map(|h| h.eq_ignore_ascii_case("<!doctype html>"))
        .unwrap_or(false)
        || head.starts_with('<')
}

/// Build the POST payload for the next page from the first page's bootstrap
/// state: the session's own variables, with the cursor advanced and the
/// already-hydrated listing ids skipped.
///
/// The cursor list is 0-indexed while the page counter starts at 1, so
/// indexing `pageCursors` with the current page number intentionally selects
/// the cursor for the page after it.
fn build_search_payload(initial_state: &Value, page: u32, sig: &str) -> Option<String> {
    let pagination = state::pagination(initial_state);
    if pagination.session_id.is_empty() {
        return None;
    }
    let cursor = pagination.page_cursors.get(page as usize)?;

    let skip_ids: Vec<String> = state::listing_items(initial_state)
        .iter()
        .map(fields::listing_id)
        .filter(|id| !id.is_empty())
        .collect();

    let mut variables = state::search_variables(initial_state).clone();
    if !variables.is_object() {
        return None;
    }
    for request_key in ["staysSearchRequest", "staysMapSearchRequestV2"] {
        let request = variables.get_mut(request_key)?.as_object_mut()?;
        request.insert("cursor".into(), json!(cursor));
        request.insert("skipHydrationListingIds".into(), json!(skip_ids));
    }

    let payload = json!({
        "operationName": "StaysSearch",
        "variables": variables,
        "extensions": {
            "persistedQuery": {"version": 1, "sha256Hash": sig}
        }
    });
    serde_json::to_string(&payload).ok()
}

fn search_api_url(sig: &str) -> String {
    format!(
        "{}/{}?operationName=StaysSearch&locale=en&currency=USD",
        API_BASE, sig
    )
}
