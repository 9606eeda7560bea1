//! Bootstrap-state extraction: the site ships its client initialization data
//! as JSON blobs embedded in the delivered markup — a deferred-state script
//! holding search results and pagination tokens, and an injector-instances
//! script holding API config and PDP query variables.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::json::{self, pluck};

const RESULTS_PATH: &[&str] = &["data", "presentation", "staysSearch", "results"];

/// Parse the deferred-state blob (`script[id^="data-deferred-state"]`) out of
/// page markup. `Null` when absent or malformed.
pub fn deferred_state(markup: &str) -> Value {
    script_json(markup, "script[id^=\"data-deferred-state\"]")
}

/// Parse the injector-instances blob (`#data-injector-instances`).
pub fn injector_instances(markup: &str) -> Value {
    script_json(markup, "script#data-injector-instances")
}

fn script_json(markup: &str, selector: &str) -> Value {
    let doc = Html::parse_document(markup);
    let Ok(sel) = Selector::parse(selector) else {
        return Value::Null;
    };
    doc.select(&sel)
        .next()
        .map(|tag| tag.text().collect::<String>())
        .and_then(|text| serde_json::from_str(text.trim()).ok())
        .unwrap_or(Value::Null)
}

/// The `src` of the first `<script>` tag whose path matches `pattern`
/// (case-insensitive). Route bundles are located this way.
pub fn script_src_matching(markup: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(&format!("(?i){}", pattern)).ok()?;
    let doc = Html::parse_document(markup);
    let sel = Selector::parse("script[src]").ok()?;
    doc.select(&sel)
        .filter_map(|tag| tag.value().attr("src"))
        .find(|src| re.is_match(src))
        .map(|src| src.to_string())
}

/// The `niobeMinimalClientData[0][1]` envelope wrapping search responses in
/// deferred state. API responses carry the same tree unwrapped; `search_root`
/// papers over the difference.
pub fn minimal_client_data(state: &Value) -> &Value {
    pluck(state, &["niobeMinimalClientData", "0", "1"])
}

fn search_root(state: &Value) -> &Value {
    if state.get("niobeMinimalClientData").is_some() {
        minimal_client_data(state)
    } else {
        state
    }
}

/// Search-result items from either a deferred-state tree or a raw API
/// response body.
pub fn listing_items(state: &Value) -> &[Value] {
    let root = search_root(state);
    json::arr_at(pluck(root, RESULTS_PATH), &["searchResults"])
}

/// The session's GraphQL-style variables, as delivered with the first page.
pub fn search_variables(state: &Value) -> &Value {
    pluck(search_root(state), &["variables"])
}

#[derive(Debug, Default)]
pub struct Pagination {
    pub page_cursors: Vec<String>,
    pub next_cursor: String,
    pub session_id: String,
}

/// Cursor list, next-page cursor, and federated search session token.
pub fn pagination(state: &Value) -> Pagination {
    let results = pluck(search_root(state), RESULTS_PATH);
    let page_cursors = json::arr_at(results, &["paginationInfo", "pageCursors"])
        .iter()
        .filter_map(|c| c.as_str().map(str::to_string))
        .collect();
    Pagination {
        page_cursors,
        next_cursor: json::str_at(results, &["paginationInfo", "nextPageCursor"]).to_string(),
        session_id: json::str_at(
            results,
            &[
                "loggingMetadata",
                "legacyLoggingContext",
                "federatedSearchSessionId",
            ],
        )
        .to_string(),
    }
}

/// The API key the upstream service expects on persisted-query calls, carried
/// in the injector bootstrap under the guest SPA layout config.
pub fn api_key(markup: &str) -> String {
    let injector = injector_instances(markup);
    json::str_at(
        &injector,
        &[
            "root > core-guest-spa",
            "0",
            "1",
            "layout-init",
            "api_config",
            "key",
        ],
    )
    .to_string()
}

/// The raw PDP variables literal from the injector client data: a string of
/// the form `StaysPdpSections:{...}`, returned with the prefix stripped.
pub fn pdp_variables(markup: &str) -> Value {
    let injector = injector_instances(markup);
    let literal = json::str_at(
        &injector,
        &[
            "root > core-guest-spa",
            "1",
            "1",
            "niobeMinimalClientData",
            "0",
            "0",
        ],
    );
    let stripped = literal.trim_start_matches("StaysPdpSections:");
    serde_json::from_str(stripped).unwrap_or(Value::Null)
}
