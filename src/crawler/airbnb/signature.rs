//! Operation-signature discovery.
//!
//! Persisted-query calls are identified by an opaque hash the site never
//! documents; it only appears inside delivered route bundles, bound to the
//! operation name. Discovery is regex-scraping of minified scripts — an
//! upstream implementation detail kept behind this one narrow interface so a
//! layout change touches nothing else. Failures are absences, never errors.

use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, warn};

use super::state;
use crate::http::HttpClient;

/// A named operation and the route-bundle path that carries its signature.
pub struct Operation {
    pub name: &'static str,
    pub bundle_pattern: &'static str,
}

pub const STAYS_SEARCH: Operation = Operation {
    name: "StaysSearch",
    bundle_pattern: r"web/common/frontend/stays-search/routes/StaysSearchRoute/StaysSearchRoute\.prepare",
};

pub const STAYS_PDP_SECTIONS: Operation = Operation {
    name: "StaysPdpSections",
    bundle_pattern: r"web/common/frontend/gp-stays-pdp-route/routes/PdpPlatformRoute\.prepare",
};

pub const STAY_CHECKOUT_NAME: &str = "stayCheckout";

const ASYNC_REQUIRE_PATTERN: &str = r"web/en/frontend/airmetro/src/browser/asyncRequire";
const CHECKOUT_ROUTE_PATTERN: &str =
    r"common/frontend/gp-stays-checkout-route/routes/StaysCheckoutRoute/StaysCheckoutCreateRoute\.[0-9a-zA-Z]+\.js";
const STATIC_PACKAGES_BASE: &str = "https://a0.muscache.com/airbnb/static/packages/web";

/// Per-session signature cache. An operation name is resolved at most once per
/// session; every later request reuses the cached value.
#[derive(Default)]
pub struct SignatureResolver {
    cache: HashMap<&'static str, String>,
}

impl SignatureResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, name: &str) -> Option<&str> {
        self.cache.get(name).map(String::as_str)
    }

    /// Resolve a one-hop operation: locate the route bundle referenced by the
    /// page markup, fetch it, and scan for the operation-id literal.
    pub async fn resolve(
        &mut self,
        http: &HttpClient,
        markup: &str,
        op: &Operation,
    ) -> Option<String> {
        if let Some(sig) = self.cache.get(op.name) {
            return Some(sig.clone());
        }
        let src = state::script_src_matching(markup, op.bundle_pattern)?;
        debug!("Resolving {} signature from {}", op.name, src);
        let bundle = http.get(&src, None).await.ok()?;
        let sig = scan_operation_id(&bundle, op.name)?;
        self.cache.insert(op.name, sig.clone());
        Some(sig)
    }

    /// Resolve the checkout/pricing operation. Its signature lives two hops
    /// away: the asyncRequire bootstrap bundle names the checkout route
    /// bundle, which is then fetched from the static CDN and scanned.
    pub async fn resolve_checkout(&mut self, http: &HttpClient, markup: &str) -> Option<String> {
        if let Some(sig) = self.cache.get(STAY_CHECKOUT_NAME) {
            return Some(sig.clone());
        }
        let src = state::script_src_matching(markup, ASYNC_REQUIRE_PATTERN)?;
        let bootstrap = http.get(&src, None).await.ok()?;

        let route_re = Regex::new(CHECKOUT_ROUTE_PATTERN).ok()?;
        let Some(path) = route_re.find(&bootstrap) else {
            warn!("Checkout route bundle not referenced by asyncRequire bootstrap");
            return None;
        };
        let bundle_url = format!("{}/{}", STATIC_PACKAGES_BASE, path.as_str());
        let bundle = http.get(&bundle_url, None).await.ok()?;
        let sig = scan_operation_id(&bundle, STAY_CHECKOUT_NAME)?;
        self.cache.insert(STAY_CHECKOUT_NAME, sig.clone());
        Some(sig)
    }
}

/// Scan minified bundle text for `'<op>',type:'query',operationId:'<id>'`.
pub fn scan_operation_id(bundle: &str, op_name: &str) -> Option<String> {
    let re = Regex::new(&format!(
        r"'{}',type:'query',operationId:'([0-9a-zA-Z]+)'",
        regex::escape(op_name)
    ))
    .ok()?;
    re.captures(bundle)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
