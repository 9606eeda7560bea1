//! Site/page-type dispatch: an explicit registry instead of runtime name
//! construction, so an unsupported combination is a checked error.

use thiserror::Error;

use crate::crawler::airbnb::{detail::DetailCrawler, search::SearchCrawler};
use crate::crawler::Crawler;
use crate::http::HttpClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Search,
    Detail,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no crawler registered for site '{site}' page type {page_type:?}")]
    Unsupported { site: String, page_type: PageType },
}

/// Construct the crawler registered for `(site, page_type)`. `site` may be a
/// bare host or anything a URL host parses to; it is normalized before
/// lookup.
pub fn lookup(
    site: &str,
    page_type: PageType,
    http: HttpClient,
) -> Result<Box<dyn Crawler>, RegistryError> {
    match (normalize_site(site).as_str(), page_type) {
        ("airbnb.com", PageType::Search) => Ok(Box::new(SearchCrawler::new(http))),
        ("airbnb.com", PageType::Detail) => Ok(Box::new(DetailCrawler::new(http))),
        _ => Err(RegistryError::Unsupported {
            site: site.to_string(),
            page_type,
        }),
    }
}

fn normalize_site(site: &str) -> String {
    site.trim()
        .to_lowercase()
        .trim_start_matches("www.")
        .to_string()
}
