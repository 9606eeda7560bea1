//! Thin HTTP wrapper: one GET for documents and bundles, one POST for
//! persisted-query API calls. No retries — a failed fetch is reported to the
//! caller, which treats it as a terminal pagination condition.

use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use thiserror::Error;
use tracing::warn;

const TIMEOUT_SECS: u64 = 30;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("unexpected status {0} for {1}")]
    Status(u16, String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// GET a URL. `headers: None` sends the default browser document headers.
    pub async fn get(&self, url: &str, headers: Option<&HeaderMap>) -> Result<String, HttpError> {
        let default_headers;
        let headers = match headers {
            Some(h) => h,
            None => {
                default_headers = document_headers();
                &default_headers
            }
        };

        let response = self.client.get(url).headers(headers.clone()).send().await?;
        let status = response.status();
        if !matches!(status.as_u16(), 200 | 201) {
            warn!("GET {} returned {}", url, status);
            return Err(HttpError::Status(status.as_u16(), url.to_string()));
        }
        Ok(response.text().await?)
    }

    /// POST a JSON body with the caller's headers.
    pub async fn post(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: String,
    ) -> Result<String, HttpError> {
        let response = self
            .client
            .post(url)
            .headers(headers.clone())
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !matches!(status.as_u16(), 200 | 201) {
            warn!("POST {} returned {}", url, status);
            return Err(HttpError::Status(status.as_u16(), url.to_string()));
        }
        Ok(response.text().await?)
    }
}

/// Header set for plain document fetches (search pages, room pages, bundles).
pub fn document_headers() -> HeaderMap {
    header_map(&[
        ("authority", "www.airbnb.com"),
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,\
             image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
        ),
        ("accept-language", "en-US,en;q=0.9"),
        ("cache-control", "max-age=0"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "same-origin"),
        ("sec-fetch-user", "?1"),
        ("upgrade-insecure-requests", "1"),
        ("user-agent", USER_AGENT),
        ("viewport-width", "1920"),
    ])
}

/// Build a `HeaderMap` from static pairs, skipping any invalid entry.
pub fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        if let (Ok(name), Ok(value)) = (HeaderName::from_str(name), HeaderValue::from_str(value)) {
            map.insert(name, value);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_skips_invalid_entries() {
        let map = header_map(&[("accept", "*/*"), ("bad name", "x"), ("x-key", "\nbroken")]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("accept").unwrap(), "*/*");
    }

    #[test]
    fn document_headers_identify_a_browser() {
        let map = document_headers();
        assert!(map
            .get("user-agent")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Mozilla"));
        assert_eq!(map.get("sec-fetch-dest").unwrap(), "document");
    }
}
