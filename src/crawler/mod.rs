pub mod airbnb;

use async_trait::async_trait;

use crate::config::CrawlConfig;
use crate::record::ListingRecord;

/// A page-type crawler for one site. `execute` is best-effort: it returns the
/// ordered records accumulated before any terminal condition, never an error
/// for upstream misbehavior.
#[async_trait]
pub trait Crawler: Send + Sync {
    async fn execute(&self, config: &CrawlConfig) -> Vec<ListingRecord>;
}
