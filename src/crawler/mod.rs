//! Crawler module: listing discovery, detail fetching, and orchestration
//!
//! The coordinator walks cities, pages, and ids strictly sequentially,
//! using the store's existence check as the only dedup and resumability
//! mechanism, with a fixed pacing delay after every processed id.

mod coordinator;
mod discovery;
mod fetcher;

pub use coordinator::{Coordinator, CrawlReport};
pub use discovery::{discover, scan_listing_ids, HttpRenderer, PageRenderer};
pub use fetcher::{build_http_client, DetailFetcher};

use crate::config::Config;
use crate::Result;

/// Runs a complete crawl with the production HTTP renderer
///
/// This is the main entry point for the binary: it ensures the schema,
/// walks every configured city, and reports how many new ads were saved.
pub async fn crawl(config: Config) -> Result<CrawlReport> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
