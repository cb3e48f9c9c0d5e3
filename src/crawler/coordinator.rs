//! Crawl coordinator - the city/page/id state machine
//!
//! Drives the whole pipeline strictly sequentially: for each configured
//! city, walk listing pages in ascending order until one yields no ads,
//! and for each discovered id skip it if already stored, otherwise fetch,
//! normalize, and upsert. Per-item failures are logged and skipped; storage
//! failures propagate and fail the run loudly.

use crate::config::Config;
use crate::crawler::discovery::{discover, HttpRenderer, PageRenderer};
use crate::crawler::fetcher::{build_http_client, DetailFetcher};
use crate::normalize::normalize;
use crate::schema::{infer_schema, InferredSchema};
use crate::storage::AdStore;
use crate::Result;
use std::time::Duration;

/// Summary of a completed crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlReport {
    /// Cities the run iterated over
    pub cities_processed: u32,
    /// New ads persisted during this run
    pub total_saved: u64,
}

/// Main crawl coordinator
pub struct Coordinator<R: PageRenderer> {
    config: Config,
    schema: InferredSchema,
    store: AdStore,
    renderer: R,
    fetcher: DetailFetcher,
}

impl Coordinator<HttpRenderer> {
    /// Creates a coordinator with the production HTTP renderer
    ///
    /// Infers the schema from the mapping and ensures the `ads` table exists
    /// before any crawling; a schema or storage failure here terminates the
    /// run before the first request.
    pub fn new(config: Config) -> Result<Self> {
        let client = build_http_client(&config.source.user_agent)?;
        let renderer = HttpRenderer::new(client.clone());
        Self::with_renderer(config, renderer, client)
    }
}

impl<R: PageRenderer> Coordinator<R> {
    /// Creates a coordinator with an injected page renderer
    pub fn with_renderer(config: Config, renderer: R, client: reqwest::Client) -> Result<Self> {
        let schema = infer_schema(&config.mapping);
        let store = AdStore::new(&config.output.database_path);
        store.ensure_schema(&schema)?;

        let fetcher = DetailFetcher::new(client, config.source.gateway_base.clone());

        Ok(Self {
            config,
            schema,
            store,
            renderer,
            fetcher,
        })
    }

    /// Runs the crawl to completion
    pub async fn run(&self) -> Result<CrawlReport> {
        let cities = self.config.resolved_cities();
        let start_page = self.config.crawl.start_page;
        let max_pages = self.config.crawl.max_pages;
        let delay = Duration::from_millis(self.config.crawl.request_delay_ms);

        let mut total_saved: u64 = 0;

        for city in &cities {
            let city_base = self.config.city_base_url(city);
            tracing::info!("=== Crawling city {} ===", city);

            for page in start_page..start_page + max_pages {
                tracing::info!("=== Crawling page {} ===", page);

                let ad_ids = discover(&self.renderer, &city_base, page).await;

                // Empty page means end of results for this city. A failed
                // render looks identical and also stops the city.
                if ad_ids.is_empty() {
                    tracing::warn!(
                        "No ads found on page {} for city {} - stopping city",
                        page,
                        city
                    );
                    break;
                }

                let page_total = ad_ids.len();
                for (i, ad_id) in ad_ids.iter().copied().enumerate() {
                    if let Some(saved) = self.process_ad(ad_id).await? {
                        if saved {
                            total_saved += 1;
                            tracing::info!("Saved ad {} ({}/{})", ad_id, i + 1, page_total);
                        }
                    }
                    tokio::time::sleep(delay).await;
                }

                tracing::info!(
                    "Finished page {} for city {}. Total saved so far: {}",
                    page,
                    city,
                    total_saved
                );
            }
        }

        tracing::info!("All cities finished. Total saved: {}", total_saved);

        Ok(CrawlReport {
            cities_processed: cities.len() as u32,
            total_saved,
        })
    }

    /// Processes a single discovered id
    ///
    /// Returns `Ok(Some(true))` when a new row was saved, `Ok(Some(false))`
    /// when the fetch failed (logged, non-fatal), `Ok(None)` when the ad was
    /// already stored. Storage errors on upsert propagate.
    async fn process_ad(&self, ad_id: u64) -> Result<Option<bool>> {
        // A failed existence check is treated as "never seen": re-fetching
        // is safe, silently dropping an item is not.
        let seen = match self.store.exists(ad_id) {
            Ok(seen) => seen,
            Err(e) => {
                tracing::warn!("Existence check failed for ad {}: {} - re-fetching", ad_id, e);
                false
            }
        };
        if seen {
            tracing::info!("Skip ad {} (already stored)", ad_id);
            return Ok(None);
        }

        match self.fetcher.fetch_detail(ad_id).await {
            Some(doc) => {
                let row = normalize(&doc, ad_id, &self.config.mapping, &self.schema);
                self.store.upsert(&row)?;
                Ok(Some(true))
            }
            None => {
                tracing::error!("Failed to fetch detail for ad {}", ad_id);
                Ok(Some(false))
            }
        }
    }
}
