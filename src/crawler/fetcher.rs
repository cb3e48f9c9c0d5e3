//! Detail fetcher: ad identifier -> raw JSON document
//!
//! The detail API is a boundary: a single GET against the configured
//! gateway. Any transport error, non-2xx status, or undecodable body is a
//! per-item failure that is logged and reported as `None`; it never aborts
//! the crawl.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Builds the shared HTTP client with the configured user agent
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches detail documents from the gateway API
pub struct DetailFetcher {
    client: Client,
    gateway_base: String,
}

impl DetailFetcher {
    pub fn new(client: Client, gateway_base: impl Into<String>) -> Self {
        Self {
            client,
            gateway_base: gateway_base.into(),
        }
    }

    /// Fetches the raw detail document for one ad
    ///
    /// A detail fetch is `GET {gateway_base}{id}`; failures yield `None`.
    pub async fn fetch_detail(&self, ad_id: u64) -> Option<Value> {
        let url = format!("{}{}", self.gateway_base, ad_id);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::info!("Error fetching ad {}: {}", ad_id, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::info!("Error fetching ad {}: HTTP {}", ad_id, response.status());
            return None;
        }

        match response.json::<Value>().await {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::info!("Undecodable detail body for ad {}: {}", ad_id, e);
                None
            }
        }
    }
}
