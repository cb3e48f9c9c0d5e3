//! Listing-page discovery: (city, page) -> set of ad identifiers
//!
//! Discovery composes an opaque "rendered HTML for a URL" capability with a
//! link-pattern scan. The rendering side is a boundary: production uses a
//! plain HTTP fetch with the configured user agent, tests inject whatever
//! they need. A failed render yields the empty set, which the orchestrator
//! treats as end of content for the city.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Listing links start with this path prefix
const LISTING_PREFIX: &str = "/mua-ban-";

/// Listing links end with this suffix
const LISTING_SUFFIX: &str = ".htm";

/// The injected page-fetch capability
///
/// Implementations return the rendered HTML for a URL, or `None` when the
/// page is unreachable or fails to render.
pub trait PageRenderer {
    fn render(&self, url: &str) -> impl std::future::Future<Output = Option<String>> + Send;
}

/// HTTP-backed renderer used in production
///
/// Headless-browser rendering is out of scope; a plain GET with a realistic
/// user agent stands in behind the same interface.
pub struct HttpRenderer {
    client: reqwest::Client,
}

impl HttpRenderer {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> Option<String> {
        match self.client.get(url).send().await {
            Ok(response) => {
                if !response.status().is_success() {
                    tracing::warn!("Listing page {} returned {}", url, response.status());
                    return None;
                }
                match response.text().await {
                    Ok(html) => Some(html),
                    Err(e) => {
                        tracing::warn!("Failed to read listing page {}: {}", url, e);
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch listing page {}: {}", url, e);
                None
            }
        }
    }
}

/// Discovers ad identifiers on one listing page
///
/// Returns the deduplicated set for that single page in discovery order;
/// cross-page deduplication is the orchestrator's job via the store.
pub async fn discover<R: PageRenderer>(renderer: &R, city_base: &str, page: u32) -> Vec<u64> {
    let url = format!("{}?page={}", city_base, page);
    match renderer.render(&url).await {
        Some(html) => scan_listing_ids(&html),
        None => Vec::new(),
    }
}

/// Scans rendered listing HTML for ad identifiers
///
/// Every hyperlink whose path starts with the listing prefix and ends with
/// the listing suffix contributes its trailing numeric token as an id;
/// non-numeric trailers are ignored, not errors.
pub fn scan_listing_ids(html: &str) -> Vec<u64> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(id) = parse_listing_id(href) {
            if seen.insert(id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Parses the trailing `-<digits>.htm` token out of a listing href
fn parse_listing_id(href: &str) -> Option<u64> {
    // Absolute links carry the same path pattern behind an origin
    let path = if href.starts_with("http://") || href.starts_with("https://") {
        Url::parse(href).ok()?.path().to_string()
    } else {
        href.to_string()
    };

    if !path.starts_with(LISTING_PREFIX) || !path.ends_with(LISTING_SUFFIX) {
        return None;
    }

    let stem = path.rsplit('/').next()?.strip_suffix(LISTING_SUFFIX)?;
    let trailing = stem.rsplit('-').next()?;
    trailing.parse().ok()
}
