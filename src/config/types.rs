use serde::Deserialize;

/// Main configuration structure for Nhatot-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
    /// Ordered source-path -> column mapping; order drives schema and CSV
    /// column order alike.
    pub mapping: Vec<MappingEntry>,
}

/// Listing source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Fixed base listing URL for a single city
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Base URL template with a `{city}` placeholder, instantiated per city
    #[serde(rename = "base-url-template")]
    pub base_url_template: Option<String>,

    /// Cities to crawl, in order. When absent a single city is inferred
    /// from the trailing token of `base-url`.
    #[serde(default)]
    pub cities: Vec<String>,

    /// Detail API prefix; a detail fetch is `GET {gateway-base}{id}`
    #[serde(rename = "gateway-base")]
    pub gateway_base: String,

    /// User agent sent on every listing-page and gateway request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

/// Crawl loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// First listing page to visit
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// Number of listing pages to attempt per city
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Minimum interval between detail requests (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Optional CSV export path; when set, the table is dumped after a crawl
    #[serde(rename = "csv-path")]
    pub csv_path: Option<String>,
}

/// One entry of the declarative field mapping
#[derive(Debug, Clone, Deserialize)]
pub struct MappingEntry {
    /// Source path into the detail document: dotted (`ad.price`) or a
    /// `special:` directive (`special:latitude_longitude`)
    pub path: String,

    /// Destination column name in the `ads` table
    pub column: String,
}

fn default_start_page() -> u32 {
    1
}

fn default_request_delay_ms() -> u64 {
    2000
}

impl Config {
    /// Resolves the ordered city list.
    ///
    /// Explicit `cities` wins; otherwise the trailing `-token` of `base-url`
    /// names a single city, defaulting to `ha-noi` when nothing is usable.
    pub fn resolved_cities(&self) -> Vec<String> {
        if !self.source.cities.is_empty() {
            return self.source.cities.clone();
        }
        let inferred = self
            .source
            .base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .and_then(|u| u.rsplit('-').next())
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        vec![inferred.unwrap_or_else(|| "ha-noi".to_string())]
    }

    /// Builds the listing base URL for one city.
    ///
    /// Uses `base-url-template` with `{city}` substitution when configured;
    /// otherwise falls back to textually replacing the default city marker
    /// in `base-url` (compatibility path for single-city configurations).
    pub fn city_base_url(&self, city: &str) -> String {
        let template = self
            .source
            .base_url_template
            .as_deref()
            .or(self.source.base_url.as_deref())
            .unwrap_or_default();
        if template.contains("{city}") {
            template.replace("{city}", city)
        } else {
            template.replace("ha-noi", city)
        }
    }
}
