//! Configuration module for Nhatot-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. The configuration carries the listing source (base URL or city
//! template), the detail gateway, crawl pacing, output paths, and the
//! declarative field mapping that drives both extraction and the table
//! schema.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, MappingEntry, OutputConfig, SourceConfig};

// Re-export parser functions
pub use parser::load_config;
