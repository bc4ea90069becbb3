// src/models/mod.rs

//! Domain models for geoscanr.

mod config;
mod record;
mod sitemap;

// Re-export all public types
pub use config::{Config, CrawlerConfig};
pub use record::{FieldValue, Link, Record};
pub use sitemap::SitemapEntry;
