//! Pipeline entry points.
//!
//! - `run_crawler`: load the sitemap, then fetch, extract and emit each page

pub mod crawl;

pub use crawl::{CrawlStats, run_crawler};
