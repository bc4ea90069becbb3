// src/pipeline/crawl.rs

//! Sitemap crawling pipeline.

use std::io::Write;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;

use crate::error::Result;
use crate::models::Config;
use crate::services::{Emitter, TableExtractor, load_sitemap};
use crate::storage::PageCache;

/// Statistics for one crawl run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub page_count: usize,
    pub cache_hits: usize,
    pub bytes_read: usize,
}

/// Run the crawler: sitemap, then fetch, extract and emit each page in turn.
///
/// Records are written to `out` in sitemap order. The first error stops the
/// run; nothing is written for the failing page or any page after it.
pub async fn run_crawler<W: Write>(
    config: &Config,
    client: &Client,
    out: W,
) -> Result<CrawlStats> {
    let start_time = Utc::now();

    let entries = load_sitemap(client, &config.crawler, &config.sitemap).await?;
    let cache = PageCache::new(&config.cache_dir);
    let extractor = TableExtractor::new()?;
    let mut emitter = Emitter::new(out);

    let mut cache_hits = 0;
    let mut bytes_read = 0;

    for entry in &entries {
        let page = cache.fetch(client, &config.crawler, &entry.loc).await?;
        log::info!("[{}] {}", page.bytes.len(), entry.loc);
        if let Some(lastmod) = &entry.lastmod {
            log::debug!("{} last modified {}", entry.loc, lastmod);
        }

        if page.cache_hit {
            cache_hits += 1;
        }
        bytes_read += page.bytes.len();

        let record = extractor.extract_str(&String::from_utf8_lossy(&page.bytes));
        emitter.emit(&record)?;
    }

    let stats = CrawlStats {
        start_time,
        end_time: Utc::now(),
        page_count: emitter.emitted(),
        cache_hits,
        bytes_read,
    };

    log::info!(
        "Crawled {} page(s), {} from cache, {} bytes in {} ms",
        stats.page_count,
        stats.cache_hits,
        stats.bytes_read,
        (stats.end_time - stats.start_time).num_milliseconds()
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_empty_sitemap_emits_nothing() {
        let tmp = TempDir::new().unwrap();
        let sitemap = tmp.path().join("sitemap.xml");
        std::fs::write(&sitemap, "<urlset></urlset>").unwrap();

        let config = Config {
            sitemap: sitemap.to_string_lossy().into_owned(),
            cache_dir: tmp.path().join("cache"),
            ..Config::default()
        };
        let client = crate::utils::http::create_client(&config.crawler).unwrap();

        let mut out = Vec::new();
        let stats = run_crawler(&config, &client, &mut out).await.unwrap();

        assert!(out.is_empty());
        assert_eq!(stats.page_count, 0);
        assert!(!config.cache_dir.exists());
    }
}
