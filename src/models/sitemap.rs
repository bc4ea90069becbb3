//! Sitemap entry data structure.

use serde::{Deserialize, Serialize};

/// One `<url>` element of a sitemap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SitemapEntry {
    /// Page URL from `<loc>`
    pub loc: String,

    /// Raw `<lastmod>` text, if present and non-empty
    pub lastmod: Option<String>,
}

impl SitemapEntry {
    pub fn new(loc: impl Into<String>, lastmod: Option<String>) -> Self {
        Self {
            loc: loc.into(),
            lastmod,
        }
    }
}
