//! Storage for fetched pages.
//!
//! The cache directory is the only persistent state: one file per URL,
//! no index or manifest. See [`cache`] for the layout.

pub mod cache;

// Re-export for convenience
pub use cache::{CachedPage, PageCache};
