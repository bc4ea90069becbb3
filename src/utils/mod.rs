//! Utility functions and helpers.

pub mod http;

use sha1::{Digest, Sha1};

/// Hex SHA-1 digest of a URL, used as its cache file name.
pub fn cache_key(url: &str) -> String {
    hex::encode(Sha1::digest(url.as_bytes()))
}

/// Whether a sitemap source names a remote document rather than a file.
///
/// The check is purely syntactic: anything starting with `http`.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http")
}
