//! Service layer for geoscanr.
//!
//! This module contains the business logic for:
//! - Sitemap loading (`load_sitemap`)
//! - Record extraction (`TableExtractor`)
//! - JSON line output (`Emitter`)

mod emit;
mod extract;
mod sitemap;

pub use emit::Emitter;
pub use extract::TableExtractor;
pub use sitemap::{load_sitemap, parse_sitemap};
