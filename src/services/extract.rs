// src/services/extract.rs

//! Table extractor service.
//!
//! Walks every table row of a record page and maps the row header to the
//! row's data. A few headers get special treatment:
//!
//! - `Download`: the link target of the cell's anchor, not its text
//! - `Links`: every row becomes a `{URL, Title}` entry, always present
//! - `Related`, `Program`: every row becomes "text href", present only if seen
//!
//! Any other header keeps the trimmed cell text of its last occurrence.
//! Other headers that carry links (DOIs, thumbnails) are not special-cased.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{FieldValue, Link, Record};

const DOWNLOAD: &str = "Download";
const LINKS: &str = "Links";
const RELATED: &str = "Related";
const PROGRAM: &str = "Program";

/// Extracts a [`Record`] from a page's table rows.
pub struct TableExtractor {
    row: Selector,
    header: Selector,
    cell: Selector,
    cell_link: Selector,
}

impl TableExtractor {
    /// Create a new extractor with its row selectors compiled.
    pub fn new() -> Result<Self> {
        Ok(Self {
            row: Self::parse_selector("tr")?,
            header: Self::parse_selector("th")?,
            cell: Self::parse_selector("td")?,
            cell_link: Self::parse_selector("td > a")?,
        })
    }

    /// Parse an HTML page and extract its record.
    pub fn extract_str(&self, html: &str) -> Record {
        self.extract(&Html::parse_document(html))
    }

    /// Extract the record from a parsed document.
    pub fn extract(&self, document: &Html) -> Record {
        let mut record = Record::new();
        let mut links = Vec::new();
        let mut related = Vec::new();
        let mut programs = Vec::new();

        for row in document.select(&self.row) {
            let key = Self::text_of(row, &self.header);
            let key = key.trim();

            match key {
                "" => continue,
                DOWNLOAD => record.insert(key, self.link_attr(row, "href")),
                LINKS => links.push(Link::new(
                    self.link_attr(row, "href"),
                    self.link_attr(row, "title"),
                )),
                RELATED => related.push(self.text_with_href(row)),
                PROGRAM => programs.push(self.text_with_href(row)),
                _ => record.insert(key, Self::text_of(row, &self.cell).trim()),
            }
        }

        record.insert(LINKS, FieldValue::Links(links));
        if !related.is_empty() {
            record.insert(RELATED, FieldValue::List(related));
        }
        if !programs.is_empty() {
            record.insert(PROGRAM, FieldValue::List(programs));
        }
        record
    }

    /// Concatenated text of every element matching `sel` inside `row`.
    fn text_of(row: ElementRef<'_>, sel: &Selector) -> String {
        row.select(sel).flat_map(|el| el.text()).collect()
    }

    /// Attribute of the first cell anchor in the row, or "" when missing.
    fn link_attr<'a>(&self, row: ElementRef<'a>, attr: &str) -> &'a str {
        row.select(&self.cell_link)
            .next()
            .and_then(|a| a.value().attr(attr))
            .unwrap_or("")
    }

    fn text_with_href(&self, row: ElementRef<'_>) -> String {
        let text = Self::text_of(row, &self.cell);
        let href = self.link_attr(row, "href");
        format!("{text} {href}").trim().to_string()
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}
