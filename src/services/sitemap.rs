// src/services/sitemap.rs

//! Sitemap acquisition and decoding.
//!
//! Reads a `<urlset>` document either over HTTP or from a local file and
//! turns it into an ordered list of [`SitemapEntry`] values.

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, SitemapEntry};
use crate::utils::{http, is_remote};

/// Load and decode the sitemap named by `source`.
///
/// `source` is fetched when it starts with `http`, otherwise read from disk.
pub async fn load_sitemap(
    client: &Client,
    config: &CrawlerConfig,
    source: &str,
) -> Result<Vec<SitemapEntry>> {
    let xml = if is_remote(source) {
        log::info!("Fetching sitemap {}", source);
        let response = http::get_with_retry(client, source, config).await?;
        let response = http::ensure_success(response, source)?;
        response.text().await?
    } else {
        log::info!("Reading sitemap {}", source);
        let bytes = tokio::fs::read(source).await?;
        String::from_utf8_lossy(&bytes).into_owned()
    };

    let entries = parse_sitemap(&xml)?;
    log::info!("Sitemap lists {} page(s)", entries.len());
    Ok(entries)
}

#[derive(Clone, Copy)]
enum Field {
    Loc,
    Lastmod,
}

/// Decode a sitemap document.
///
/// Decoding is lenient: end tags are not matched up, namespace prefixes
/// are ignored, unknown entities are kept verbatim and unknown elements are
/// skipped. The root element must still be `urlset`, and the document must
/// reach its closing `</urlset>`.
pub fn parse_sitemap(xml: &str) -> Result<Vec<SitemapEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;

    let mut entries = Vec::new();
    let mut root_seen = false;
    let mut root_closed = false;
    let mut in_url = false;
    let mut field: Option<Field> = None;
    let mut loc = String::new();
    let mut lastmod = String::new();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            AppError::sitemap(format!(
                "malformed XML at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) if !root_seen => {
                let name = e.local_name();
                if name.as_ref() != b"urlset" {
                    return Err(AppError::sitemap(format!(
                        "expected <urlset> root element, found <{}>",
                        String::from_utf8_lossy(name.as_ref())
                    )));
                }
                root_seen = true;
                if matches!(event, Event::Empty(_)) {
                    root_closed = true;
                    break;
                }
            }
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"url" => {
                    in_url = true;
                    loc.clear();
                    lastmod.clear();
                }
                b"loc" if in_url => field = Some(Field::Loc),
                b"lastmod" if in_url => field = Some(Field::Lastmod),
                _ => {}
            },
            Event::Empty(ref e) => {
                if e.local_name().as_ref() == b"url" && !in_url {
                    entries.push(SitemapEntry::default());
                }
            }
            Event::Text(ref e) => {
                if let Some(f) = field {
                    let text = unescape_lenient(&String::from_utf8_lossy(e));
                    push_text(f, &text, &mut loc, &mut lastmod);
                }
            }
            Event::CData(ref e) => {
                if let Some(f) = field {
                    push_text(f, &String::from_utf8_lossy(e), &mut loc, &mut lastmod);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"loc" | b"lastmod" => field = None,
                b"url" if in_url => {
                    let lastmod = lastmod.trim();
                    entries.push(SitemapEntry::new(
                        loc.trim(),
                        (!lastmod.is_empty()).then(|| lastmod.to_string()),
                    ));
                    in_url = false;
                    field = None;
                }
                b"urlset" if !in_url => {
                    root_closed = true;
                    break;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        return Err(AppError::sitemap("document has no <urlset> root element"));
    }
    if !root_closed {
        return Err(AppError::sitemap(format!(
            "unexpected end of document after {} entries",
            entries.len()
        )));
    }
    Ok(entries)
}

/// Resolve predefined and numeric character references in `raw`.
///
/// Anything that is not a valid reference, such as `&nbsp;` or a bare `&`,
/// is copied through unchanged.
fn unescape_lenient(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let resolved = after
            .find(';')
            .and_then(|end| resolve_reference(&after[..end]).map(|c| (c, end)));
        match resolved {
            Some((c, end)) => {
                out.push_str(&c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(name: &str) -> Option<String> {
    let Some(number) = name.strip_prefix('#') else {
        return resolve_predefined_entity(name).map(str::to_string);
    };
    let (digits, radix) = match number.strip_prefix('x') {
        Some(hex) => (hex, 16),
        None => (number, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
}

fn push_text(field: Field, text: &str, loc: &mut String, lastmod: &mut String) {
    match field {
        Field::Loc => loc.push_str(text),
        Field::Lastmod => lastmod.push_str(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xsi:schemaLocation="http://www.sitemaps.org/schemas/sitemap/0.9 http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd">
  <url>
    <loc>https://geoscan.nrcan.gc.ca/starweb/geoscan/servlet.starweb?path=geoscan/fulle.web&amp;search1=R=100001</loc>
    <lastmod>2010-01-25</lastmod>
  </url>
  <url>
    <loc>https://geoscan.nrcan.gc.ca/starweb/geoscan/servlet.starweb?path=geoscan/fulle.web&amp;search1=R=100002</loc>
  </url>
</urlset>"#;

    fn test_config() -> CrawlerConfig {
        CrawlerConfig {
            retry_backoff_ms: 0,
            ..CrawlerConfig::default()
        }
    }

    #[test]
    fn test_parse_entries_in_order() {
        let entries = parse_sitemap(SITEMAP).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].loc,
            "https://geoscan.nrcan.gc.ca/starweb/geoscan/servlet.starweb?path=geoscan/fulle.web&search1=R=100001"
        );
        assert_eq!(entries[0].lastmod.as_deref(), Some("2010-01-25"));
        assert!(entries[1].loc.ends_with("R=100002"));
        assert_eq!(entries[1].lastmod, None);
    }

    #[test]
    fn test_parse_empty_urlset() {
        assert!(parse_sitemap("<urlset></urlset>").unwrap().is_empty());
        assert!(parse_sitemap("<urlset/>").unwrap().is_empty());
    }

    #[test]
    fn test_parse_is_lenient() {
        let xml = "<urlset><url><loc>https://a.example/?q=1&bogus;</loc></url>\
                   <url><loc><![CDATA[https://b.example/]]></loc><extra>x</extra></lastmod></url></urlset>";
        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].loc, "https://a.example/?q=1&bogus;");
        assert_eq!(entries[1].loc, "https://b.example/");
    }

    #[test]
    fn test_parse_resolves_known_entities_beside_unknown_ones() {
        let xml = "<urlset><url><loc>https://a/?x=1&amp;y=2&nbsp;</loc></url>\
                   <url><loc>https://b/?q=&#38;&#x26;&amp&bogus;&#xZZ;</loc></url></urlset>";
        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries[0].loc, "https://a/?x=1&y=2&nbsp;");
        assert_eq!(entries[1].loc, "https://b/?q=&&&amp&bogus;&#xZZ;");
    }

    #[test]
    fn test_parse_rejects_truncated_document() {
        let truncated = [
            "<urlset><url><loc>https://a/</loc></url><url><loc>https://b/",
            "<urlset><url><loc>https://a/</loc></url>",
            "<urlset>",
        ];
        for xml in truncated {
            assert!(
                matches!(parse_sitemap(xml), Err(AppError::Sitemap(_))),
                "accepted {xml:?}"
            );
        }
    }

    #[test]
    fn test_parse_prefixed_names() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sm:url><sm:loc>https://a.example/</sm:loc></sm:url></sm:urlset>"#;
        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries, vec![SitemapEntry::new("https://a.example/", None)]);
    }

    #[test]
    fn test_parse_rejects_wrong_root() {
        let err = parse_sitemap("<sitemapindex><sitemap/></sitemapindex>").unwrap_err();
        assert!(matches!(err, AppError::Sitemap(_)));
    }

    #[test]
    fn test_parse_rejects_empty_document() {
        assert!(matches!(parse_sitemap(""), Err(AppError::Sitemap(_))));
        assert!(matches!(parse_sitemap("not xml at all"), Err(AppError::Sitemap(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("sitemap.xml");
        std::fs::write(&file, SITEMAP).unwrap();

        let config = test_config();
        let client = http::create_client(&config).unwrap();
        let entries = load_sitemap(&client, &config, file.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let config = test_config();
        let client = http::create_client(&config).unwrap();
        let err = load_sitemap(&client, &config, "/nonexistent/sitemap.xml")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[tokio::test]
    async fn test_load_from_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SITEMAP))
            .mount(&server)
            .await;

        let config = test_config();
        let client = http::create_client(&config).unwrap();
        let source = format!("{}/sitemap.xml", server.uri());
        let entries = load_sitemap(&client, &config, &source).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_load_error_status_aborts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let config = test_config();
        let client = http::create_client(&config).unwrap();
        let source = format!("{}/sitemap.xml", server.uri());
        let err = load_sitemap(&client, &config, &source).await.unwrap_err();
        assert!(matches!(err, AppError::Status { status: 403, .. }));
    }
}
