//! Link extraction
//!
//! Given a found resource and the role it was fetched as, [`extract_links`]
//! returns the outgoing links the crawler follows. The functions here are
//! synchronous and read from disk; the crawler runs them on blocking threads.

pub mod css;
pub mod extras;
pub mod feeds;
pub mod html;
pub mod json;
pub mod redirect;
pub mod sitemap;
pub mod srcset;

use crate::model::{FoundFetchResult, Link, LinkLocation, SitemapSource, UrlRole};
use crate::robots::sitemap_links;
use crate::{Result, ValidatorError};
use html::PageElements;
use sitemap::SitemapKind;
use std::path::Path;
use url::Url;

pub use extras::{extra_links, extra_seeds};
pub use redirect::{get_redirect, get_redirect_in};

/// Reads a file as text, replacing invalid UTF-8 sequences
pub(crate) fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| ValidatorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Lists the outgoing links of a resource fetched under `role`
///
/// The first matching rule wins:
///
/// 1. a redirect yields a single link to its target, with the same role
/// 2. `robotstxt`, `sitemap`, `rss`, `atom` and `json` roles parse their format
/// 3. the `document` role or an HTML content type parses the page
/// 4. a `text/css` content type parses the stylesheet
///
/// Anything else has no links. Every URL is resolved against the resource URL;
/// fragments are kept so hash targets can be checked.
///
/// A malformed sitemap, feed or JSON file yields no links and a warning. The
/// validator reports the parse error for the file itself.
///
/// # Errors
///
/// Fails on I/O errors, on a page with several meta refresh tags and on
/// JMESPath queries that do not compile.
pub fn extract_links(role: &UrlRole, res: &FoundFetchResult) -> Result<Vec<Link>> {
    let links = links_for_role(role, res)?;
    let Ok(resource_url) = Url::parse(&res.url) else {
        return Ok(links);
    };

    Ok(links
        .into_iter()
        .map(|mut link| {
            if let Ok(resolved) = resource_url.join(&link.url) {
                link.url = resolved.to_string();
            }
            link
        })
        .collect())
}

fn links_for_role(role: &UrlRole, res: &FoundFetchResult) -> Result<Vec<Link>> {
    let content_type = res.content_type();
    let is_html = content_type.as_deref() == Some("text/html");

    // Parsed at most once, shared by redirect detection and link extraction
    let page = if is_html || *role == UrlRole::Document {
        Some(PageElements::load(&res.data.path)?)
    } else {
        None
    };

    let redirect = match &page {
        Some(page) => get_redirect_in(res, page)?,
        None => get_redirect(res)?,
    };
    if let Some(target) = redirect {
        tracing::debug!("{} redirects to {}", res.url, target);
        return Ok(vec![Link {
            url: target,
            role: role.clone(),
            asserts: vec![],
            location: LinkLocation::Redirect,
        }]);
    }

    match role {
        UrlRole::RobotsTxt => Ok(sitemap_links(&read_text(&res.data.path)?)),
        UrlRole::Sitemap => {
            let contents = read_text(&res.data.path)?;
            let kind = SitemapKind::from_url(&res.url);
            let source = SitemapSource::Url(res.url.clone());
            Ok(sitemap::urls_from_sitemap(&contents, kind, source)
                .unwrap_or_else(|e| warn_unparseable(&res.url, "sitemap", e)))
        }
        UrlRole::Rss => {
            let contents = read_text(&res.data.path)?;
            Ok(feeds::rss_links(&res.url, &contents)
                .unwrap_or_else(|e| warn_unparseable(&res.url, "RSS feed", e)))
        }
        UrlRole::Atom => {
            let contents = read_text(&res.data.path)?;
            Ok(feeds::atom_links(&res.url, &contents)
                .unwrap_or_else(|e| warn_unparseable(&res.url, "Atom feed", e)))
        }
        UrlRole::Json { extract_configs } => {
            let contents = read_text(&res.data.path)?;
            match serde_json::from_str::<serde_json::Value>(&contents) {
                Ok(value) => json::json_links(&res.url, &value, extract_configs),
                Err(e) => Ok(warn_unparseable(&res.url, "JSON file", e)),
            }
        }
        _ => {
            if let Some(page) = &page {
                let page_url = parse_resource_url(&res.url)?;
                return Ok(html::html_links(&page_url, page));
            }
            if content_type.as_deref() == Some("text/css") {
                let page_url = parse_resource_url(&res.url)?;
                let contents = read_text(&res.data.path)?;
                return Ok(css::css_links(&page_url, &contents)
                    .unwrap_or_else(|e| warn_unparseable(&res.url, "stylesheet", e)));
            }
            Ok(Vec::new())
        }
    }
}

fn parse_resource_url(url: &str) -> Result<Url> {
    Ok(Url::parse(url)?)
}

fn warn_unparseable(url: &str, what: &str, error: impl std::fmt::Display) -> Vec<Link> {
    tracing::warn!("Could not parse {} {}: {}", what, url, error);
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assertion, FileData};
    use chrono::Utc;
    use std::fs;
    use tempfile::TempDir;

    fn found(dir: &TempDir, name: &str, contents: &str, headers: &[(&str, &str)]) -> FoundFetchResult {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        FoundFetchResult {
            url: format!("https://example.com/{}", name),
            status: 200,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            data: FileData {
                path,
                modified: Utc::now(),
            },
        }
    }

    #[test]
    fn test_redirect_wins_over_role() {
        let dir = TempDir::new().unwrap();
        let mut res = found(&dir, "old.xml", "<urlset/>", &[("location", "/new.xml")]);
        res.status = 308;

        let links = extract_links(&UrlRole::Sitemap, &res).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/new.xml");
        assert_eq!(links[0].role, UrlRole::Sitemap);
        assert_eq!(links[0].location, LinkLocation::Redirect);
    }

    #[test]
    fn test_sitemap_role() {
        let dir = TempDir::new().unwrap();
        let res = found(&dir, "sitemap.txt", "https://example.com/a.html\n/b.html\n", &[("content-type", "text/plain")]);

        let links = extract_links(&UrlRole::Sitemap, &res).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].url, "https://example.com/b.html");
        assert_eq!(links[0].asserts, vec![Assertion::Permanent]);
        assert_eq!(
            links[0].location,
            LinkLocation::SitemapTxt {
                sitemap: SitemapSource::Url("https://example.com/sitemap.txt".to_string()),
                index: 0
            }
        );
    }

    #[test]
    fn test_malformed_sitemap_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let res = found(&dir, "sitemap.xml", "<urlset><url>", &[("content-type", "application/xml")]);
        assert!(extract_links(&UrlRole::Sitemap, &res).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_feeds_and_json_yield_nothing() {
        let dir = TempDir::new().unwrap();

        let rss = found(&dir, "feed.rss", "<rss><channel><item>", &[("content-type", "application/rss+xml")]);
        assert_eq!(extract_links(&UrlRole::Rss, &rss).unwrap(), vec![]);

        let atom = found(&dir, "feed.atom", "<feed><entry>", &[("content-type", "application/atom+xml")]);
        assert_eq!(extract_links(&UrlRole::Atom, &atom).unwrap(), vec![]);

        let json = found(&dir, "api.json", "{ \"posts\": [", &[("content-type", "application/json")]);
        let role = UrlRole::Json {
            extract_configs: vec![crate::model::ExtractConfig {
                query: "posts[*].url".to_string(),
                asserts: vec![],
                role: UrlRole::Document,
            }],
        };
        assert_eq!(extract_links(&role, &json).unwrap(), vec![]);
    }

    #[test]
    fn test_feed_with_doctype_is_followed() {
        let dir = TempDir::new().unwrap();
        let rss = found(
            &dir,
            "feed.rss",
            r#"<?xml version="1.0"?><!DOCTYPE rss SYSTEM "http://my.netscape.com/publish/formats/rss-0.91.dtd"><rss version="0.91"><channel><item><link>/a.html</link></item></channel></rss>"#,
            &[("content-type", "application/rss+xml")],
        );
        let links = extract_links(&UrlRole::Rss, &rss).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/a.html");
    }

    #[test]
    fn test_html_sniffed_by_content_type() {
        let dir = TempDir::new().unwrap();
        let res = found(
            &dir,
            "page.html",
            r#"<html><body><a href="other.html">x</a></body></html>"#,
            &[("content-type", "text/html; charset=utf-8")],
        );

        let links = extract_links(&UrlRole::Asset, &res).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/other.html");
    }

    #[test]
    fn test_meta_refresh_redirect() {
        let dir = TempDir::new().unwrap();
        let res = found(
            &dir,
            "moved.html",
            r#"<html><head><meta http-equiv="refresh" content="0; url=/target.html"></head><body><a href="x.html">x</a></body></html>"#,
            &[("content-type", "text/html")],
        );

        let links = extract_links(&UrlRole::Document, &res).unwrap();
        assert_eq!(links.len(), 1);
        assert!(links[0].location.is_redirect());
        assert_eq!(links[0].url, "https://example.com/target.html");
    }

    #[test]
    fn test_stylesheet_and_other_assets() {
        let dir = TempDir::new().unwrap();
        let css = found(&dir, "site.css", "body { background: url(bg.png) }", &[("content-type", "text/css")]);
        assert_eq!(extract_links(&UrlRole::Stylesheet, &css).unwrap().len(), 1);

        let png = found(&dir, "bg.png", "not really a png", &[("content-type", "image/png")]);
        assert!(extract_links(&UrlRole::Asset, &png).unwrap().is_empty());
    }

    #[test]
    fn test_robots_role() {
        let dir = TempDir::new().unwrap();
        let res = found(
            &dir,
            "robots.txt",
            "User-agent: *\nSitemap: https://example.com/sitemap.xml\n",
            &[("content-type", "text/plain")],
        );
        let links = extract_links(&UrlRole::RobotsTxt, &res).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].role, UrlRole::Sitemap);
    }
}
