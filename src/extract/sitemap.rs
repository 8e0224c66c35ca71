//! Sitemap parsing (XML `urlset` and plain-text sitemaps)

use crate::model::{Assertion, Link, LinkLocation, SitemapSource, UrlRole};

/// Sitemap flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    Xml,
    Txt,
}

impl SitemapKind {
    /// `.txt` sitemaps are line based, everything else is XML
    pub fn from_url(url: &str) -> Self {
        let path = url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        if path.to_ascii_lowercase().ends_with(".txt") {
            SitemapKind::Txt
        } else {
            SitemapKind::Xml
        }
    }
}

/// Lists the entries of a sitemap as raw, unresolved links
///
/// Every entry is a `document` link with a `permanent` assertion. The location
/// carries `source` so diagnostics can point at the sitemap file.
///
/// # Errors
///
/// Returns the XML parser error for a malformed XML sitemap.
pub fn urls_from_sitemap(
    contents: &str,
    kind: SitemapKind,
    source: SitemapSource,
) -> Result<Vec<Link>, roxmltree::Error> {
    let entry = |url: String, location: LinkLocation| Link {
        url,
        role: UrlRole::Document,
        asserts: vec![Assertion::Permanent],
        location,
    };

    match kind {
        SitemapKind::Txt => Ok(contents
            .split('\n')
            .enumerate()
            .map(|(index, line)| (index, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(index, line)| {
                entry(
                    line.to_string(),
                    LinkLocation::SitemapTxt {
                        sitemap: source.clone(),
                        index,
                    },
                )
            })
            .collect()),
        SitemapKind::Xml => {
            let document = parse_xml(contents)?;
            let root = document.root_element();
            if root.tag_name().name() != "urlset" {
                return Ok(Vec::new());
            }

            let locs = root
                .children()
                .filter(|node| is_named(node, "url"))
                .enumerate()
                .flat_map(|(urlset_index, url)| {
                    url.children()
                        .filter(|node| is_named(node, "loc"))
                        .map(move |loc| (urlset_index, node_text(&loc)))
                });

            Ok(locs
                .enumerate()
                .map(|(url_index, (urlset_index, loc))| {
                    entry(
                        loc,
                        LinkLocation::SitemapXml {
                            sitemap: source.clone(),
                            urlset_index,
                            url_index,
                        },
                    )
                })
                .collect())
        }
    }
}

/// Parses an XML document, accepting a DOCTYPE declaration
///
/// Feeds such as RSS 0.91 and some generated sitemaps declare one.
pub(crate) fn parse_xml(text: &str) -> Result<roxmltree::Document<'_>, roxmltree::Error> {
    roxmltree::Document::parse_with_options(
        text,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        },
    )
}

/// Matches an element by local name, ignoring its namespace
pub(crate) fn is_named(node: &roxmltree::Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Trimmed text content of an element
pub(crate) fn node_text(node: &roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SitemapSource {
        SitemapSource::Url("https://example.com/sitemap.xml".to_string())
    }

    #[test]
    fn test_xml_sitemap() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>
    https://example.com/a.html
  </loc><lastmod>2024-01-01</lastmod></url>
</urlset>"#;
        let links = urls_from_sitemap(xml, SitemapKind::Xml, source()).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].url, "https://example.com/a.html");
        assert_eq!(links[1].role, UrlRole::Document);
        assert_eq!(links[1].asserts, vec![Assertion::Permanent]);
        assert_eq!(
            links[1].location,
            LinkLocation::SitemapXml {
                sitemap: source(),
                urlset_index: 1,
                url_index: 1
            }
        );
    }

    #[test]
    fn test_txt_sitemap_skips_blank_lines() {
        let links = urls_from_sitemap(
            "https://example.com/\n\n  https://example.com/b.html  \n",
            SitemapKind::Txt,
            SitemapSource::ExtraSitemap(0),
        )
        .unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].url, "https://example.com/b.html");
        assert_eq!(
            links[1].location,
            LinkLocation::SitemapTxt {
                sitemap: SitemapSource::ExtraSitemap(0),
                index: 2
            }
        );
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(urls_from_sitemap("<urlset><url>", SitemapKind::Xml, source()).is_err());
    }

    #[test]
    fn test_xml_sitemap_with_doctype() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE urlset>
<urlset><url><loc>https://example.com/a.html</loc></url></urlset>"#;
        let links = urls_from_sitemap(xml, SitemapKind::Xml, source()).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/a.html");
    }

    #[test]
    fn test_kind_from_url() {
        assert_eq!(SitemapKind::from_url("https://example.com/sitemap.txt"), SitemapKind::Txt);
        assert_eq!(SitemapKind::from_url("https://example.com/sitemap.xml"), SitemapKind::Xml);
        assert_eq!(SitemapKind::from_url("https://example.com/sitemap"), SitemapKind::Xml);
    }
}
