//! HTML parser for extracting the elements the validator cares about
//!
//! A page is parsed once into a [`PageElements`] snapshot that holds plain data
//! only, so it can be cached and moved between threads. Link extraction, hash
//! checks, canonical checks and image checks all work off that snapshot.

use crate::extract::srcset::parse_srcset;
use crate::model::{Assertion, ElementLocation, Link, LinkLocation, UrlRole};
use scraper::{ElementRef, Html};
use url::Url;

/// An element of interest with its attributes and location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub attrs: Vec<(String, String)>,
    pub element: ElementLocation,
    /// Concatenated text content (used for inline scripts)
    pub text: String,
}

impl TagInfo {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns a non-empty attribute value
    fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|value| !value.is_empty())
    }

    /// Whitespace-separated, lower-cased tokens of the `rel` attribute
    pub fn rel_tokens(&self) -> Vec<String> {
        self.attr("rel")
            .map(|rel| rel.split_whitespace().map(|t| t.to_ascii_lowercase()).collect())
            .unwrap_or_default()
    }

    pub fn location(&self) -> LinkLocation {
        LinkLocation::Html {
            element: self.element.clone(),
        }
    }
}

/// The interesting parts of a parsed HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageElements {
    pub links: Vec<TagInfo>,
    pub scripts: Vec<TagInfo>,
    pub metas: Vec<TagInfo>,
    pub imgs: Vec<TagInfo>,
    pub videos: Vec<TagInfo>,
    pub anchors: Vec<TagInfo>,
    /// Every element that carries an `id`, in document order
    pub ids: Vec<(String, ElementLocation)>,
}

impl PageElements {
    /// Parses an HTML document
    ///
    /// html5ever never fails; malformed markup is repaired the way browsers do it.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut page = PageElements::default();

        for node in document.root_element().descendants() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };

            let name = element.value().name();
            let bucket = match name {
                "link" => Some(&mut page.links),
                "script" => Some(&mut page.scripts),
                "meta" => Some(&mut page.metas),
                "img" => Some(&mut page.imgs),
                "video" => Some(&mut page.videos),
                "a" => Some(&mut page.anchors),
                _ => None,
            };
            let id = element.value().attr("id");

            if bucket.is_none() && id.is_none() {
                continue;
            }

            let location = ElementLocation {
                outer_html: element.html(),
                selector: element_selector(element),
            };

            if let Some(id) = id {
                page.ids.push((id.to_string(), location.clone()));
            }

            if let Some(bucket) = bucket {
                bucket.push(TagInfo {
                    attrs: element
                        .value()
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    element: location,
                    text: if name == "script" {
                        element.text().collect()
                    } else {
                        String::new()
                    },
                });
            }
        }

        page
    }

    /// Loads and parses an HTML file
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let html = super::read_text(path)?;
        Ok(Self::parse(&html))
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.ids.iter().any(|(existing, _)| existing == id)
    }

    /// `<link rel=canonical>` elements
    pub fn canonical_links(&self) -> Vec<&TagInfo> {
        self.links
            .iter()
            .filter(|link| link.rel_tokens().iter().any(|t| t == "canonical"))
            .collect()
    }

    /// `<script type=application/ld+json>` elements
    pub fn json_ld_scripts(&self) -> impl Iterator<Item = &TagInfo> {
        self.scripts.iter().filter(|script| {
            script
                .attr("type")
                .map(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
                .unwrap_or(false)
        })
    }

    /// `<meta http-equiv=refresh>` elements
    pub fn meta_refreshes(&self) -> Vec<&TagInfo> {
        self.metas
            .iter()
            .filter(|meta| {
                meta.attr("http-equiv")
                    .map(|v| v.trim().eq_ignore_ascii_case("refresh"))
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Builds a `tag:nth-of-type(n) > ...` chain from the root element down to `element`
fn element_selector(element: ElementRef) -> String {
    let mut parts = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        let name = el.value().name();
        let parent = el.parent().and_then(ElementRef::wrap);

        match parent {
            Some(_) => {
                let position = el
                    .prev_siblings()
                    .filter_map(ElementRef::wrap)
                    .filter(|sibling| sibling.value().name() == name)
                    .count()
                    + 1;
                parts.push(format!("{}:nth-of-type({})", name, position));
            }
            None => parts.push(name.to_string()),
        }

        current = parent;
    }

    parts.reverse();
    parts.join(" > ")
}

/// Extracts outbound links from a parsed HTML page
///
/// # Link Extraction Rules
///
/// - `<link href>`: `stylesheet` role for stylesheets, `atom`/`rss` for feed
///   alternates, image assertions for sized icons, `asset` otherwise; a `type`
///   attribute becomes a content-type assertion
/// - `<script src>`: asset
/// - `<meta property=og:image>`: asset, image and permanent
/// - `<img src>` and every `<img srcset>` candidate: asset, image
/// - `<a href>`: asset, no assertions
/// - `<video src>`: asset, video; `<video poster>`: asset, image
/// - absolute URL strings inside parseable JSON-LD blocks: asset
///
/// Every URL is resolved against `page_url`. Values that do not resolve are skipped.
pub fn html_links(page_url: &Url, page: &PageElements) -> Vec<Link> {
    let mut links = Vec::new();
    let mut push = |raw: &str, role: UrlRole, asserts: Vec<Assertion>, tag: &TagInfo| {
        match page_url.join(raw) {
            Ok(url) => links.push(Link {
                url: url.to_string(),
                role,
                asserts,
                location: tag.location(),
            }),
            Err(e) => tracing::debug!("Skipping unresolvable link {:?} on {}: {}", raw, page_url, e),
        }
    };

    for link in &page.links {
        if let Some(href) = link.non_empty_attr("href") {
            let (role, asserts) = link_element_role(link);
            push(href, role, asserts, link);
        }
    }

    for script in &page.scripts {
        if let Some(src) = script.non_empty_attr("src") {
            push(src, UrlRole::Asset, vec![], script);
        }
    }

    for meta in &page.metas {
        if meta.attr("property") == Some("og:image") {
            if let Some(content) = meta.non_empty_attr("content") {
                push(
                    content,
                    UrlRole::Asset,
                    vec![Assertion::Image, Assertion::Permanent],
                    meta,
                );
            }
        }
    }

    for img in &page.imgs {
        if let Some(src) = img.non_empty_attr("src") {
            push(src, UrlRole::Asset, vec![Assertion::Image], img);
        }
    }

    for img in &page.imgs {
        if let Some(srcset) = img.non_empty_attr("srcset") {
            for candidate in parse_srcset(srcset) {
                push(&candidate.url, UrlRole::Asset, vec![Assertion::Image], img);
            }
        }
    }

    for anchor in &page.anchors {
        if let Some(href) = anchor.non_empty_attr("href") {
            push(href, UrlRole::Asset, vec![], anchor);
        }
    }

    for video in &page.videos {
        if let Some(src) = video.non_empty_attr("src") {
            push(src, UrlRole::Asset, vec![Assertion::Video], video);
        }
    }

    for video in &page.videos {
        if let Some(poster) = video.non_empty_attr("poster") {
            push(poster, UrlRole::Asset, vec![Assertion::Image], video);
        }
    }

    for script in page.json_ld_scripts() {
        // Unparseable blocks are reported by the page validator
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&script.text) {
            let mut found = Vec::new();
            collect_absolute_urls(&value, &mut found);
            for url in found {
                push(&url, UrlRole::Asset, vec![], script);
            }
        }
    }

    links
}

/// Decides the role and assertions of a `<link href>` element
fn link_element_role(link: &TagInfo) -> (UrlRole, Vec<Assertion>) {
    let rel = link.rel_tokens();
    let has_rel = |token: &str| rel.iter().any(|t| t == token);
    let link_type = link.attr("type").map(str::trim).filter(|t| !t.is_empty());

    let (role, mut asserts) = if has_rel("stylesheet") {
        (UrlRole::Stylesheet, vec![])
    } else if has_rel("alternate") && link_type == Some("application/atom+xml") {
        (UrlRole::Atom, vec![])
    } else if has_rel("alternate") && link_type == Some("application/rss+xml") {
        (UrlRole::Rss, vec![])
    } else if let Some((width, height)) = has_rel("icon")
        .then(|| link.attr("sizes").and_then(single_icon_size))
        .flatten()
    {
        (
            UrlRole::Asset,
            vec![Assertion::Image, Assertion::ImageSize { width, height }],
        )
    } else {
        (UrlRole::Asset, vec![])
    };

    if let Some(link_type) = link_type {
        // Feeds are commonly served as plain XML
        let content_type = match link_type {
            "application/rss+xml" | "application/atom+xml" => {
                vec![link_type.to_string(), "application/xml".to_string()]
            }
            other => vec![other.to_string()],
        };
        asserts.insert(0, Assertion::ContentType { content_type });
    }

    (role, asserts)
}

/// Parses an icon `sizes` attribute holding exactly one `WxH` token
fn single_icon_size(sizes: &str) -> Option<(u32, u32)> {
    let mut tokens = sizes.split_whitespace();
    let token = tokens.next()?.to_ascii_lowercase();
    if tokens.next().is_some() {
        return None;
    }
    let (width, height) = token.split_once('x')?;
    Some((width.parse().ok()?, height.parse().ok()?))
}

/// Recursively collects string values that are absolute URLs
fn collect_absolute_urls(value: &serde_json::Value, found: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => {
            if Url::parse(s).is_ok() {
                found.push(s.clone());
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_absolute_urls(item, found);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_absolute_urls(item, found);
            }
        }
        _ => {}
    }
}
