use crate::model::{Assertion, UrlRole};
use serde::Serialize;

/// An outbound link discovered in a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Link {
    /// Absolute URL, resolved against the resource it was found in
    pub url: String,

    /// Role the target is fetched with
    pub role: UrlRole,

    /// Expectations about the target
    pub asserts: Vec<Assertion>,

    /// Where the link was found
    pub location: LinkLocation,
}

/// Where a link was found, for error reporting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LinkLocation {
    Html {
        element: ElementLocation,
    },
    #[serde(rename = "sitemapxml", rename_all = "camelCase")]
    SitemapXml {
        sitemap: SitemapSource,
        urlset_index: usize,
        url_index: usize,
    },
    #[serde(rename = "sitemaptxt")]
    SitemapTxt { sitemap: SitemapSource, index: usize },
    #[serde(rename = "robotssitemap")]
    RobotsSitemap { index: usize },
    #[serde(rename_all = "camelCase")]
    Rss {
        rss_url: String,
        channel_index: usize,
        link_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    Atom {
        atom_url: String,
        entry_index: usize,
        link_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    Json {
        json_url: String,
        query: String,
        index: usize,
    },
    Css { position: String, target: String },
    #[serde(rename = "extraurl")]
    ExtraUrl { index: usize },
    Redirect,
}

/// Which sitemap a sitemap entry came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SitemapSource {
    /// A crawled sitemap at this URL
    Url(String),
    /// The n-th inline extra sitemap
    ExtraSitemap(usize),
}

/// An HTML element, identified for humans
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ElementLocation {
    #[serde(rename = "outerHTML")]
    pub outer_html: String,

    /// `tag:nth-of-type(n)` chain from the document root
    pub selector: String,
}

impl LinkLocation {
    pub fn is_redirect(&self) -> bool {
        matches!(self, LinkLocation::Redirect)
    }
}
