//! Data model shared by the crawler, the extractors and the validators

mod fetch;
mod link;
mod role;

pub use fetch::{content_type_essence, FetchResult, FileData, FoundFetchResult, REDIRECT_STATUSES};
pub use link::{ElementLocation, Link, LinkLocation, SitemapSource};
pub use role::{Assertion, ExtractConfig, UrlRole};

use serde::{Deserialize, Serialize};

/// A URL to start crawling from, with the role it is fetched as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub url: String,
    pub role: UrlRole,
}

impl Seed {
    pub fn new(url: impl Into<String>, role: UrlRole) -> Self {
        Self {
            url: url.into(),
            role,
        }
    }
}

/// Inline content that is not reachable by crawling but belongs to the site
///
/// Sitemap entries hold the sitemap document itself, not a path or URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extras {
    pub txt_sitemaps: Vec<String>,
    pub xml_sitemaps: Vec<String>,
    pub urls: Vec<String>,
}
