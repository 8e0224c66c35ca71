//! State shared by every validation task of one run

use crate::crawler::{CrawlGraph, GraphEntry};
use crate::extract::get_redirect_in;
use crate::extract::html::PageElements;
use crate::model::FoundFetchResult;
use crate::url::{is_internal_link, to_canonical};
use crate::validate::additional::AdditionalValidator;
use crate::validate::cache::PageCache;
use crate::validate::checkers::ExternalChecker;
use crate::{Result, ValidatorError};
use std::sync::Arc;
use url::Url;

/// Read-only view of a finished crawl plus the caches validators share
///
/// Built once after the crawl and handed to worker tasks behind an `Arc`.
pub struct ValidationContext {
    pub base_url: Url,
    pub index_name: String,
    pub graph: CrawlGraph,
    pub pages: PageCache,
    pub checker: Arc<dyn ExternalChecker>,
    pub validators: Vec<AdditionalValidator>,
}

impl ValidationContext {
    pub fn new(
        base_url: Url,
        index_name: impl Into<String>,
        graph: CrawlGraph,
        checker: Arc<dyn ExternalChecker>,
        validators: Vec<AdditionalValidator>,
    ) -> Self {
        Self {
            base_url,
            index_name: index_name.into(),
            graph,
            pages: PageCache::new(),
            checker,
            validators,
        }
    }

    pub fn canonical(&self, url: &str) -> String {
        to_canonical(&self.base_url, &self.index_name, url)
    }

    pub fn is_internal(&self, url: &str) -> bool {
        is_internal_link(&self.base_url, url)
    }

    /// Looks up the graph entry of an internal URL
    ///
    /// # Errors
    ///
    /// Every internal link was offered to the crawler, so a missing entry is a
    /// broken invariant and fatal.
    pub fn entry(&self, url: &str) -> Result<&GraphEntry> {
        let canonical = self.canonical(url);
        self.graph
            .get(&canonical)
            .ok_or(ValidatorError::MissingGraphEntry { url: canonical })
    }

    /// Parsed page of a found HTML resource, `None` for other content types
    pub fn page(&self, res: &FoundFetchResult) -> Result<Option<Arc<PageElements>>> {
        if !res.is_html() {
            return Ok(None);
        }
        self.pages.load(&res.data).map(Some)
    }

    /// Redirect target of a resource, reading HTML through the page cache
    pub fn redirect(&self, res: &FoundFetchResult) -> Result<Option<String>> {
        match self.page(res)? {
            Some(page) => get_redirect_in(res, &page),
            None => get_redirect_in(res, &PageElements::default()),
        }
    }
}

impl std::fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationContext")
            .field("base_url", &self.base_url.as_str())
            .field("index_name", &self.index_name)
            .field("entries", &self.graph.len())
            .field("validators", &self.validators.len())
            .finish()
    }
}
