//! Per-file cache of parsed HTML pages
//!
//! The same page is read by several checks: every link with a hash into it,
//! the redirect resolver and the page validator. Entries are keyed by path and
//! modification time, so a file that changes on disk is parsed again.

use crate::extract::html::PageElements;
use crate::model::FileData;
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

type CacheKey = (PathBuf, DateTime<Utc>);

/// Parsed pages shared between worker tasks
#[derive(Debug, Default)]
pub struct PageCache {
    pages: Mutex<HashMap<CacheKey, Arc<PageElements>>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed page for a file, parsing it on first use
    ///
    /// Two workers asking for the same uncached page at once may both parse it;
    /// the results are identical, so the last one wins.
    pub fn load(&self, data: &FileData) -> Result<Arc<PageElements>> {
        let key = (data.path.clone(), data.modified);
        if let Some(page) = self.lock().get(&key) {
            return Ok(page.clone());
        }

        let page = Arc::new(PageElements::load(&data.path)?);
        self.lock().insert(key, page.clone());
        Ok(page)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<PageElements>>> {
        // A panicking worker cannot leave the map half-updated
        self.pages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
