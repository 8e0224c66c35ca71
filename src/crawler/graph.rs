//! The crawl graph: every visited URL with its fetch result, roles and links

use crate::model::{FetchResult, FoundFetchResult, Link, UrlRole};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// One fetched (url, role) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visit {
    /// Canonical URL
    pub url: String,
    pub role: UrlRole,
    pub fetch: FetchResult,
    /// Outgoing links, `None` if the resource was not found
    pub links: Option<Vec<Link>>,
}

/// Everything known about one canonical URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEntry {
    pub url: String,
    pub fetch: FetchResult,
    /// Every role the URL was fetched as
    pub roles: IndexSet<UrlRole>,
    /// Union of the links found under every role, `None` if not found
    pub links: Option<IndexSet<Link>>,
}

impl GraphEntry {
    pub fn found(&self) -> Option<FoundFetchResult> {
        self.fetch.found()
    }

    pub fn has_role(&self, kind: &str) -> bool {
        self.roles.iter().any(|role| role.kind() == kind)
    }
}

/// Immutable result of a crawl, keyed by canonical URL
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlGraph {
    entries: IndexMap<String, GraphEntry>,
    #[serde(skip)]
    visits: Vec<Visit>,
}

impl CrawlGraph {
    /// Merges visits into one entry per canonical URL
    ///
    /// Visits are sorted by URL and role first, so the graph does not depend
    /// on the order in which fetches completed.
    pub fn from_visits(mut visits: Vec<Visit>) -> Self {
        visits.sort_by_cached_key(|visit| {
            (
                visit.url.clone(),
                serde_json::to_string(&visit.role).unwrap_or_default(),
            )
        });

        let mut entries: IndexMap<String, GraphEntry> = IndexMap::new();
        for visit in &visits {
            let entry = entries
                .entry(visit.url.clone())
                .or_insert_with(|| GraphEntry {
                    url: visit.url.clone(),
                    fetch: visit.fetch.clone(),
                    roles: IndexSet::new(),
                    links: None,
                });

            entry.roles.insert(visit.role.clone());
            if let Some(links) = &visit.links {
                entry
                    .links
                    .get_or_insert_with(IndexSet::new)
                    .extend(links.iter().cloned());
            }
        }

        Self { entries, visits }
    }

    pub fn get(&self, url: &str) -> Option<&GraphEntry> {
        self.entries.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn entries(&self) -> impl Iterator<Item = &GraphEntry> {
        self.entries.values()
    }

    /// The individual (url, role) visits the graph was built from, sorted
    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    /// Found visits fetched as the given role kind, e.g. `"rss"`
    pub fn visits_with_role<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Visit> + 'a {
        self.visits
            .iter()
            .filter(move |visit| visit.role.kind() == kind && visit.fetch.is_found())
    }

    /// Every link of every entry, deduplicated per entry
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.entries
            .values()
            .filter_map(|entry| entry.links.as_ref())
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
