//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that turns seeds into a [`CrawlGraph`]:
//! - Seeding the frontier with canonical seed URLs
//! - Keeping up to `concurrency` fetch+extract pipelines in flight
//! - Feeding internal links found by extraction back into the frontier
//! - Merging the visits into the final graph

use crate::crawler::fetcher::SiteFetcher;
use crate::crawler::frontier::{CrawlState, Frontier, QueuedUrl};
use crate::crawler::graph::{CrawlGraph, Visit};
use crate::crawler::pool::WorkerPool;
use crate::extract::extract_links;
use crate::model::Seed;
use crate::url::{is_internal_link, to_canonical};
use crate::{Result, ValidatorError};
use tokio::task::JoinSet;
use url::Url;

/// Number of in-flight pipelines when none is configured
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Builds crawl graphs for one site
pub struct GraphBuilder {
    fetcher: SiteFetcher,
    pool: WorkerPool,
    concurrency: usize,
}

impl GraphBuilder {
    /// Creates a graph builder
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Resolves URLs to files of the built site
    /// * `pool` - Runs link extraction off the scheduling loop
    /// * `concurrency` - Maximum number of in-flight (url, role) pipelines
    pub fn new(fetcher: SiteFetcher, pool: WorkerPool, concurrency: usize) -> Self {
        Self {
            fetcher,
            pool,
            concurrency: concurrency.max(1),
        }
    }

    /// Crawls the site starting from `seeds`
    ///
    /// This is the core crawling logic that:
    /// 1. Canonicalizes the seeds and queues them
    /// 2. Dispatches queued pairs while fewer than `concurrency` are in flight
    /// 3. Canonicalizes every extracted link against the page it was found on
    /// 4. Queues the internal ones that were not seen under the same role
    /// 5. Stops when every dispatched pair has completed and nothing is queued
    ///
    /// # Errors
    ///
    /// Any fetch I/O error other than not-found, a fatal extraction error or a
    /// seed outside the site aborts the whole crawl; in-flight work is cancelled.
    pub async fn build(&self, seeds: &[Seed]) -> Result<CrawlGraph> {
        let base_url = self.fetcher.base_url().clone();
        let index_name = self.fetcher.index_name().to_string();

        let mut frontier = Frontier::new();
        for seed in seeds {
            if !self.fetcher.is_internal(&seed.url) {
                return Err(ValidatorError::Precondition(format!(
                    "Seed not internal: {}",
                    seed.url
                )));
            }
            frontier.offer(self.fetcher.canonical(&seed.url), seed.role.clone());
        }

        tracing::info!(
            "Starting crawl of {} with {} seeds",
            base_url,
            frontier.queued()
        );
        let start_time = std::time::Instant::now();

        let mut tasks = JoinSet::new();
        let mut visits = Vec::new();

        loop {
            while tasks.len() < self.concurrency {
                let Some(queued) = frontier.next() else {
                    break;
                };
                tasks.spawn(visit_url(self.fetcher.clone(), self.pool.clone(), queued));
            }

            if frontier.state() == CrawlState::Done {
                break;
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let visit = joined.map_err(|e| ValidatorError::Worker(e.to_string()))??;
            frontier.complete();

            if let Some(links) = &visit.links {
                let page_url = Url::parse(&visit.url)?;
                for link in links {
                    let canonical = to_canonical(&page_url, &index_name, &link.url);
                    if is_internal_link(&base_url, &canonical)
                        && frontier.offer(canonical.clone(), link.role.clone())
                    {
                        tracing::trace!("Discovered {} ({})", canonical, link.role.kind());
                    }
                }
            }
            visits.push(visit);

            if frontier.completed() % 50 == 0 {
                tracing::info!(
                    "Progress: {} fetched, {} in flight, {} queued",
                    frontier.completed(),
                    frontier.in_flight(),
                    frontier.queued()
                );
            }
        }

        let graph = CrawlGraph::from_visits(visits);
        tracing::info!(
            "Crawl completed: {} visits, {} distinct URLs in {:?}",
            frontier.completed(),
            graph.len(),
            start_time.elapsed()
        );

        Ok(graph)
    }
}

/// Fetches one pair and extracts its links on the worker pool
async fn visit_url(fetcher: SiteFetcher, pool: WorkerPool, queued: QueuedUrl) -> Result<Visit> {
    tracing::debug!("Fetching {} as {}", queued.url, queued.role.kind());
    let fetch = fetcher.fetch(&queued.url).await?;

    let links = match fetch.found() {
        Some(found) => {
            let role = queued.role.clone();
            Some(pool.run(move || extract_links(&role, &found)).await??)
        }
        None => {
            tracing::debug!("Not found: {}", queued.url);
            None
        }
    };

    Ok(Visit {
        url: queued.url,
        role: queued.role,
        fetch,
        links,
    })
}

/// Crawls a site into a [`CrawlGraph`]
///
/// # Example
///
/// ```no_run
/// use site_validator::crawler::{build_graph, SiteFetcher, TargetConfig, WorkerPool};
/// use site_validator::{Seed, UrlRole};
/// use url::Url;
///
/// # async fn example() -> site_validator::Result<()> {
/// let fetcher = SiteFetcher::new(Url::parse("https://example.com")?, TargetConfig::new("dist"));
/// let seeds = vec![Seed::new("https://example.com/", UrlRole::Document)];
/// let graph = build_graph(fetcher, WorkerPool::with_default_size(), 10, &seeds).await?;
/// println!("{} URLs", graph.len());
/// # Ok(())
/// # }
/// ```
pub async fn build_graph(
    fetcher: SiteFetcher,
    pool: WorkerPool,
    concurrency: usize,
    seeds: &[Seed],
) -> Result<CrawlGraph> {
    GraphBuilder::new(fetcher, pool, concurrency).build(seeds).await
}
