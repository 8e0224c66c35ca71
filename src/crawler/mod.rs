//! Crawler module for building the crawl graph of a built site
//!
//! This module contains the core crawling logic, including:
//! - Resolving URLs to files of the build directory
//! - A bounded worker pool for blocking extraction work
//! - The frontier state machine with (url, role) deduplication
//! - Overall crawl coordination into a [`CrawlGraph`]

mod coordinator;
mod fetcher;
mod frontier;
mod graph;
mod pool;

pub use coordinator::{build_graph, GraphBuilder, DEFAULT_CONCURRENCY};
pub use fetcher::{
    default_content_type, default_response_meta, ResponseMeta, ResponseMetaFn, SiteFetcher,
    TargetConfig,
};
pub use frontier::{CrawlState, Frontier, QueuedUrl};
pub use graph::{CrawlGraph, GraphEntry, Visit};
pub use pool::{default_pool_size, with_pool, WorkerPool};
