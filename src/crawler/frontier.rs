//! Crawl frontier: the queue of (url, role) pairs still to visit
//!
//! The frontier deduplicates on the (canonical url, role) pair and counts how
//! many pairs were dispatched and completed. A crawl is finished only when
//! nothing is queued and every dispatched pair has completed, because a pair
//! that is still in flight can discover new work.

use crate::model::UrlRole;
use std::collections::{HashSet, VecDeque};

/// Where a crawl is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// Work is queued and waiting for a free slot
    Filling,
    /// Nothing is queued, but dispatched work is still running
    Draining,
    /// Nothing is queued or running
    Done,
}

/// A (url, role) pair waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// Canonical URL
    pub url: String,

    pub role: UrlRole,

    /// Order in which the pair was first offered
    pub sequence: u64,
}

/// FIFO frontier with a visited set and in-flight accounting
#[derive(Debug, Default)]
pub struct Frontier {
    visited: HashSet<(String, UrlRole)>,
    queue: VecDeque<QueuedUrl>,
    dispatched: u64,
    completed: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a pair unless it was seen before
    ///
    /// Returns `true` if the pair is new.
    pub fn offer(&mut self, url: String, role: UrlRole) -> bool {
        let key = (url, role);
        if self.visited.contains(&key) {
            return false;
        }
        let sequence = self.visited.len() as u64;
        self.visited.insert(key.clone());
        self.queue.push_back(QueuedUrl {
            url: key.0,
            role: key.1,
            sequence,
        });
        true
    }

    /// Takes the next pair to dispatch
    pub fn next(&mut self) -> Option<QueuedUrl> {
        let queued = self.queue.pop_front()?;
        self.dispatched += 1;
        Some(queued)
    }

    /// Records that a dispatched pair finished
    pub fn complete(&mut self) {
        debug_assert!(self.completed < self.dispatched);
        self.completed += 1;
    }

    pub fn state(&self) -> CrawlState {
        if !self.queue.is_empty() {
            CrawlState::Filling
        } else if self.dispatched > self.completed {
            CrawlState::Draining
        } else {
            CrawlState::Done
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.dispatched - self.completed
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Number of distinct pairs ever offered
    pub fn seen(&self) -> usize {
        self.visited.len()
    }
}
