//! Version comparison between two builds of the same site
//!
//! Both builds are crawled, then three kinds of backward-incompatible change
//! are looked for:
//! - permanent URLs of the old build that the new build no longer links
//! - JSON links an old client, reading new data with its old extraction
//!   config, would miss
//! - feed entries whose link stayed the same while their GUID changed

use crate::crawler::{build_graph, with_pool, CrawlGraph, SiteFetcher, TargetConfig, WorkerPool};
use crate::extract::feeds::{atom_entries, rss_items, FeedItem};
use crate::extract::{extra_links, extra_seeds, extract_links, read_text};
use crate::model::{Assertion, Extras, Link, Seed};
use crate::url::parse_base_url;
use crate::validate::ValidateOptions;
use crate::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// One build of the site
#[derive(Debug, Clone)]
pub struct SiteVersion<'a> {
    pub base_url: &'a str,
    pub target: TargetConfig,
    pub seeds: &'a [Seed],
    pub extras: &'a Extras,
}

/// A feed entry that kept its link but changed its GUID
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedGuidChange {
    /// Link of the entry
    pub url: String,
    pub feed_url: String,
    pub original_guid: String,
    pub new_guid: String,
}

/// Differences between an old and a new build
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionComparison {
    pub removed_permanent_urls: Vec<Link>,
    pub non_forward_compatible_json_links: Vec<Link>,
    pub feed_guids_changed: Vec<FeedGuidChange>,
}

impl VersionComparison {
    pub fn is_empty(&self) -> bool {
        self.removed_permanent_urls.is_empty()
            && self.non_forward_compatible_json_links.is_empty()
            && self.feed_guids_changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.removed_permanent_urls.len()
            + self.non_forward_compatible_json_links.len()
            + self.feed_guids_changed.len()
    }
}

/// Compares a new build of a site against an old one
///
/// Only `concurrency` and `pool_size` of `options` are used.
///
/// # Errors
///
/// The fatal conditions of crawling either build, see [`crate::validate`].
pub async fn compare_versions(
    options: &ValidateOptions,
    new: SiteVersion<'_>,
    old: SiteVersion<'_>,
) -> Result<VersionComparison> {
    let new_base = parse_base_url(new.base_url)?;
    let old_base = parse_base_url(old.base_url)?;
    let concurrency = options.concurrency.max(1);

    let new_seeds: Vec<Seed> = new
        .seeds
        .iter()
        .cloned()
        .chain(extra_seeds(&new_base, new.extras)?)
        .collect();
    let old_seeds: Vec<Seed> = old
        .seeds
        .iter()
        .cloned()
        .chain(extra_seeds(&old_base, old.extras)?)
        .collect();
    let new_extra_links = extra_links(&new_base, new.extras)?;
    let old_extra_links = extra_links(&old_base, old.extras)?;

    with_pool(options.pool_size, |pool| async move {
        let new_fetcher = SiteFetcher::new(new_base, new.target);
        let old_fetcher = SiteFetcher::new(old_base, old.target);

        tracing::info!("Crawling both versions");
        let (new_graph, old_graph) = tokio::try_join!(
            build_graph(new_fetcher.clone(), pool.clone(), concurrency, &new_seeds),
            build_graph(old_fetcher, pool.clone(), concurrency, &old_seeds),
        )?;

        let removed_permanent_urls =
            removed_permanent_urls(&new_graph, &new_extra_links, &old_graph, &old_extra_links);
        let non_forward_compatible_json_links =
            non_forward_compatible_json_links(&new_fetcher, &pool, new.seeds, old.seeds).await?;
        let feed_guids_changed = feed_guids_changed(&pool, &new_graph, &old_graph).await?;

        let comparison = VersionComparison {
            removed_permanent_urls,
            non_forward_compatible_json_links,
            feed_guids_changed,
        };
        tracing::info!("Comparison completed: {} differences", comparison.len());
        Ok(comparison)
    })
    .await
}

fn is_permanent(link: &Link) -> bool {
    link.asserts.contains(&Assertion::Permanent)
}

/// Old permanent links whose URL no permanent link of the new build carries
///
/// Each removed URL is reported once, with the first old link that had it.
fn removed_permanent_urls(
    new_graph: &CrawlGraph,
    new_extra_links: &[Link],
    old_graph: &CrawlGraph,
    old_extra_links: &[Link],
) -> Vec<Link> {
    let kept: HashSet<&str> = new_graph
        .links()
        .chain(new_extra_links)
        .filter(|link| is_permanent(link))
        .map(|link| link.url.as_str())
        .collect();

    let mut reported = HashSet::new();
    old_graph
        .links()
        .chain(old_extra_links)
        .filter(|link| is_permanent(link))
        .filter(|link| !kept.contains(link.url.as_str()))
        .filter(|link| reported.insert(link.url.clone()))
        .cloned()
        .collect()
}

/// Links the new JSON extraction configs find in the new files but the old ones do not
async fn non_forward_compatible_json_links(
    new_fetcher: &SiteFetcher,
    pool: &WorkerPool,
    new_seeds: &[Seed],
    old_seeds: &[Seed],
) -> Result<Vec<Link>> {
    let with_new_config = json_seed_links(new_fetcher, pool, new_seeds).await?;
    let with_old_config = json_seed_links(new_fetcher, pool, old_seeds).await?;

    let old: HashSet<&Link> = with_old_config.iter().collect();
    Ok(with_new_config
        .iter()
        .filter(|link| !old.contains(link))
        .cloned()
        .collect())
}

/// Links extracted from the new build's files for every `json` seed
async fn json_seed_links(fetcher: &SiteFetcher, pool: &WorkerPool, seeds: &[Seed]) -> Result<Vec<Link>> {
    let mut links = Vec::new();

    for seed in seeds.iter().filter(|seed| seed.role.kind() == "json") {
        if !fetcher.is_internal(&seed.url) {
            tracing::warn!("Skipping JSON seed outside the new site: {}", seed.url);
            continue;
        }
        let fetch = fetcher.fetch(&fetcher.canonical(&seed.url)).await?;
        let Some(found) = fetch.found() else {
            continue;
        };
        let role = seed.role.clone();
        links.extend(pool.run(move || extract_links(&role, &found)).await??);
    }

    Ok(links)
}

/// GUID changes of feed entries present in both builds, RSS first, then Atom
async fn feed_guids_changed(
    pool: &WorkerPool,
    new_graph: &CrawlGraph,
    old_graph: &CrawlGraph,
) -> Result<Vec<FeedGuidChange>> {
    let mut changes = Vec::new();

    for (kind, parse) in [
        ("rss", rss_items as FeedParser),
        ("atom", atom_entries as FeedParser),
    ] {
        for new_visit in new_graph.visits_with_role(kind) {
            let Some(old_visit) = old_graph
                .visits_with_role(kind)
                .find(|old_visit| old_visit.url == new_visit.url)
            else {
                continue;
            };
            let (Some(new_data), Some(old_data)) = (&new_visit.fetch.data, &old_visit.fetch.data) else {
                continue;
            };

            let feed_url = new_visit.url.clone();
            let new_path = new_data.path.clone();
            let old_path = old_data.path.clone();
            changes.extend(
                pool.run(move || guid_changes(parse, &feed_url, &old_path, &new_path))
                    .await??,
            );
        }
    }

    Ok(changes)
}

type FeedParser = fn(&str) -> std::result::Result<Vec<FeedItem>, roxmltree::Error>;

/// Matches entries of two versions of a feed by link and compares their GUIDs
fn guid_changes(
    parse: FeedParser,
    feed_url: &str,
    old_path: &Path,
    new_path: &Path,
) -> Result<Vec<FeedGuidChange>> {
    let (old_items, new_items) = match (parse(&read_text(old_path)?), parse(&read_text(new_path)?)) {
        (Ok(old_items), Ok(new_items)) => (old_items, new_items),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!("Skipping unparseable feed {}: {}", feed_url, e);
            return Ok(Vec::new());
        }
    };

    Ok(old_items
        .into_iter()
        .filter_map(|original| {
            let current = new_items.iter().find(|item| item.link == original.link)?;
            (current.guid != original.guid).then(|| FeedGuidChange {
                url: original.link.clone(),
                feed_url: feed_url.to_string(),
                original_guid: original.guid,
                new_guid: current.guid.clone(),
            })
        })
        .collect())
}
