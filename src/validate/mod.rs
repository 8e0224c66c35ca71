//! Site validation
//!
//! This module turns a crawl into findings:
//! - Crawling the site from the seeds and the extras
//! - Checking every found resource once ([`validate_file`])
//! - Checking every internal link against its target ([`check_link`])
//! - Reporting seeds that do not exist and validator rules that matched too
//!   few or too many resources

mod additional;
mod cache;
mod checkers;
mod context;
mod file;
mod image;
mod link;
mod result;

pub use additional::{AdditionalValidator, ValidatorConfig};
pub use cache::PageCache;
pub use checkers::{CommandChecker, ExternalChecker, MarkupKind, NoExternalChecks};
pub use context::ValidationContext;
pub use file::validate_file;
pub use image::check_images;
pub use link::check_link;
pub use result::{
    ElementInPage, EpubcheckLocation, EpubcheckMessage, ImageCandidate, LinkErrorLocation,
    PageLocation, SeedLocation, ValidationResult, VnuMessage,
};

use crate::crawler::{
    build_graph, default_pool_size, with_pool, SiteFetcher, TargetConfig, WorkerPool,
    DEFAULT_CONCURRENCY,
};
use crate::extract::{extra_links, extra_seeds};
use crate::model::{Extras, Link, Seed};
use crate::url::{parse_base_url, to_relative_url};
use crate::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::sync::Arc;

/// Tuning and collaborators for a validation run
#[derive(Clone)]
pub struct ValidateOptions {
    /// Maximum number of in-flight crawl pipelines and validation tasks
    pub concurrency: usize,

    /// Number of blocking workers
    pub pool_size: usize,

    /// Runs the HTML/CSS/SVG and EPUB checkers
    pub checker: Arc<dyn ExternalChecker>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            pool_size: default_pool_size(),
            checker: Arc::new(NoExternalChecks),
        }
    }
}

impl ValidateOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn with_checker(mut self, checker: impl ExternalChecker + 'static) -> Self {
        self.checker = Arc::new(checker);
        self
    }
}

impl fmt::Debug for ValidateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateOptions")
            .field("concurrency", &self.concurrency)
            .field("pool_size", &self.pool_size)
            .finish_non_exhaustive()
    }
}

/// Crawls a built site and reports every problem found
///
/// Findings are returned in a fixed order: per-resource findings, then missing
/// seeds, then link findings, then validator match counts. Within each group
/// the order follows the crawl graph, which does not depend on timing.
///
/// # Arguments
///
/// * `options` - Concurrency, pool size and external checkers
/// * `base_url` - Origin the site is served from, e.g. `https://example.com`
/// * `target` - Where the built files are and how they are served
/// * `seeds` - URLs to start crawling from, with their roles
/// * `extras` - Inline sitemaps and URLs that crawling cannot reach
/// * `validators` - Additional schema validators matched by URL pattern
///
/// # Errors
///
/// Only fatal conditions abort the run: an invalid base URL, a seed or extra
/// URL outside the site, I/O errors other than not-found, a page with several
/// meta refresh tags, or an external checker that cannot run.
///
/// # Example
///
/// ```no_run
/// use site_validator::{validate, Extras, Seed, TargetConfig, UrlRole, ValidateOptions};
///
/// # async fn example() -> site_validator::Result<()> {
/// let findings = validate(
///     &ValidateOptions::default(),
///     "https://example.com",
///     TargetConfig::new("dist"),
///     &[Seed::new("https://example.com/", UrlRole::Document)],
///     &Extras::default(),
///     &[],
/// )
/// .await?;
/// for finding in &findings {
///     println!("{} {:?}", finding.kind(), finding.url());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn validate(
    options: &ValidateOptions,
    base_url: &str,
    target: TargetConfig,
    seeds: &[Seed],
    extras: &Extras,
    validators: &[AdditionalValidator],
) -> Result<Vec<ValidationResult>> {
    let base_url = parse_base_url(base_url)?;
    let crawl_seeds: Vec<Seed> = seeds
        .iter()
        .cloned()
        .chain(extra_seeds(&base_url, extras)?)
        .collect();
    let extra_links = extra_links(&base_url, extras)?;
    let index_name = target.index_name.clone();
    let concurrency = options.concurrency.max(1);

    with_pool(options.pool_size, |pool| async move {
        let fetcher = SiteFetcher::new(base_url.clone(), target);
        let graph = build_graph(fetcher.clone(), pool.clone(), concurrency, &crawl_seeds).await?;

        let ctx = Arc::new(ValidationContext::new(
            base_url.clone(),
            index_name,
            graph,
            options.checker.clone(),
            validators.to_vec(),
        ));

        let page_results = validate_files(&ctx, &pool, concurrency).await?;
        let not_found = missing_seeds(&ctx, &fetcher, seeds);

        let links: Vec<Link> = ctx
            .graph
            .links()
            .cloned()
            .chain(extra_links)
            .filter(|link| ctx.is_internal(&link.url))
            .collect();
        let link_results = check_links(&ctx, &pool, concurrency, links).await?;

        let match_results = match_counts(&ctx);

        tracing::info!(
            "Validation completed: {} resources, {} findings",
            ctx.graph.len(),
            page_results.len() + not_found.len() + link_results.len() + match_results.len()
        );

        Ok(page_results
            .into_iter()
            .chain(not_found)
            .chain(link_results)
            .chain(match_results)
            .collect())
    })
    .await
}

/// Runs [`validate_file`] for every found resource on the pool
async fn validate_files(
    ctx: &Arc<ValidationContext>,
    pool: &WorkerPool,
    concurrency: usize,
) -> Result<Vec<ValidationResult>> {
    let urls: Vec<String> = ctx
        .graph
        .entries()
        .filter(|entry| entry.fetch.is_found())
        .map(|entry| entry.url.clone())
        .collect();
    tracing::debug!("Validating {} resources", urls.len());

    let per_file: Vec<Vec<ValidationResult>> = stream::iter(urls)
        .map(|url| {
            let ctx = ctx.clone();
            let pool = pool.clone();
            async move {
                pool.run(move || {
                    let entry = ctx.entry(&url)?;
                    validate_file(&ctx, entry)
                })
                .await?
            }
        })
        .buffered(concurrency)
        .try_collect()
        .await?;

    Ok(per_file.into_iter().flatten().collect())
}

/// Runs [`check_link`] for every internal link on the pool
async fn check_links(
    ctx: &Arc<ValidationContext>,
    pool: &WorkerPool,
    concurrency: usize,
    links: Vec<Link>,
) -> Result<Vec<ValidationResult>> {
    tracing::debug!("Checking {} links", links.len());

    let per_link: Vec<Vec<ValidationResult>> = stream::iter(links)
        .map(|link| {
            let ctx = ctx.clone();
            let pool = pool.clone();
            async move { pool.run(move || check_link(&ctx, &link)).await? }
        })
        .buffered(concurrency)
        .try_collect()
        .await?;

    Ok(per_link.into_iter().flatten().collect())
}

/// One `NOT_FOUND` per seed whose canonical URL was not found
fn missing_seeds(ctx: &ValidationContext, fetcher: &SiteFetcher, seeds: &[Seed]) -> Vec<ValidationResult> {
    seeds
        .iter()
        .enumerate()
        .filter(|(_, seed)| {
            ctx.graph
                .get(&fetcher.canonical(&seed.url))
                .map_or(true, |entry| !entry.fetch.is_found())
        })
        .map(|(index, seed)| ValidationResult::NotFound {
            location: SeedLocation {
                url: seed.url.clone(),
                index,
            },
        })
        .collect()
}

/// Checks how many found resources each validator rule matched
fn match_counts(ctx: &ValidationContext) -> Vec<ValidationResult> {
    let relative_urls: Vec<String> = ctx
        .graph
        .entries()
        .filter(|entry| entry.fetch.is_found())
        .map(|entry| to_relative_url(&ctx.base_url, &entry.url))
        .collect();

    ctx.validators
        .iter()
        .filter_map(|validator| {
            let matches = relative_urls
                .iter()
                .filter(|url| validator.matches(url))
                .count();
            validator.check_match_count(matches)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UrlRole;
    use crate::validate::context::test_support::write_site;
    use crate::ValidatorError;
    use serde_json::json;
    use tempfile::TempDir;

    fn seeds() -> Vec<Seed> {
        vec![Seed::new("https://example.com/", UrlRole::Document)]
    }

    async fn run(dir: &TempDir, extras: &Extras, validators: &[AdditionalValidator]) -> Result<Vec<ValidationResult>> {
        validate(
            &ValidateOptions::default().with_concurrency(3).with_pool_size(2),
            "https://example.com",
            TargetConfig::new(dir.path()),
            &seeds(),
            extras,
            validators,
        )
        .await
    }

    #[tokio::test]
    async fn test_findings_are_grouped_in_order() {
        let dir = TempDir::new().unwrap();
        write_site(
            dir.path(),
            &[(
                "index.html",
                r#"<link rel="canonical" href="/elsewhere.html"><a href="missing.html">m</a>"#,
            )],
        );
        let validators = vec![AdditionalValidator::new(
            r"^/nonexistent\.html$",
            ValidatorConfig::Json { schema: json!({}) },
        )
        .unwrap()
        .with_min_matches(1)];

        let results = run(&dir, &Extras::default(), &validators).await.unwrap();
        let kinds: Vec<_> = results.iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "NON_REDIRECT_DIFFERENT_CANONICAL",
                "TARGET_NOT_FOUND",
                "TARGET_NOT_FOUND",
                "ADDITIONAL_VALIDATOR_MATCH_NUMBER_OUTSIDE_EXPECTED_RANGE",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_seed_is_reported_by_index() {
        let dir = TempDir::new().unwrap();
        let results = run(&dir, &Extras::default(), &[]).await.unwrap();
        assert_eq!(
            results,
            vec![ValidationResult::NotFound {
                location: SeedLocation {
                    url: "https://example.com/".to_string(),
                    index: 0,
                },
            }]
        );
    }

    #[tokio::test]
    async fn test_extras_are_crawled_and_checked() {
        let dir = TempDir::new().unwrap();
        write_site(
            dir.path(),
            &[
                ("index.html", "<p>home</p>"),
                ("hidden.html", r#"<a href="gone.html">g</a>"#),
            ],
        );
        let extras = Extras {
            txt_sitemaps: vec!["https://example.com/hidden.html\nhttps://example.com/nope.html\n".to_string()],
            ..Extras::default()
        };

        let results = run(&dir, &extras, &[]).await.unwrap();
        let missing: Vec<_> = results
            .iter()
            .filter(|r| r.kind() == "TARGET_NOT_FOUND")
            .filter_map(|r| r.url())
            .collect();
        assert_eq!(
            missing,
            vec!["https://example.com/gone.html", "https://example.com/nope.html"]
        );
    }

    #[tokio::test]
    async fn test_external_extra_url_is_fatal() {
        let dir = TempDir::new().unwrap();
        let extras = Extras {
            urls: vec!["https://other.com/".to_string()],
            ..Extras::default()
        };
        assert!(matches!(
            run(&dir, &extras, &[]).await,
            Err(ValidatorError::Precondition(_))
        ));
    }
}
