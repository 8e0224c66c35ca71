//! Integration tests for the crawl graph builder

use crate::common::{site, BASE_URL};
use site_validator::crawler::{build_graph, SiteFetcher, WorkerPool};
use site_validator::{CrawlGraph, Seed, TargetConfig, UrlRole};
use tempfile::TempDir;
use url::Url;

async fn crawl(dir: &TempDir, seeds: &[Seed], concurrency: usize) -> CrawlGraph {
    let fetcher = SiteFetcher::new(
        Url::parse(BASE_URL).expect("Failed to parse base URL"),
        TargetConfig::new(dir.path()),
    );
    build_graph(fetcher, WorkerPool::new(2), concurrency, seeds)
        .await
        .expect("Crawl should succeed")
}

fn full_site() -> TempDir {
    site(&[
        (
            "index.html",
            r#"<html><head><link rel="stylesheet" href="/style.css"></head><body>
            <a href="about.html#team">About</a>
            <a href="https://other.com/">Elsewhere</a>
            <img src="/logo.png">
            </body></html>"#,
        ),
        ("style.css", r#"body { background: url("/bg.png"); }"#),
        ("about.html", r#"<h2 id="team">Team</h2>"#),
        ("logo.png", "not really a png"),
        ("robots.txt", "User-agent: *\nSitemap: https://example.com/sitemap.xml\n"),
        (
            "sitemap.xml",
            r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><url><loc>https://example.com/hidden/</loc></url></urlset>"#,
        ),
        ("hidden/index.html", "<p>only in the sitemap</p>"),
    ])
}

fn seeds() -> Vec<Seed> {
    vec![
        Seed::new("https://example.com/", UrlRole::Document),
        Seed::new("https://example.com/robots.txt", UrlRole::RobotsTxt),
    ]
}

#[tokio::test]
async fn test_crawl_follows_every_resource_kind() {
    let dir = full_site();
    let graph = crawl(&dir, &seeds(), 4).await;

    for url in [
        "https://example.com/index.html",
        "https://example.com/style.css",
        "https://example.com/about.html",
        "https://example.com/logo.png",
        "https://example.com/robots.txt",
        "https://example.com/sitemap.xml",
        "https://example.com/hidden/index.html",
    ] {
        let entry = graph.get(url).unwrap_or_else(|| panic!("{} should be crawled", url));
        assert!(entry.fetch.is_found(), "{} should be found", url);
    }

    let background = graph
        .get("https://example.com/bg.png")
        .expect("Stylesheet URLs should be crawled");
    assert!(!background.fetch.is_found());

    assert!(!graph.contains("https://other.com/"));
    assert!(graph
        .get("https://example.com/sitemap.xml")
        .is_some_and(|entry| entry.has_role("sitemap")));
}

#[tokio::test]
async fn test_graph_does_not_depend_on_concurrency() {
    let dir = full_site();

    let sequential = crawl(&dir, &seeds(), 1).await;
    let parallel = crawl(&dir, &seeds(), 16).await;

    assert_eq!(
        serde_json::to_value(&sequential).unwrap(),
        serde_json::to_value(&parallel).unwrap()
    );
}

#[tokio::test]
async fn test_seed_outside_site_is_fatal() {
    let dir = full_site();
    let fetcher = SiteFetcher::new(Url::parse(BASE_URL).unwrap(), TargetConfig::new(dir.path()));

    let result = build_graph(
        fetcher,
        WorkerPool::new(1),
        2,
        &[Seed::new("https://other.com/", UrlRole::Document)],
    )
    .await;

    assert!(matches!(
        result,
        Err(site_validator::ValidatorError::Precondition(_))
    ));
}
