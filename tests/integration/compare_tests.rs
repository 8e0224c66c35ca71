//! Integration tests for version comparison

use crate::common::{options, site, BASE_URL};
use site_validator::{compare_versions, Extras, Seed, SiteVersion, TargetConfig, UrlRole, VersionComparison};
use tempfile::TempDir;

fn seeds() -> Vec<Seed> {
    vec![
        Seed::new("https://example.com/", UrlRole::Document),
        Seed::new("https://example.com/sitemap.xml", UrlRole::Sitemap),
        Seed::new("https://example.com/atom.xml", UrlRole::Atom),
    ]
}

fn sitemap(paths: &[&str]) -> String {
    let urls: String = paths
        .iter()
        .map(|path| format!("<url><loc>https://example.com{}</loc></url>", path))
        .collect();
    format!(
        r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        urls
    )
}

fn atom(entries: &[(&str, &str)]) -> String {
    let entries: String = entries
        .iter()
        .map(|(path, id)| {
            format!(
                r#"<entry><id>{}</id><link href="https://example.com{}"/></entry>"#,
                id, path
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom">{}</feed>"#,
        entries
    )
}

async fn compare(new: &TempDir, old: &TempDir) -> VersionComparison {
    let seeds = seeds();
    let extras = Extras::default();
    let version = |dir: &TempDir| SiteVersion {
        base_url: BASE_URL,
        target: TargetConfig::new(dir.path()),
        seeds: &seeds,
        extras: &extras,
    };

    compare_versions(&options(), version(new), version(old))
        .await
        .expect("Comparison should not abort")
}

#[tokio::test]
async fn test_unchanged_build_is_compatible() {
    let sitemap = sitemap(&["/", "/posts/a.html"]);
    let atom = atom(&[("/posts/a.html", "urn:post:a")]);
    let build = || {
        site(&[
            ("index.html", "<p>home</p>"),
            ("sitemap.xml", sitemap.as_str()),
            ("atom.xml", atom.as_str()),
            ("posts/a.html", "<p>a</p>"),
        ])
    };

    let comparison = compare(&build(), &build()).await;
    assert!(comparison.is_empty(), "{:?}", comparison);
}

#[tokio::test]
async fn test_removed_pages_and_changed_ids_are_reported() {
    let old_sitemap = sitemap(&["/", "/posts/a.html", "/posts/b.html"]);
    let old_atom = atom(&[("/posts/a.html", "urn:post:a"), ("/posts/b.html", "urn:post:b")]);
    let old = site(&[
        ("index.html", "<p>home</p>"),
        ("sitemap.xml", old_sitemap.as_str()),
        ("atom.xml", old_atom.as_str()),
        ("posts/a.html", "<p>a</p>"),
        ("posts/b.html", "<p>b</p>"),
    ]);

    let new_sitemap = sitemap(&["/", "/posts/a.html"]);
    let new_atom = atom(&[("/posts/a.html", "tag:example.com,2024:a")]);
    let new = site(&[
        ("index.html", "<p>home</p>"),
        ("sitemap.xml", new_sitemap.as_str()),
        ("atom.xml", new_atom.as_str()),
        ("posts/a.html", "<p>a</p>"),
    ]);

    let comparison = compare(&new, &old).await;

    let removed: Vec<_> = comparison
        .removed_permanent_urls
        .iter()
        .map(|link| link.url.as_str())
        .collect();
    assert_eq!(removed, vec!["https://example.com/posts/b.html"]);

    assert_eq!(comparison.feed_guids_changed.len(), 1);
    let change = &comparison.feed_guids_changed[0];
    assert_eq!(change.url, "https://example.com/posts/a.html");
    assert_eq!(change.feed_url, "https://example.com/atom.xml");
    assert_eq!(change.original_guid, "urn:post:a");
    assert_eq!(change.new_guid, "tag:example.com,2024:a");

    assert!(comparison.non_forward_compatible_json_links.is_empty());
}
