//! Integration tests for site validation

use crate::common::{home_seed, kinds, options, site, validate_site, write, write_png, BASE_URL};
use site_validator::config::load_config;
use site_validator::validate::{LinkErrorLocation, SeedLocation};
use site_validator::{validate, Extras, LinkLocation, Seed, UrlRole, ValidationResult};

#[tokio::test]
async fn test_clean_site_has_no_findings() {
    let dir = site(&[
        (
            "index.html",
            r#"<html><head>
            <link rel="canonical" href="https://example.com/">
            <link rel="stylesheet" href="/css/main.css">
            <link rel="alternate" type="application/rss+xml" href="/feed.rss">
            <script type="application/ld+json">{"@type": "WebSite", "url": "https://example.com/"}</script>
            </head><body>
            <a href="/blog/#latest">Blog</a>
            <a href="https://other.com/missing">External links are not checked</a>
            </body></html>"#,
        ),
        ("css/main.css", "h1 { color: red; }"),
        ("blog/index.html", r#"<h2 id="latest">Latest</h2>"#),
        (
            "feed.rss",
            r#"<?xml version="1.0"?><rss version="2.0"><channel><item><link>https://example.com/blog/</link><guid>post-1</guid></item></channel></rss>"#,
        ),
    ]);

    let findings = validate_site(&dir, &home_seed()).await;
    assert_eq!(findings, vec![]);
}

#[tokio::test]
async fn test_broken_site_reports_each_problem() {
    let dir = site(&[
        (
            "index.html",
            r#"<body>
            <a href="/missing.html">Missing</a>
            <a href="/about.html#nowhere">Bad hash</a>
            <a href="/data.json">Data</a>
            <a href="/moved.html">Moved</a>
            <p id="dup">one</p><p id="dup">two</p>
            </body>"#,
        ),
        ("about.html", r#"<h2 id="team">Team</h2>"#),
        ("data.json", "{ not json"),
        (
            "moved.html",
            r#"<meta http-equiv="refresh" content="0; url=/moved-again.html">"#,
        ),
        (
            "moved-again.html",
            r#"<meta http-equiv="refresh" content="0; url=/about.html">"#,
        ),
    ]);

    let findings = validate_site(&dir, &home_seed()).await;
    let found = kinds(&findings);

    for expected in [
        "MULTIPLE_IDS",
        "JSON_FILE_UNPARSEABLE",
        "TARGET_NOT_FOUND",
        "HASH_TARGET_NOT_FOUND",
        "REDIRECT_CHAIN",
    ] {
        assert!(found.contains(&expected), "missing {} in {:?}", expected, found);
    }

    assert!(findings.contains(&ValidationResult::RedirectChain {
        target_url: "https://example.com/about.html".to_string(),
        location: LinkErrorLocation {
            url: "https://example.com/moved-again.html".to_string(),
            location: LinkLocation::Redirect,
        },
    }));

    // Resource findings come before link findings
    let first_link_finding = found
        .iter()
        .position(|kind| *kind == "TARGET_NOT_FOUND")
        .unwrap();
    let last_page_finding = found
        .iter()
        .rposition(|kind| *kind == "MULTIPLE_IDS" || *kind == "JSON_FILE_UNPARSEABLE")
        .unwrap();
    assert!(last_page_finding < first_link_finding);
}

#[tokio::test]
async fn test_missing_seeds_are_reported_by_index() {
    let dir = site(&[("index.html", "<p>home</p>")]);
    let seeds = vec![
        Seed::new("https://example.com/", UrlRole::Document),
        Seed::new("https://example.com/sitemap.xml", UrlRole::Sitemap),
    ];

    let findings = validate_site(&dir, &seeds).await;
    assert_eq!(
        findings,
        vec![ValidationResult::NotFound {
            location: SeedLocation {
                url: "https://example.com/sitemap.xml".to_string(),
                index: 1,
            },
        }]
    );
}

#[tokio::test]
async fn test_responsive_image_densities() {
    let dir = site(&[(
        "index.html",
        r#"<img src="/img/good-1x.png" srcset="/img/good-2x.png 2x">
        <img src="/img/bad-1x.png" srcset="/img/bad-2x.png 2x">"#,
    )]);
    write_png(dir.path(), "img/good-1x.png", 50, 25);
    write_png(dir.path(), "img/good-2x.png", 100, 50);
    write_png(dir.path(), "img/bad-1x.png", 60, 30);
    write_png(dir.path(), "img/bad-2x.png", 100, 50);

    let findings = validate_site(&dir, &home_seed()).await;
    assert_eq!(kinds(&findings), vec!["IMG_SRC_INVALID"]);

    let ValidationResult::ImgSrcInvalid { src, .. } = &findings[0] else {
        panic!("expected an image finding");
    };
    assert_eq!(
        src.as_ref().map(|candidate| candidate.url.as_str()),
        Some("https://example.com/img/bad-1x.png")
    );
}

#[tokio::test]
async fn test_validation_from_config_file() {
    let dir = site(&[
        (
            "dist/index.html",
            r#"<a href="/api/posts.json">Posts</a><a href="/old.html">Old</a>"#,
        ),
        ("dist/api/posts.json", r#"{"posts": [{"title": "no url"}]}"#),
        ("dist/new.html", "<p>new</p>"),
        ("sitemaps/extra.txt", "https://example.com/new.html\n"),
    ]);
    write(
        dir.path(),
        "site-validator.toml",
        r#"
[site]
base-url = "https://example.com"
dir = "dist"

[[seed]]
url = "https://example.com/"
role = { type = "document" }

[extras]
txt-sitemaps = ["sitemaps/extra.txt"]

[[response]]
pattern = "^/old\\.html$"
status = 301
headers = { location = "/new.html" }

[[validator]]
url-pattern = "^/api/.*\\.json$"
min-matches = 1
config = { type = "json", schema = { type = "object", properties = { posts = { type = "array", items = { required = ["url"] } } } } }

[[validator]]
url-pattern = "^/feeds/"
min-matches = 1
config = { type = "json", schema = {} }
"#,
    );
    // The redirect source only needs to exist on disk
    write(dir.path(), "dist/old.html", "");

    let config = load_config(&dir.path().join("site-validator.toml")).unwrap();
    let findings = validate(
        &options(),
        BASE_URL,
        config.target().unwrap(),
        &config.seeds,
        &config.extras().unwrap(),
        &config.additional_validators().unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(
        kinds(&findings),
        vec![
            "JSON_DOES_NOT_MATCH_SCHEMA",
            "ADDITIONAL_VALIDATOR_MATCH_NUMBER_OUTSIDE_EXPECTED_RANGE",
        ]
    );
    let ValidationResult::JsonDoesNotMatchSchema { url, instance_path, .. } = &findings[0] else {
        panic!("expected a schema finding");
    };
    assert_eq!(url, "https://example.com/api/posts.json");
    assert_eq!(instance_path, "/posts/0");
}

#[tokio::test]
async fn test_external_extra_url_aborts() {
    let dir = site(&[("index.html", "<p>home</p>")]);
    let extras = Extras {
        urls: vec!["https://other.com/".to_string()],
        ..Extras::default()
    };

    let result = validate(
        &options(),
        BASE_URL,
        site_validator::TargetConfig::new(dir.path()),
        &home_seed(),
        &extras,
        &[],
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_xml_with_doctype_is_parsed() {
    let dir = site(&[
        (
            "index.html",
            r#"<head><link rel="alternate" type="application/rss+xml" href="/feed.rss"></head>
            <body><a href="/data.xml">Data</a></body>"#,
        ),
        (
            "data.xml",
            r#"<?xml version="1.0"?><!DOCTYPE note SYSTEM "note.dtd"><note>hi</note>"#,
        ),
        (
            "feed.rss",
            r#"<?xml version="1.0"?>
<!DOCTYPE rss PUBLIC "-//Netscape Communications//DTD RSS 0.91//EN"
  "http://my.netscape.com/publish/formats/rss-0.91.dtd">
<rss version="0.91"><channel>
  <item><title>gone</title><link>https://example.com/gone.html</link></item>
</channel></rss>"#,
        ),
    ]);

    let findings = validate_site(&dir, &home_seed()).await;
    assert_eq!(kinds(&findings), vec!["TARGET_NOT_FOUND"]);
    assert_eq!(findings[0].url(), Some("https://example.com/gone.html"));
}

#[tokio::test]
async fn test_malformed_feed_is_reported_without_aborting() {
    let dir = site(&[
        (
            "index.html",
            r#"<head><link rel="alternate" type="application/atom+xml" href="/feed.atom"></head>"#,
        ),
        ("feed.atom", "<feed><entry><link href=\"/gone.html\"/>"),
    ]);

    let findings = validate_site(&dir, &home_seed()).await;
    assert_eq!(kinds(&findings), vec!["XML_FILE_UNPARSEABLE"]);
    assert_eq!(findings[0].url(), Some("https://example.com/feed.atom"));
}
