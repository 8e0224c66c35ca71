//! Link validation against the crawl graph

use crate::model::{content_type_essence, Assertion, Link};
use crate::validate::context::ValidationContext;
use crate::validate::result::{LinkErrorLocation, ValidationResult};
use crate::Result;
use percent_encoding::percent_decode_str;
use url::Url;

/// Checks one link against the resource it points to
///
/// External links are not checked. The checks are independent: a link can get
/// several findings, except that a missing target stops after
/// `TARGET_NOT_FOUND`.
///
/// # Errors
///
/// An internal link without a graph entry is fatal, as is a malformed redirect
/// page (more than one meta refresh).
pub fn check_link(ctx: &ValidationContext, link: &Link) -> Result<Vec<ValidationResult>> {
    if !ctx.is_internal(&link.url) {
        return Ok(Vec::new());
    }

    let location = || LinkErrorLocation {
        url: link.url.clone(),
        location: link.location.clone(),
    };

    let entry = ctx.entry(&link.url)?;
    let Some(target) = entry.found() else {
        return Ok(vec![ValidationResult::TargetNotFound {
            location: location(),
        }]);
    };

    let mut results = Vec::new();

    if link.location.is_redirect() {
        if let Some(next) = ctx.redirect(&target)? {
            results.push(ValidationResult::RedirectChain {
                target_url: next,
                location: location(),
            });
        }
    }

    if let Some(hash) = fragment(&link.url) {
        match ctx.page(&target)? {
            Some(page) => {
                let decoded = percent_decode_str(&hash).decode_utf8_lossy();
                if !page.has_id(&hash) && !page.has_id(&decoded) {
                    results.push(ValidationResult::HashTargetNotFound {
                        location: location(),
                    });
                }
            }
            None => results.push(ValidationResult::HashPointsToNonDocument {
                location: location(),
            }),
        }
    }

    let actual_content_type = target.content_type();
    for assertion in &link.asserts {
        match assertion {
            Assertion::ContentType { content_type } => {
                let allowed = content_type
                    .iter()
                    .any(|expected| Some(content_type_essence(expected)) == actual_content_type);
                if !allowed {
                    results.push(ValidationResult::ContentTypeMismatch {
                        expected_content_types: content_type.clone(),
                        actual_content_type: actual_content_type.clone(),
                        location: location(),
                    });
                }
            }
            Assertion::Document if !target.is_html() => {
                results.push(ValidationResult::LinkPointsToNonDocument {
                    location: location(),
                });
            }
            _ => {}
        }
    }

    Ok(results)
}

/// The non-empty fragment of a URL, without the `#`
fn fragment(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .fragment()
        .filter(|hash| !hash.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{ResponseMeta, TargetConfig};
    use crate::model::{ElementLocation, LinkLocation, UrlRole};
    use crate::validate::context::test_support::{crawl_context, crawl_context_with, write_site};
    use crate::ValidatorError;
    use tempfile::TempDir;

    fn link(url: &str, asserts: Vec<Assertion>) -> Link {
        Link {
            url: url.to_string(),
            role: UrlRole::Asset,
            asserts,
            location: LinkLocation::Html {
                element: ElementLocation {
                    outer_html: "<a></a>".to_string(),
                    selector: "html > body > a".to_string(),
                },
            },
        }
    }

    #[tokio::test]
    async fn test_missing_target_stops_further_checks() {
        let dir = TempDir::new().unwrap();
        write_site(
            dir.path(),
            &[("index.html", r#"<a href="missing.html#x">m</a>"#)],
        );
        let ctx = crawl_context(dir.path()).await;

        let results = check_link(
            &ctx,
            &link(
                "https://example.com/missing.html#x",
                vec![Assertion::Document],
            ),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind(), "TARGET_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_hash_targets() {
        let dir = TempDir::new().unwrap();
        write_site(
            dir.path(),
            &[
                (
                    "index.html",
                    r#"<a href="about.html#team">t</a><a href="logo.png#x">l</a><h2 id="café">c</h2>"#,
                ),
                ("about.html", r#"<section id="team">Team</section>"#),
                ("logo.png", "not really a png"),
            ],
        );
        let ctx = crawl_context(dir.path()).await;

        let ok = check_link(&ctx, &link("https://example.com/about.html#team", vec![])).unwrap();
        assert!(ok.is_empty());

        let missing = check_link(&ctx, &link("https://example.com/about.html#nope", vec![])).unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].kind(), "HASH_TARGET_NOT_FOUND");

        let non_document = check_link(&ctx, &link("https://example.com/logo.png#x", vec![])).unwrap();
        assert_eq!(non_document.len(), 1);
        assert_eq!(non_document[0].kind(), "HASH_POINTS_TO_NON_DOCUMENT");

        // The id is matched either as written or percent-decoded
        let encoded = check_link(&ctx, &link("https://example.com/#caf%C3%A9", vec![])).unwrap();
        assert!(encoded.is_empty());
    }

    #[tokio::test]
    async fn test_assertions_are_all_reported() {
        let dir = TempDir::new().unwrap();
        write_site(
            dir.path(),
            &[
                ("index.html", r#"<a href="data.json">d</a>"#),
                ("data.json", "{}"),
            ],
        );
        let ctx = crawl_context(dir.path()).await;

        let results = check_link(
            &ctx,
            &link(
                "https://example.com/data.json",
                vec![
                    Assertion::ContentType {
                        content_type: vec!["text/html".to_string()],
                    },
                    Assertion::Document,
                ],
            ),
        )
        .unwrap();

        let kinds: Vec<_> = results.iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec!["CONTENT_TYPE_MISMATCH", "LINK_POINTS_TO_NON_DOCUMENT"]);

        let matching = check_link(
            &ctx,
            &link(
                "https://example.com/data.json",
                vec![Assertion::ContentType {
                    content_type: vec!["Application/JSON; charset=utf-8".to_string()],
                }],
            ),
        )
        .unwrap();
        assert!(matching.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_chain() {
        let dir = TempDir::new().unwrap();
        write_site(
            dir.path(),
            &[
                ("index.html", r#"<a href="a.html">a</a><a href="direct.html">d</a>"#),
                ("a.html", r#"<meta http-equiv="refresh" content="0; url=b.html">"#),
                ("b.html", r#"<meta http-equiv="refresh" content="0; url=c.html">"#),
                ("c.html", "<p>end</p>"),
                ("direct.html", "<p>no redirect</p>"),
            ],
        );
        let ctx = crawl_context(dir.path()).await;

        let redirect = |url: &str| Link {
            url: url.to_string(),
            role: UrlRole::Document,
            asserts: vec![],
            location: LinkLocation::Redirect,
        };

        let chain = check_link(&ctx, &redirect("https://example.com/b.html")).unwrap();
        assert_eq!(
            chain,
            vec![ValidationResult::RedirectChain {
                target_url: "https://example.com/c.html".to_string(),
                location: LinkErrorLocation {
                    url: "https://example.com/b.html".to_string(),
                    location: LinkLocation::Redirect,
                },
            }]
        );

        let terminal = check_link(&ctx, &redirect("https://example.com/c.html")).unwrap();
        assert!(terminal.is_empty());
    }

    #[tokio::test]
    async fn test_http_redirect_chain() {
        let dir = TempDir::new().unwrap();
        write_site(
            dir.path(),
            &[("index.html", r#"<a href="old.html">o</a>"#), ("old.html", "")],
        );
        let target = TargetConfig::new(dir.path()).with_response_meta(|path| {
            if path == "/old.html" {
                ResponseMeta {
                    status: 301,
                    headers: vec![("location".to_string(), "/elsewhere.html".to_string())],
                }
            } else {
                crate::crawler::default_response_meta(path)
            }
        });
        let ctx = crawl_context_with(target, vec![]).await;

        let results = check_link(
            &ctx,
            &Link {
                url: "https://example.com/old.html".to_string(),
                role: UrlRole::Document,
                asserts: vec![],
                location: LinkLocation::Redirect,
            },
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind(), "REDIRECT_CHAIN");
    }

    #[tokio::test]
    async fn test_external_links_are_skipped_and_missing_entries_fatal() {
        let dir = TempDir::new().unwrap();
        write_site(dir.path(), &[("index.html", "<p>x</p>")]);
        let ctx = crawl_context(dir.path()).await;

        assert!(check_link(&ctx, &link("https://other.com/x.html", vec![]))
            .unwrap()
            .is_empty());
        assert!(matches!(
            check_link(&ctx, &link("https://example.com/never-crawled.html", vec![])),
            Err(ValidatorError::MissingGraphEntry { .. })
        ));
    }
}
