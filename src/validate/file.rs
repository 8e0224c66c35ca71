//! Per-resource validation, dispatched on content type and role
//!
//! Runs once per found resource of the crawl graph. The content-type branches
//! are exclusive and tried in order: HTML, EPUB, PDF, JSON, CSS, SVG, then the
//! robots.txt and sitemap roles, then generic XML. Redirect canonicals and
//! additional validators are checked on top of that.

use crate::crawler::GraphEntry;
use crate::extract::html::PageElements;
use crate::extract::read_text;
use crate::extract::sitemap::{parse_xml, urls_from_sitemap, SitemapKind};
use crate::model::{FoundFetchResult, SitemapSource};
use crate::robots::RobotsTxt;
use crate::url::{host_with_port, to_relative_url};
use crate::validate::additional::AdditionalValidator;
use crate::validate::checkers::MarkupKind;
use crate::validate::context::ValidationContext;
use crate::validate::image::check_images;
use crate::validate::result::{ElementInPage, PageLocation, ValidationResult};
use crate::Result;
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;

/// Validates one found resource of the graph
///
/// # Errors
///
/// Only fatal conditions: unreadable files, an external checker that cannot
/// run, or a graph that lacks an entry for a linked image.
pub fn validate_file(ctx: &ValidationContext, entry: &GraphEntry) -> Result<Vec<ValidationResult>> {
    let Some(res) = entry.found() else {
        return Ok(Vec::new());
    };
    let url = entry.url.as_str();
    tracing::debug!("Validating {}", url);

    let page = ctx.page(&res)?;
    let redirect = ctx.redirect(&res)?;

    let mut results = Vec::new();

    if let (Some(redirect), Some(page)) = (&redirect, &page) {
        results.extend(check_redirect_canonical(ctx, url, redirect, page));
    }

    let content_type = res.content_type().unwrap_or_default();
    let location = || PageLocation {
        url: url.to_string(),
    };

    if let Some(page) = &page {
        results.extend(check_html(ctx, url, &res, redirect.is_some(), page)?);
    } else if content_type == "application/epub+zip" {
        for object in ctx.checker.check_epub(&res.data.path)? {
            results.push(ValidationResult::Epubcheck {
                object,
                location: location(),
            });
        }
    } else if content_type == "application/pdf" {
        if let Some(message) = pdf_error(&res.data.path) {
            results.push(ValidationResult::PdfCanNotBeParsed {
                message,
                location: location(),
            });
        }
    } else if is_json_type(&content_type) {
        if parse_json_file(&res.data.path)?.is_none() {
            results.push(ValidationResult::JsonFileUnparseable {
                location: location(),
            });
        }
    } else if content_type == "text/css" || content_type == "image/svg+xml" {
        let kind = if content_type == "text/css" {
            MarkupKind::Css
        } else {
            MarkupKind::Svg
        };
        for object in ctx.checker.check_markup(&res.data.path, kind)? {
            results.push(ValidationResult::Vnu {
                object,
                location: location(),
            });
        }
    } else if entry.has_role("robotstxt") {
        results.extend(check_robots(ctx, url, &read_text(&res.data.path)?));
    } else if entry.has_role("sitemap") {
        results.extend(check_sitemap(ctx, url, &read_text(&res.data.path)?));
    } else if is_xml_type(&content_type) {
        if parse_xml(&read_text(&res.data.path)?).is_err() {
            results.push(ValidationResult::XmlFileUnparseable {
                location: location(),
            });
        }
    }

    let relative_url = to_relative_url(&ctx.base_url, url);
    let matching: Vec<&AdditionalValidator> = ctx
        .validators
        .iter()
        .filter(|validator| validator.matches(&relative_url))
        .collect();
    if !matching.is_empty() {
        results.extend(run_additional_validators(url, &res, page.as_deref(), &matching)?);
    }

    Ok(results)
}

/// `application/json` and `application/*+json`
fn is_json_type(content_type: &str) -> bool {
    content_type == "application/json"
        || (content_type.starts_with("application/") && content_type.ends_with("+json"))
}

/// `application/xml` and any `*+xml`
fn is_xml_type(content_type: &str) -> bool {
    content_type == "application/xml" || content_type.ends_with("+xml")
}

/// Compares a canonical href and a redirect target, each canonicalized if internal
fn check_redirect_canonical(
    ctx: &ValidationContext,
    url: &str,
    redirect: &str,
    page: &PageElements,
) -> Option<ValidationResult> {
    let canonicals = page.canonical_links();
    let first = canonicals.first()?;
    let href = first.attr("href").unwrap_or_default();

    let normalize = |target: &str| {
        if ctx.is_internal(target) {
            ctx.canonical(target)
        } else {
            target.to_string()
        }
    };
    let canonical_target = if href.is_empty() {
        String::new()
    } else {
        normalize(href)
    };

    if canonical_target == normalize(redirect) {
        return None;
    }
    Some(ValidationResult::RedirectDifferentCanonical {
        url: url.to_string(),
        redirect_target: redirect.to_string(),
        canonical_target: href.to_string(),
    })
}

fn check_html(
    ctx: &ValidationContext,
    url: &str,
    res: &FoundFetchResult,
    is_redirect: bool,
    page: &PageElements,
) -> Result<Vec<ValidationResult>> {
    let mut results = Vec::new();

    for object in ctx.checker.check_markup(&res.data.path, MarkupKind::Html)? {
        results.push(ValidationResult::Vnu {
            object,
            location: PageLocation {
                url: url.to_string(),
            },
        });
    }

    let canonicals = page.canonical_links();
    match canonicals.as_slice() {
        [] => {}
        [canonical] if !is_redirect => {
            let href = canonical.attr("href").unwrap_or_default();
            let target = if href.is_empty() {
                String::new()
            } else {
                ctx.canonical(href)
            };
            if target != url {
                results.push(ValidationResult::NonRedirectDifferentCanonical {
                    canonical_link: href.to_string(),
                    location: PageLocation {
                        url: url.to_string(),
                    },
                });
            }
        }
        [_] => {}
        many => results.push(ValidationResult::MultipleCanonicalLinks {
            url: url.to_string(),
            canonical_links: many.iter().map(|link| link.element.clone()).collect(),
        }),
    }

    for script in page.json_ld_scripts() {
        if serde_json::from_str::<Value>(&script.text).is_err() {
            results.push(ValidationResult::JsonLdUnparseable {
                location: ElementInPage {
                    url: url.to_string(),
                    location: script.element.clone(),
                },
            });
        }
    }

    results.extend(check_images(ctx, url, page)?);
    results.extend(duplicate_ids(url, page));

    Ok(results)
}

/// One finding per id carried by more than one element
fn duplicate_ids(url: &str, page: &PageElements) -> Vec<ValidationResult> {
    let mut by_id: IndexMap<&str, Vec<_>> = IndexMap::new();
    for (id, element) in &page.ids {
        by_id.entry(id.as_str()).or_default().push(element.clone());
    }

    by_id
        .into_iter()
        .filter(|(_, elements)| elements.len() > 1)
        .map(|(id, elements)| ValidationResult::MultipleIds {
            url: url.to_string(),
            id: id.to_string(),
            elements,
        })
        .collect()
}

/// Loads a PDF and its page tree, returning the parser error if any
fn pdf_error(path: &Path) -> Option<String> {
    match lopdf::Document::load(path) {
        Ok(document) if document.get_pages().is_empty() => Some("document has no pages".to_string()),
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    }
}

/// Reads a file as JSON, `None` if it does not parse
fn parse_json_file(path: &Path) -> Result<Option<Value>> {
    Ok(serde_json::from_str(&read_text(path)?).ok())
}

fn check_robots(ctx: &ValidationContext, url: &str, content: &str) -> Vec<ValidationResult> {
    let robots = RobotsTxt::parse(content);
    let mut results = Vec::new();

    let expected_host = host_with_port(&ctx.base_url);
    if let Some(host) = robots.host.filter(|host| *host != expected_host) {
        results.push(ValidationResult::RobotsTxtHostInvalid {
            url: url.to_string(),
            expected_host,
            actual_host: host,
        });
    }

    for sitemap in robots.sitemaps {
        if !ctx.is_internal(&sitemap) {
            results.push(ValidationResult::RobotsTxtSitemapInvalid {
                url: url.to_string(),
                sitemap_url: sitemap,
            });
        }
    }

    results
}

/// Checks the raw listing of a sitemap, before any link resolution
fn check_sitemap(ctx: &ValidationContext, url: &str, content: &str) -> Vec<ValidationResult> {
    let kind = SitemapKind::from_url(url);
    match urls_from_sitemap(content, kind, SitemapSource::Url(url.to_string())) {
        Ok(links) => links
            .into_iter()
            .filter(|link| !ctx.is_internal(&link.url))
            .map(|link| ValidationResult::SitemapLinkInvalid {
                sitemap_url: url.to_string(),
                url: link.url,
            })
            .collect(),
        Err(e) => {
            tracing::debug!("Malformed sitemap {}: {}", url, e);
            vec![ValidationResult::XmlFileUnparseable {
                location: PageLocation {
                    url: url.to_string(),
                },
            }]
        }
    }
}

fn run_additional_validators(
    url: &str,
    res: &FoundFetchResult,
    page: Option<&PageElements>,
    validators: &[&AdditionalValidator],
) -> Result<Vec<ValidationResult>> {
    let mut results = Vec::new();

    let json_ld: Vec<Value> = if validators.iter().any(|v| v.needs_json_ld()) {
        page.map(|page| {
            page.json_ld_scripts()
                .filter_map(|script| serde_json::from_str(&script.text).ok())
                .collect()
        })
        .unwrap_or_default()
    } else {
        Vec::new()
    };

    let mut document: Option<Option<Value>> = None;
    for validator in validators {
        if validator.needs_json_ld() {
            results.extend(validator.check_json_ld(url, &json_ld));
        } else {
            if document.is_none() {
                document = Some(parse_json_file(&res.data.path)?);
            }
            results.extend(validator.check_json(url, document.as_ref().and_then(Option::as_ref)));
        }
    }

    Ok(results)
}
