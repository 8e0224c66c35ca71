//! Output module for rendering validation and comparison reports
//!
//! This module handles:
//! - Rendering findings as text lines or a JSON array
//! - Rendering version comparisons the same way
//! - Summarizing findings per type

pub mod stats;

pub use stats::{format_statistics, FindingStatistics};

use crate::compare::VersionComparison;
use crate::model::{Link, LinkLocation, SitemapSource};
use crate::validate::ValidationResult;
use std::fmt::Write;

/// How reports are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per finding, then a summary
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Renders validation findings
///
/// # Errors
///
/// Only JSON serialization can fail.
pub fn render_findings(findings: &[ValidationResult], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(findings),
        OutputFormat::Text => {
            let mut out = String::new();
            for finding in findings {
                let _ = writeln!(
                    out,
                    "{} {} {}",
                    finding.kind(),
                    finding.url().unwrap_or("-"),
                    describe(finding)
                );
            }
            if !findings.is_empty() {
                out.push('\n');
            }
            out.push_str(&format_statistics(&FindingStatistics::from_findings(findings)));
            Ok(out)
        }
    }
}

/// Renders the differences between two versions of a site
pub fn render_comparison(comparison: &VersionComparison, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(comparison),
        OutputFormat::Text => {
            let mut out = String::new();
            for link in &comparison.removed_permanent_urls {
                let _ = writeln!(out, "REMOVED_PERMANENT_URL {} {}", link.url, link_source(&link.location));
            }
            for link in &comparison.non_forward_compatible_json_links {
                let _ = writeln!(out, "NON_FORWARD_COMPATIBLE_JSON_LINK {} {}", link.url, json_source(link));
            }
            for change in &comparison.feed_guids_changed {
                let _ = writeln!(
                    out,
                    "FEED_GUID_CHANGED {} in {}: {} -> {}",
                    change.url, change.feed_url, change.original_guid, change.new_guid
                );
            }
            if comparison.is_empty() {
                out.push_str("No backward-incompatible changes.\n");
            } else {
                let _ = writeln!(
                    out,
                    "\n{} removed permanent URLs, {} non forward-compatible JSON links, {} feed GUID changes",
                    comparison.removed_permanent_urls.len(),
                    comparison.non_forward_compatible_json_links.len(),
                    comparison.feed_guids_changed.len()
                );
            }
            Ok(out)
        }
    }
}

fn json_source(link: &Link) -> String {
    match &link.location {
        LinkLocation::Json { json_url, query, .. } => format!("(query {} in {})", query, json_url),
        other => link_source(other),
    }
}

/// Where a link was found, in a few words
fn link_source(location: &LinkLocation) -> String {
    let sitemap = |source: &SitemapSource| match source {
        SitemapSource::Url(url) => url.clone(),
        SitemapSource::ExtraSitemap(index) => format!("extra sitemap #{}", index),
    };

    match location {
        LinkLocation::Html { element } => format!("(at {})", element.selector),
        LinkLocation::SitemapXml {
            sitemap: source,
            url_index,
            ..
        } => format!("(entry #{} of {})", url_index, sitemap(source)),
        LinkLocation::SitemapTxt { sitemap: source, index } => {
            format!("(line #{} of {})", index, sitemap(source))
        }
        LinkLocation::RobotsSitemap { index } => format!("(robots.txt sitemap #{})", index),
        LinkLocation::Rss { rss_url, link_index, .. } => format!("(item link #{} of {})", link_index, rss_url),
        LinkLocation::Atom { atom_url, link_index, .. } => {
            format!("(entry link #{} of {})", link_index, atom_url)
        }
        LinkLocation::Json { json_url, query, index } => {
            format!("(result #{} of {} in {})", index, query, json_url)
        }
        LinkLocation::Css { position, .. } => format!("(at {})", position),
        LinkLocation::ExtraUrl { index } => format!("(extra URL #{})", index),
        LinkLocation::Redirect => "(redirect)".to_string(),
    }
}

fn bounds(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{}..={}", min, max),
        (Some(min), None) => format!(">= {}", min),
        (None, Some(max)) => format!("<= {}", max),
        (None, None) => "any".to_string(),
    }
}

/// The detail column of a text finding
fn describe(finding: &ValidationResult) -> String {
    match finding {
        ValidationResult::TargetNotFound { location }
        | ValidationResult::HashPointsToNonDocument { location }
        | ValidationResult::HashTargetNotFound { location }
        | ValidationResult::LinkPointsToNonDocument { location } => link_source(&location.location),
        ValidationResult::ContentTypeMismatch {
            expected_content_types,
            actual_content_type,
            location,
        } => format!(
            "expected {} got {} {}",
            expected_content_types.join("|"),
            actual_content_type.as_deref().unwrap_or("none"),
            link_source(&location.location)
        ),
        ValidationResult::RedirectChain { target_url, location } => {
            format!("redirects to {} {}", target_url, link_source(&location.location))
        }
        ValidationResult::NotFound { location } => format!("seed #{}", location.index),
        ValidationResult::JsonLdUnparseable { location } => format!("at {}", location.location.selector),
        ValidationResult::Vnu { object, .. } => match object.first_line.or(object.last_line) {
            Some(line) => format!("{} (line {}): {}", object.kind, line, object.message),
            None => format!("{}: {}", object.kind, object.message),
        },
        ValidationResult::Epubcheck { object, .. } => {
            format!("{} {}: {}", object.severity, object.id, object.message)
        }
        ValidationResult::PdfCanNotBeParsed { message, .. } => message.clone(),
        ValidationResult::JsonFileUnparseable { .. } | ValidationResult::XmlFileUnparseable { .. } => {
            String::new()
        }
        ValidationResult::MultipleCanonicalLinks { canonical_links, .. } => {
            format!("{} canonical links", canonical_links.len())
        }
        ValidationResult::NonRedirectDifferentCanonical { canonical_link, .. } => {
            format!("canonical is {}", canonical_link)
        }
        ValidationResult::RedirectDifferentCanonical {
            redirect_target,
            canonical_target,
            ..
        } => format!("redirects to {} but canonical is {}", redirect_target, canonical_target),
        ValidationResult::ImgSrcInvalid { location, .. } => format!("at {}", location.location.selector),
        ValidationResult::RobotsTxtHostInvalid {
            expected_host,
            actual_host,
            ..
        } => format!("expected host {} got {}", expected_host, actual_host),
        ValidationResult::RobotsTxtSitemapInvalid { sitemap_url, .. } => {
            format!("sitemap {} is not internal", sitemap_url)
        }
        ValidationResult::SitemapLinkInvalid { sitemap_url, .. } => {
            format!("listed in {} but not internal", sitemap_url)
        }
        ValidationResult::JsonDoesNotMatchSchema {
            message,
            instance_path,
            ..
        }
        | ValidationResult::JsonLdDoesNotMatchSchema {
            message,
            instance_path,
            ..
        } => format!("at '{}': {}", instance_path, message),
        ValidationResult::JsonLdDoesNotMatchOccurrenceRequirement {
            min_occurrence,
            max_occurrence,
            actual_occurrence,
            ..
        } => format!(
            "{} blocks, expected {}",
            actual_occurrence,
            bounds(*min_occurrence, *max_occurrence)
        ),
        ValidationResult::AdditionalValidatorMatchNumberOutsideExpectedRange {
            url_pattern,
            min_matches,
            max_matches,
            actual_matches,
        } => format!(
            "{} matched {} URLs, expected {}",
            url_pattern,
            actual_matches,
            bounds(*min_matches, *max_matches)
        ),
        ValidationResult::MultipleIds { id, elements, .. } => {
            format!("id '{}' on {} elements", id, elements.len())
        }
    }
}
