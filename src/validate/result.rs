//! The finding taxonomy produced by validation
//!
//! Every content problem found in a site is one [`ValidationResult`]. The
//! serialized form is tagged with `type` in SCREAMING_SNAKE_CASE and uses
//! camelCase field names, which is what the JSON output of the CLI prints.

use crate::extract::srcset::Descriptor;
use crate::model::{ElementLocation, LinkLocation};
use serde::{Deserialize, Serialize};

/// A link, identified by its target URL and where it was found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkErrorLocation {
    pub url: String,
    pub location: LinkLocation,
}

/// A seed, identified by its position in the seed list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedLocation {
    pub url: String,
    pub index: usize,
}

/// A whole resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLocation {
    pub url: String,
}

/// One element of an HTML page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementInPage {
    pub url: String,
    pub location: ElementLocation,
}

/// One message of the HTML/CSS/SVG conformance checker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VnuMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_column: Option<u32>,
}

/// One message of the EPUB structural checker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpubcheckMessage {
    #[serde(rename = "ID")]
    pub id: String,
    pub severity: String,
    pub message: String,
    #[serde(default)]
    pub locations: Vec<EpubcheckLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpubcheckLocation {
    pub path: String,
    #[serde(default)]
    pub line: i64,
    #[serde(default)]
    pub column: i64,
}

/// An `<img>` candidate as it was evaluated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageCandidate {
    pub url: String,
    pub external: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<Descriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A content problem found in the site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ValidationResult {
    TargetNotFound {
        location: LinkErrorLocation,
    },
    HashPointsToNonDocument {
        location: LinkErrorLocation,
    },
    HashTargetNotFound {
        location: LinkErrorLocation,
    },
    LinkPointsToNonDocument {
        location: LinkErrorLocation,
    },
    ContentTypeMismatch {
        expected_content_types: Vec<String>,
        actual_content_type: Option<String>,
        location: LinkErrorLocation,
    },
    /// A redirect whose target redirects again
    RedirectChain {
        target_url: String,
        location: LinkErrorLocation,
    },
    NotFound {
        location: SeedLocation,
    },
    JsonLdUnparseable {
        location: ElementInPage,
    },
    Vnu {
        object: VnuMessage,
        location: PageLocation,
    },
    Epubcheck {
        object: EpubcheckMessage,
        location: PageLocation,
    },
    PdfCanNotBeParsed {
        message: String,
        location: PageLocation,
    },
    JsonFileUnparseable {
        location: PageLocation,
    },
    XmlFileUnparseable {
        location: PageLocation,
    },
    MultipleCanonicalLinks {
        url: String,
        canonical_links: Vec<ElementLocation>,
    },
    NonRedirectDifferentCanonical {
        canonical_link: String,
        location: PageLocation,
    },
    RedirectDifferentCanonical {
        url: String,
        redirect_target: String,
        canonical_target: String,
    },
    ImgSrcInvalid {
        location: ElementInPage,
        src: Option<ImageCandidate>,
        srcset: Option<Vec<ImageCandidate>>,
        sizes: Option<String>,
    },
    RobotsTxtHostInvalid {
        url: String,
        expected_host: String,
        actual_host: String,
    },
    RobotsTxtSitemapInvalid {
        url: String,
        sitemap_url: String,
    },
    SitemapLinkInvalid {
        sitemap_url: String,
        url: String,
    },
    JsonDoesNotMatchSchema {
        url: String,
        message: String,
        instance_path: String,
        schema: serde_json::Value,
    },
    JsonLdDoesNotMatchSchema {
        url: String,
        filter: serde_json::Value,
        message: String,
        instance_path: String,
        schema: serde_json::Value,
    },
    JsonLdDoesNotMatchOccurrenceRequirement {
        url: String,
        filter: serde_json::Value,
        min_occurrence: Option<usize>,
        max_occurrence: Option<usize>,
        actual_occurrence: usize,
    },
    AdditionalValidatorMatchNumberOutsideExpectedRange {
        url_pattern: String,
        min_matches: Option<usize>,
        max_matches: Option<usize>,
        actual_matches: usize,
    },
    /// An id shared by more than one element of a page
    MultipleIds {
        url: String,
        id: String,
        elements: Vec<ElementLocation>,
    },
}

impl ValidationResult {
    /// The serialized `type` tag, e.g. `TARGET_NOT_FOUND`
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationResult::TargetNotFound { .. } => "TARGET_NOT_FOUND",
            ValidationResult::HashPointsToNonDocument { .. } => "HASH_POINTS_TO_NON_DOCUMENT",
            ValidationResult::HashTargetNotFound { .. } => "HASH_TARGET_NOT_FOUND",
            ValidationResult::LinkPointsToNonDocument { .. } => "LINK_POINTS_TO_NON_DOCUMENT",
            ValidationResult::ContentTypeMismatch { .. } => "CONTENT_TYPE_MISMATCH",
            ValidationResult::RedirectChain { .. } => "REDIRECT_CHAIN",
            ValidationResult::NotFound { .. } => "NOT_FOUND",
            ValidationResult::JsonLdUnparseable { .. } => "JSON_LD_UNPARSEABLE",
            ValidationResult::Vnu { .. } => "VNU",
            ValidationResult::Epubcheck { .. } => "EPUBCHECK",
            ValidationResult::PdfCanNotBeParsed { .. } => "PDF_CAN_NOT_BE_PARSED",
            ValidationResult::JsonFileUnparseable { .. } => "JSON_FILE_UNPARSEABLE",
            ValidationResult::XmlFileUnparseable { .. } => "XML_FILE_UNPARSEABLE",
            ValidationResult::MultipleCanonicalLinks { .. } => "MULTIPLE_CANONICAL_LINKS",
            ValidationResult::NonRedirectDifferentCanonical { .. } => {
                "NON_REDIRECT_DIFFERENT_CANONICAL"
            }
            ValidationResult::RedirectDifferentCanonical { .. } => "REDIRECT_DIFFERENT_CANONICAL",
            ValidationResult::ImgSrcInvalid { .. } => "IMG_SRC_INVALID",
            ValidationResult::RobotsTxtHostInvalid { .. } => "ROBOTS_TXT_HOST_INVALID",
            ValidationResult::RobotsTxtSitemapInvalid { .. } => "ROBOTS_TXT_SITEMAP_INVALID",
            ValidationResult::SitemapLinkInvalid { .. } => "SITEMAP_LINK_INVALID",
            ValidationResult::JsonDoesNotMatchSchema { .. } => "JSON_DOES_NOT_MATCH_SCHEMA",
            ValidationResult::JsonLdDoesNotMatchSchema { .. } => "JSON_LD_DOES_NOT_MATCH_SCHEMA",
            ValidationResult::JsonLdDoesNotMatchOccurrenceRequirement { .. } => {
                "JSON_LD_DOES_NOT_MATCH_OCCURRENCE_REQUIREMENT"
            }
            ValidationResult::AdditionalValidatorMatchNumberOutsideExpectedRange { .. } => {
                "ADDITIONAL_VALIDATOR_MATCH_NUMBER_OUTSIDE_EXPECTED_RANGE"
            }
            ValidationResult::MultipleIds { .. } => "MULTIPLE_IDS",
        }
    }

    /// The URL the finding is about, if it concerns a single resource or link
    pub fn url(&self) -> Option<&str> {
        match self {
            ValidationResult::TargetNotFound { location }
            | ValidationResult::HashPointsToNonDocument { location }
            | ValidationResult::HashTargetNotFound { location }
            | ValidationResult::LinkPointsToNonDocument { location }
            | ValidationResult::ContentTypeMismatch { location, .. }
            | ValidationResult::RedirectChain { location, .. } => Some(&location.url),
            ValidationResult::NotFound { location } => Some(&location.url),
            ValidationResult::JsonLdUnparseable { location }
            | ValidationResult::ImgSrcInvalid { location, .. } => Some(&location.url),
            ValidationResult::Vnu { location, .. }
            | ValidationResult::Epubcheck { location, .. }
            | ValidationResult::PdfCanNotBeParsed { location, .. }
            | ValidationResult::JsonFileUnparseable { location }
            | ValidationResult::XmlFileUnparseable { location }
            | ValidationResult::NonRedirectDifferentCanonical { location, .. } => {
                Some(&location.url)
            }
            ValidationResult::MultipleCanonicalLinks { url, .. }
            | ValidationResult::RedirectDifferentCanonical { url, .. }
            | ValidationResult::RobotsTxtHostInvalid { url, .. }
            | ValidationResult::RobotsTxtSitemapInvalid { url, .. }
            | ValidationResult::SitemapLinkInvalid { url, .. }
            | ValidationResult::JsonDoesNotMatchSchema { url, .. }
            | ValidationResult::JsonLdDoesNotMatchSchema { url, .. }
            | ValidationResult::JsonLdDoesNotMatchOccurrenceRequirement { url, .. }
            | ValidationResult::MultipleIds { url, .. } => Some(url),
            ValidationResult::AdditionalValidatorMatchNumberOutsideExpectedRange { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_tag_matches_kind() {
        let result = ValidationResult::RedirectChain {
            target_url: "https://example.com/c.html".to_string(),
            location: LinkErrorLocation {
                url: "https://example.com/b.html".to_string(),
                location: LinkLocation::Redirect,
            },
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], result.kind());
        assert_eq!(
            value,
            json!({
                "type": "REDIRECT_CHAIN",
                "targetUrl": "https://example.com/c.html",
                "location": {
                    "url": "https://example.com/b.html",
                    "location": {"type": "redirect"},
                },
            })
        );
        assert_eq!(result.url(), Some("https://example.com/b.html"));
    }

    #[test]
    fn test_match_count_finding_has_no_url() {
        let result = ValidationResult::AdditionalValidatorMatchNumberOutsideExpectedRange {
            url_pattern: "^/blog/".to_string(),
            min_matches: Some(1),
            max_matches: None,
            actual_matches: 0,
        };
        assert_eq!(result.url(), None);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["urlPattern"], "^/blog/");
        assert_eq!(value["minMatches"], 1);
        assert_eq!(value["actualMatches"], 0);
    }

    #[test]
    fn test_vnu_message_deserializes_checker_output() {
        let message: VnuMessage = serde_json::from_value(json!({
            "type": "error",
            "lastLine": 3,
            "lastColumn": 10,
            "firstColumn": 4,
            "message": "Stray end tag “div”.",
            "extract": "</div>",
            "hiliteStart": 0,
            "hiliteLength": 6,
        }))
        .unwrap();

        assert_eq!(message.kind, "error");
        assert_eq!(message.last_line, Some(3));
        assert_eq!(message.first_line, None);
    }
}
