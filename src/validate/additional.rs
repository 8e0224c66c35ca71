//! User-supplied validators matched by URL pattern
//!
//! A rule selects resources with a regex over their site-relative URL and
//! checks them with a JSON schema, either on the whole file (`json`) or on the
//! page's JSON-LD blocks (`json-ld`). It can also bound how many resources of
//! the crawl it matches.

use crate::validate::result::ValidationResult;
use crate::{Result, ValidatorError};
use jsonschema::{Draft, Validator};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// What a rule checks on each matched resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case"
)]
pub enum ValidatorConfig {
    /// The file parsed as JSON must satisfy `schema`
    Json { schema: Value },
    /// JSON-LD blocks selected by `filter` must satisfy `schema`, and their
    /// count per page must stay within the occurrence bounds
    JsonLd {
        filter: Value,
        #[serde(default)]
        schema: Option<Value>,
        #[serde(default)]
        min_occurrence: Option<usize>,
        #[serde(default)]
        max_occurrence: Option<usize>,
    },
}

enum CompiledConfig {
    Json {
        schema: Validator,
    },
    JsonLd {
        filter: Validator,
        schema: Option<Validator>,
    },
}

/// A validator rule with its pattern and schemas compiled
#[derive(Clone)]
pub struct AdditionalValidator {
    url_pattern: Regex,
    min_matches: Option<usize>,
    max_matches: Option<usize>,
    config: ValidatorConfig,
    compiled: Arc<CompiledConfig>,
}

/// A schema violation, flattened for reporting
struct SchemaError {
    message: String,
    instance_path: String,
}

fn compile_schema(schema: &Value) -> Result<Validator> {
    jsonschema::options()
        .with_draft(Draft::Draft7)
        .build(schema)
        .map_err(|e| ValidatorError::InvalidPattern(format!("invalid JSON schema: {}", e)))
}

fn schema_errors(validator: &Validator, instance: &Value) -> Vec<SchemaError> {
    validator
        .iter_errors(instance)
        .map(|error| SchemaError {
            message: error.to_string(),
            instance_path: error.instance_path.to_string(),
        })
        .collect()
}

impl AdditionalValidator {
    /// Compiles a rule
    ///
    /// # Errors
    ///
    /// [`ValidatorError::InvalidPattern`] if the pattern or a schema does not compile.
    pub fn new(url_pattern: &str, config: ValidatorConfig) -> Result<Self> {
        let url_pattern = Regex::new(url_pattern)
            .map_err(|e| ValidatorError::InvalidPattern(format!("{}: {}", url_pattern, e)))?;

        let compiled = match &config {
            ValidatorConfig::Json { schema } => CompiledConfig::Json {
                schema: compile_schema(schema)?,
            },
            ValidatorConfig::JsonLd { filter, schema, .. } => CompiledConfig::JsonLd {
                filter: compile_schema(filter)?,
                schema: schema.as_ref().map(compile_schema).transpose()?,
            },
        };

        Ok(Self {
            url_pattern,
            min_matches: None,
            max_matches: None,
            config,
            compiled: Arc::new(compiled),
        })
    }

    pub fn with_min_matches(mut self, min_matches: usize) -> Self {
        self.min_matches = Some(min_matches);
        self
    }

    pub fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = Some(max_matches);
        self
    }

    pub fn url_pattern(&self) -> &str {
        self.url_pattern.as_str()
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Whether the rule applies to a site-relative URL such as `/blog/a.html`
    pub fn matches(&self, relative_url: &str) -> bool {
        self.url_pattern.is_match(relative_url)
    }

    /// Whether the rule reads the page's JSON-LD blocks
    pub fn needs_json_ld(&self) -> bool {
        matches!(self.config, ValidatorConfig::JsonLd { .. })
    }

    /// Checks the contents of one matched JSON file
    ///
    /// `document` is `None` when the file is not valid JSON; that is reported
    /// separately, so the rule has nothing to add.
    pub fn check_json(&self, url: &str, document: Option<&Value>) -> Vec<ValidationResult> {
        let (CompiledConfig::Json { schema }, ValidatorConfig::Json { schema: raw }) =
            (self.compiled.as_ref(), &self.config)
        else {
            return Vec::new();
        };
        let Some(document) = document else {
            return Vec::new();
        };

        schema_errors(schema, document)
            .into_iter()
            .map(|error| ValidationResult::JsonDoesNotMatchSchema {
                url: url.to_string(),
                message: error.message,
                instance_path: error.instance_path,
                schema: raw.clone(),
            })
            .collect()
    }

    /// Checks the parsed JSON-LD blocks of one matched page
    pub fn check_json_ld(&self, url: &str, blocks: &[Value]) -> Vec<ValidationResult> {
        let (
            CompiledConfig::JsonLd { filter, schema },
            ValidatorConfig::JsonLd {
                filter: raw_filter,
                schema: raw_schema,
                min_occurrence,
                max_occurrence,
            },
        ) = (self.compiled.as_ref(), &self.config)
        else {
            return Vec::new();
        };

        let selected: Vec<&Value> = blocks.iter().filter(|block| filter.is_valid(block)).collect();
        let mut results = Vec::new();

        if let (Some(schema), Some(raw_schema)) = (schema, raw_schema) {
            for block in &selected {
                for error in schema_errors(schema, block) {
                    results.push(ValidationResult::JsonLdDoesNotMatchSchema {
                        url: url.to_string(),
                        filter: raw_filter.clone(),
                        message: error.message,
                        instance_path: error.instance_path,
                        schema: raw_schema.clone(),
                    });
                }
            }
        }

        let actual = selected.len();
        if !within(actual, *min_occurrence, *max_occurrence) {
            results.push(ValidationResult::JsonLdDoesNotMatchOccurrenceRequirement {
                url: url.to_string(),
                filter: raw_filter.clone(),
                min_occurrence: *min_occurrence,
                max_occurrence: *max_occurrence,
                actual_occurrence: actual,
            });
        }

        results
    }

    /// Checks how many resources of the crawl the rule matched
    pub fn check_match_count(&self, actual_matches: usize) -> Option<ValidationResult> {
        if within(actual_matches, self.min_matches, self.max_matches) {
            return None;
        }
        Some(
            ValidationResult::AdditionalValidatorMatchNumberOutsideExpectedRange {
                url_pattern: self.url_pattern().to_string(),
                min_matches: self.min_matches,
                max_matches: self.max_matches,
                actual_matches,
            },
        )
    }
}

fn within(value: usize, min: Option<usize>, max: Option<usize>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

impl fmt::Debug for AdditionalValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdditionalValidator")
            .field("url_pattern", &self.url_pattern.as_str())
            .field("min_matches", &self.min_matches)
            .field("max_matches", &self.max_matches)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_ld_rule(min: Option<usize>, max: Option<usize>) -> AdditionalValidator {
        AdditionalValidator::new(
            "^/blog/",
            ValidatorConfig::JsonLd {
                filter: json!({"properties": {"@type": {"const": "Article"}}, "required": ["@type"]}),
                schema: Some(json!({"required": ["headline"]})),
                min_occurrence: min,
                max_occurrence: max,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_pattern_matches_relative_url() {
        let rule = json_ld_rule(None, None);
        assert!(rule.matches("/blog/post.html"));
        assert!(!rule.matches("/about.html"));
        assert!(rule.needs_json_ld());
    }

    #[test]
    fn test_invalid_pattern_or_schema_is_fatal() {
        let bad_pattern = AdditionalValidator::new("(", ValidatorConfig::Json { schema: json!({}) });
        assert!(matches!(bad_pattern, Err(ValidatorError::InvalidPattern(_))));

        let bad_schema = AdditionalValidator::new(
            ".*",
            ValidatorConfig::Json {
                schema: json!({"type": 12}),
            },
        );
        assert!(matches!(bad_schema, Err(ValidatorError::InvalidPattern(_))));
    }

    #[test]
    fn test_json_schema_violations() {
        let rule = AdditionalValidator::new(
            r"\.json$",
            ValidatorConfig::Json {
                schema: json!({"type": "object", "required": ["name"]}),
            },
        )
        .unwrap();

        assert!(rule
            .check_json("https://example.com/a.json", Some(&json!({"name": "x"})))
            .is_empty());
        assert!(rule.check_json("https://example.com/a.json", None).is_empty());

        let results = rule.check_json("https://example.com/a.json", Some(&json!({"title": "x"})));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind(), "JSON_DOES_NOT_MATCH_SCHEMA");
    }

    #[test]
    fn test_json_ld_filter_schema_and_occurrence() {
        let rule = json_ld_rule(Some(1), Some(1));
        let blocks = vec![
            json!({"@type": "Article"}),
            json!({"@type": "Organization"}),
        ];

        let results = rule.check_json_ld("https://example.com/blog/a.html", &blocks);
        let kinds: Vec<_> = results.iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec!["JSON_LD_DOES_NOT_MATCH_SCHEMA"]);

        let none = rule.check_json_ld("https://example.com/blog/b.html", &[]);
        assert_eq!(none.len(), 1);
        assert!(matches!(
            none[0],
            ValidationResult::JsonLdDoesNotMatchOccurrenceRequirement {
                actual_occurrence: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_match_count_bounds() {
        let rule = AdditionalValidator::new("^/nonexistent\\.html$", ValidatorConfig::Json { schema: json!({}) })
            .unwrap()
            .with_min_matches(1)
            .with_max_matches(2);

        assert!(rule.check_match_count(1).is_none());
        assert!(rule.check_match_count(0).is_some());
        assert!(rule.check_match_count(3).is_some());
    }

    #[test]
    fn test_config_deserializes_kebab_case() {
        let config: ValidatorConfig = toml::from_str(
            r#"
            type = "json-ld"
            filter = { required = ["@type"] }
            min-occurrence = 1
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            ValidatorConfig::JsonLd {
                filter: json!({"required": ["@type"]}),
                schema: None,
                min_occurrence: Some(1),
                max_occurrence: None,
            }
        );
    }
}
