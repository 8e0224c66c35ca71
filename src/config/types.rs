use crate::crawler::{default_response_meta, ResponseMeta, TargetConfig, DEFAULT_CONCURRENCY};
use crate::model::{Extras, Seed};
use crate::validate::{AdditionalValidator, CommandChecker, ExternalChecker, NoExternalChecks, ValidatorConfig};
use crate::ConfigError;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Main configuration structure for Site-Validator
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "seed")]
    pub seeds: Vec<Seed>,
    #[serde(default)]
    pub extras: ExtrasConfig,
    #[serde(default, rename = "response")]
    pub responses: Vec<ResponseRule>,
    #[serde(default, rename = "validator")]
    pub validators: Vec<ValidatorEntry>,
    #[serde(default)]
    pub checkers: CheckersConfig,
}

/// The built site and where it is served from
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Origin the site is served from
    pub base_url: String,

    /// Build directory, relative to the config file
    pub dir: PathBuf,

    /// File served for URLs ending in `/`
    #[serde(default = "default_index_name")]
    pub index_name: String,
}

fn default_index_name() -> String {
    "index.html".to_string()
}

/// Crawler tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of in-flight fetch and validation tasks
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Blocking worker threads; defaults to the number of CPUs
    #[serde(default)]
    pub pool_size: Option<usize>,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            pool_size: None,
        }
    }
}

/// Inline sitemaps (as files) and extra URLs
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtrasConfig {
    #[serde(default)]
    pub txt_sitemaps: Vec<PathBuf>,
    #[serde(default)]
    pub xml_sitemaps: Vec<PathBuf>,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Overrides the response served for paths matching `pattern`
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRule {
    /// Regex over the served path, e.g. `^/old/`
    pub pattern: String,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

fn default_status() -> u16 {
    200
}

/// An additional validator rule
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValidatorEntry {
    pub url_pattern: String,
    #[serde(default)]
    pub min_matches: Option<usize>,
    #[serde(default)]
    pub max_matches: Option<usize>,
    pub config: ValidatorConfig,
}

/// Locations of the external checkers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckersConfig {
    #[serde(default = "default_java")]
    pub java: PathBuf,
    #[serde(default)]
    pub vnu_jar: Option<PathBuf>,
    #[serde(default)]
    pub epubcheck_jar: Option<PathBuf>,
}

fn default_java() -> PathBuf {
    PathBuf::from("java")
}

impl Default for CheckersConfig {
    fn default() -> Self {
        Self {
            java: default_java(),
            vnu_jar: None,
            epubcheck_jar: None,
        }
    }
}

impl Config {
    /// The build directory and response rules as a [`TargetConfig`]
    pub fn target(&self) -> Result<TargetConfig, ConfigError> {
        let target = TargetConfig::new(&self.site.dir).with_index_name(&self.site.index_name);
        if self.responses.is_empty() {
            return Ok(target);
        }

        let rules = self
            .responses
            .iter()
            .map(|rule| {
                let pattern = compile_pattern(&rule.pattern)?;
                let meta = ResponseMeta {
                    status: rule.status,
                    headers: rule
                        .headers
                        .iter()
                        .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
                        .collect(),
                };
                Ok((pattern, meta))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(target.with_response_meta(move |path| {
            rules
                .iter()
                .find(|(pattern, _)| pattern.is_match(path))
                .map(|(_, meta)| meta.clone())
                .unwrap_or_else(|| default_response_meta(path))
        }))
    }

    /// Reads the inline sitemap files
    pub fn extras(&self) -> Result<Extras, ConfigError> {
        let read_all = |paths: &[PathBuf]| {
            paths
                .iter()
                .map(std::fs::read_to_string)
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Extras {
            txt_sitemaps: read_all(&self.extras.txt_sitemaps)?,
            xml_sitemaps: read_all(&self.extras.xml_sitemaps)?,
            urls: self.extras.urls.clone(),
        })
    }

    /// Compiles the validator rules
    pub fn additional_validators(&self) -> Result<Vec<AdditionalValidator>, ConfigError> {
        self.validators
            .iter()
            .map(|entry| {
                let mut validator = AdditionalValidator::new(&entry.url_pattern, entry.config.clone())
                    .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
                if let Some(min) = entry.min_matches {
                    validator = validator.with_min_matches(min);
                }
                if let Some(max) = entry.max_matches {
                    validator = validator.with_max_matches(max);
                }
                Ok(validator)
            })
            .collect()
    }

    /// The configured checkers, or none when no jar is set
    pub fn checker(&self) -> Arc<dyn ExternalChecker> {
        let checkers = &self.checkers;
        if checkers.vnu_jar.is_none() && checkers.epubcheck_jar.is_none() {
            return Arc::new(NoExternalChecks);
        }

        let mut checker = CommandChecker::new(&checkers.java);
        if let Some(jar) = &checkers.vnu_jar {
            checker = checker.with_vnu_jar(jar);
        }
        if let Some(jar) = &checkers.epubcheck_jar {
            checker = checker.with_epubcheck_jar(jar);
        }
        Arc::new(checker)
    }
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", pattern, e)))
}
