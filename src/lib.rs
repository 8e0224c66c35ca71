//! Site-Validator: a crawl-and-validate engine for statically generated websites
//!
//! This crate walks a built site on disk the way a browser and a feed reader would,
//! starting from seed URLs, and reports every broken internal link, missing hash
//! target, content-type mismatch, redirect chain, incoherent canonical link and
//! malformed structured document it finds. It can also diff two builds of the same
//! site to catch backward-incompatible changes.

pub mod compare;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod model;
pub mod output;
pub mod robots;
pub mod url;
pub mod validate;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Site-Validator operations
///
/// These are fatal conditions that abort a whole `validate` or `compare_versions`
/// call. Problems with the site's content are never reported through this type;
/// they are collected as [`validate::ValidationResult`] values instead.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error for {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("More than one meta refresh tag on {url}")]
    MultipleMetaRefresh { url: String },

    #[error("Crawl graph has no entry for {url}")]
    MissingGraphEntry { url: String },

    #[error("External checker {checker} failed: {message}")]
    Checker { checker: String, message: String },

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern in config: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Site-Validator operations
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use compare::{compare_versions, FeedGuidChange, SiteVersion, VersionComparison};
pub use config::Config;
pub use crawler::{CrawlGraph, ResponseMeta, TargetConfig};
pub use model::{Assertion, ExtractConfig, Extras, Link, LinkLocation, Seed, UrlRole};
pub use url::{is_internal_link, to_canonical};
pub use validate::{
    validate, AdditionalValidator, CommandChecker, ExternalChecker, NoExternalChecks,
    ValidateOptions, ValidationResult, ValidatorConfig,
};
