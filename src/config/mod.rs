//! Configuration module for Site-Validator
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and turning them into the values the library API takes.
//!
//! # Example
//!
//! ```no_run
//! use site_validator::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("site-validator.toml")).unwrap();
//! println!("Crawler will use concurrency: {}", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CheckersConfig, Config, CrawlerConfig, ExtrasConfig, ResponseRule, SiteConfig, ValidatorEntry,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
