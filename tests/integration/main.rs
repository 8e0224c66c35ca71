//! End-to-end tests for Site-Validator
//!
//! Every test builds a site in a temporary directory and runs the public API
//! against it. No network access or external checker is needed.

mod common;
mod compare_tests;
mod crawl_tests;
mod validate_tests;
