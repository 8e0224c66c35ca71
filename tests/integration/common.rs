use site_validator::{Extras, Seed, TargetConfig, UrlRole, ValidateOptions, ValidationResult};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const BASE_URL: &str = "https://example.com";

/// Writes `files` under a fresh temporary directory
pub fn site(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, contents) in files {
        write(dir.path(), name, contents);
    }
    dir
}

pub fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, contents).expect("Failed to write fixture");
}

pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    image::RgbImage::new(width, height)
        .save(path)
        .expect("Failed to write PNG");
}

pub fn home_seed() -> Vec<Seed> {
    vec![Seed::new("https://example.com/", UrlRole::Document)]
}

pub fn options() -> ValidateOptions {
    ValidateOptions::default().with_concurrency(4).with_pool_size(2)
}

pub async fn validate_site(dir: &TempDir, seeds: &[Seed]) -> Vec<ValidationResult> {
    site_validator::validate(
        &options(),
        BASE_URL,
        TargetConfig::new(dir.path()),
        seeds,
        &Extras::default(),
        &[],
    )
    .await
    .expect("Validation should not abort")
}

pub fn kinds(findings: &[ValidationResult]) -> Vec<&'static str> {
    findings.iter().map(|finding| finding.kind()).collect()
}
