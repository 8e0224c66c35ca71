use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Loads and parses a configuration file from the given path
///
/// The site directory, the inline sitemap files and the checker jars are
/// resolved against the directory holding the config file.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use site_validator::config::load_config;
///
/// let config = load_config(Path::new("site-validator.toml")).unwrap();
/// println!("Validating {}", config.site.base_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_paths(&mut config, config_dir);

    validate(&config)?;

    Ok(config)
}

fn resolve_paths(config: &mut Config, config_dir: &Path) {
    let resolve = |path: &mut PathBuf| {
        if path.is_relative() {
            *path = config_dir.join(&*path);
        }
    };

    resolve(&mut config.site.dir);
    config.extras.txt_sitemaps.iter_mut().for_each(resolve);
    config.extras.xml_sitemaps.iter_mut().for_each(resolve);
    config.checkers.vnu_jar.iter_mut().for_each(resolve);
    config.checkers.epubcheck_jar.iter_mut().for_each(resolve);
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Two runs that report the same hash were configured identically.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    tracing::debug!("Loaded {} (sha256 {})", path.display(), hash);
    Ok((config, hash))
}
