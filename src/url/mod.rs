//! URL handling module for Site-Validator
//!
//! This module provides the canonicalization rules that every graph-membership,
//! deduplication and "is this link worth following" decision goes through.

mod canonical;

// Re-export main functions
pub use canonical::{is_internal_link, resolve, to_canonical, to_relative_url};

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses the base URL of a crawl
///
/// The base must be an absolute http(s) URL with a host, because every internal
/// link is compared against its origin.
///
/// # Examples
///
/// ```
/// use site_validator::url::parse_base_url;
///
/// let base = parse_base_url("https://example.com").unwrap();
/// assert_eq!(base.as_str(), "https://example.com/");
/// ```
pub fn parse_base_url(base: &str) -> UrlResult<Url> {
    let url = Url::parse(base).map_err(|e| UrlError::Parse(format!("{}: {}", base, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS base URLs are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(base.to_string()));
    }

    Ok(url)
}

/// Returns the `host[:port]` part of a URL, the way robots.txt `Host:` directives write it
pub fn host_with_port(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url() {
        assert!(parse_base_url("https://example.com").is_ok());
        assert!(parse_base_url("http://localhost:8080/").is_ok());
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        assert!(matches!(
            parse_base_url("ftp://example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(matches!(parse_base_url("not a url"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_host_with_port() {
        let url = Url::parse("https://example.com/a").unwrap();
        assert_eq!(host_with_port(&url), "example.com");

        let url = Url::parse("http://localhost:8080/a").unwrap();
        assert_eq!(host_with_port(&url), "localhost:8080");
    }
}
