//! Disk-backed resource fetcher
//!
//! This module maps site URLs to files under the build directory, including:
//! - Canonicalizing the URL and stripping its query string
//! - Percent-decoding the path and joining it under the site directory
//! - Synthesizing the status and headers a web server would send
//! - Classifying "not found" apart from real I/O failures

use crate::model::{FetchResult, FileData};
use crate::url::{is_internal_link, to_canonical, to_relative_url};
use crate::{Result, ValidatorError};
use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Status and headers served for a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl ResponseMeta {
    /// A plain `200 OK` with the given content type
    pub fn ok(content_type: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: vec![("content-type".to_string(), content_type.into())],
        }
    }
}

/// Computes the response metadata for a URL path such as `/blog/index.html`
pub type ResponseMetaFn = Arc<dyn Fn(&str) -> ResponseMeta + Send + Sync>;

/// Where and how the built site is served from
#[derive(Clone)]
pub struct TargetConfig {
    /// Root directory of the built site
    pub dir: PathBuf,

    /// File served for URLs ending in `/`
    pub index_name: String,

    /// Overrides the default MIME-sniffed `200` response
    pub response_meta: Option<ResponseMetaFn>,
}

impl TargetConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            index_name: "index.html".to_string(),
            response_meta: None,
        }
    }

    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    pub fn with_response_meta<F>(mut self, response_meta: F) -> Self
    where
        F: Fn(&str) -> ResponseMeta + Send + Sync + 'static,
    {
        self.response_meta = Some(Arc::new(response_meta));
        self
    }

    /// Response metadata for a URL path, falling back to [`default_response_meta`]
    pub fn meta_for(&self, path: &str) -> ResponseMeta {
        match &self.response_meta {
            Some(response_meta) => response_meta(path),
            None => default_response_meta(path),
        }
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("dir", &self.dir)
            .field("index_name", &self.index_name)
            .field("response_meta", &self.response_meta.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Guesses the content type of a path from its extension
///
/// Feeds and generic XML get XML types instead of the `text/*` types some MIME
/// tables list for them.
///
/// # Examples
///
/// ```
/// use site_validator::crawler::default_content_type;
///
/// assert_eq!(default_content_type("/index.html"), "text/html");
/// assert_eq!(default_content_type("/feed.rss"), "application/rss+xml");
/// ```
pub fn default_content_type(path: &str) -> String {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("xml") => "application/xml".to_string(),
        Some("rss") => "application/rss+xml".to_string(),
        Some("atom") => "application/atom+xml".to_string(),
        _ => mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

/// `200 OK` with a content type guessed from the extension
pub fn default_response_meta(path: &str) -> ResponseMeta {
    ResponseMeta::ok(default_content_type(path))
}

/// Fetches site URLs from the build directory
///
/// Cloning is cheap; clones share the target configuration.
#[derive(Debug, Clone)]
pub struct SiteFetcher {
    base_url: Url,
    target: Arc<TargetConfig>,
}

impl SiteFetcher {
    pub fn new(base_url: Url, target: TargetConfig) -> Self {
        Self {
            base_url,
            target: Arc::new(target),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn index_name(&self) -> &str {
        &self.target.index_name
    }

    /// Canonical form of `url` relative to the site base
    pub fn canonical(&self, url: &str) -> String {
        to_canonical(&self.base_url, &self.target.index_name, url)
    }

    pub fn is_internal(&self, url: &str) -> bool {
        is_internal_link(&self.base_url, url)
    }

    /// URL path (index file appended, query removed) that `url` is served from
    pub fn served_path(&self, url: &str) -> String {
        let relative = to_relative_url(&self.base_url, &self.canonical(url));
        match relative.split_once('?') {
            Some((path, _)) => path.to_string(),
            None => relative,
        }
    }

    /// File backing `url`, or `None` if the path escapes the site directory
    pub fn file_path(&self, url: &str) -> Option<PathBuf> {
        let served = self.served_path(url);
        let decoded = percent_decode_str(&served).decode_utf8_lossy();
        let relative = Path::new(decoded.trim_start_matches('/'));

        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return None;
        }
        Some(self.target.dir.join(relative))
    }

    /// Fetches a URL
    ///
    /// A missing file, a directory or a path outside the site directory is a
    /// not-found result, not an error.
    ///
    /// # Errors
    ///
    /// * [`ValidatorError::Precondition`] - `url` is not internal
    /// * [`ValidatorError::Io`] - any I/O failure other than not-found
    pub async fn fetch(&self, url: &str) -> Result<FetchResult> {
        if !self.is_internal(url) {
            return Err(ValidatorError::Precondition(format!(
                "Link not internal: {}",
                url
            )));
        }

        let canonical = self.canonical(url);
        let Some(path) = self.file_path(&canonical) else {
            tracing::debug!("{} resolves outside the site directory", canonical);
            return Ok(FetchResult::not_found(canonical));
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(FetchResult::not_found(canonical)),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(FetchResult::not_found(canonical));
            }
            Err(source) => return Err(ValidatorError::Io { path, source }),
        };

        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(|source| ValidatorError::Io {
                path: path.clone(),
                source,
            })?;

        let meta = self.target.meta_for(&self.served_path(&canonical));
        tracing::trace!("Fetched {} from {}", canonical, path.display());

        Ok(FetchResult {
            url: canonical,
            status: meta.status,
            headers: meta.headers,
            data: Some(FileData { path, modified }),
        })
    }
}
