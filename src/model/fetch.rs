use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// HTTP statuses that make a resource a redirect
pub const REDIRECT_STATUSES: [u16; 4] = [301, 302, 307, 308];

/// The on-disk file backing a found resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileData {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

/// Result of fetching one URL from the site
///
/// `data == None` means the resource does not exist. That is a normal outcome,
/// reported later as a finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub data: Option<FileData>,
}

/// A fetch result whose resource is known to exist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundFetchResult {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub data: FileData,
}

impl FetchResult {
    pub fn not_found(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 404,
            headers: Vec::new(),
            data: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.data.is_some()
    }

    /// Refines this result into a [`FoundFetchResult`] if the resource exists
    pub fn found(&self) -> Option<FoundFetchResult> {
        self.data.as_ref().map(|data| FoundFetchResult {
            url: self.url.clone(),
            status: self.status,
            headers: self.headers.clone(),
            data: data.clone(),
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<String> {
        self.header("content-type").map(content_type_essence)
    }
}

impl FoundFetchResult {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Lower-cased media type without parameters, e.g. `text/html`
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type").map(content_type_essence)
    }

    pub fn is_html(&self) -> bool {
        self.content_type().as_deref() == Some("text/html")
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Strips parameters from a content type: `Text/HTML; charset=utf-8` -> `text/html`
pub fn content_type_essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
