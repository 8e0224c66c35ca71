//! Redirect detection for HTTP 3xx responses and HTML meta refresh

use crate::extract::html::PageElements;
use crate::model::{FoundFetchResult, REDIRECT_STATUSES};
use crate::{Result, ValidatorError};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// `content` of a meta refresh: `<seconds>; url=<target>`
static REFRESH_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*[0-9.]+\s*[;,]\s*(?:url\s*=\s*)?(.*?)\s*$").expect("refresh regex")
});

/// Returns the redirect target of a resource, if it is a redirect
///
/// A 301/302/307/308 status redirects to its `Location` header. An HTML page
/// redirects through a single `<meta http-equiv=refresh>` tag. Both targets are
/// resolved against the resource URL.
///
/// # Errors
///
/// More than one meta refresh tag on a page is a fatal
/// [`ValidatorError::MultipleMetaRefresh`].
pub fn get_redirect(res: &FoundFetchResult) -> Result<Option<String>> {
    if let Some(target) = status_redirect(res) {
        return Ok(Some(target));
    }
    if !res.is_html() {
        return Ok(None);
    }
    let page = PageElements::load(&res.data.path)?;
    meta_refresh_redirect(&res.url, &page)
}

/// Same as [`get_redirect`], for a page that is already parsed
pub fn get_redirect_in(res: &FoundFetchResult, page: &PageElements) -> Result<Option<String>> {
    if let Some(target) = status_redirect(res) {
        return Ok(Some(target));
    }
    if !res.is_html() {
        return Ok(None);
    }
    meta_refresh_redirect(&res.url, page)
}

fn status_redirect(res: &FoundFetchResult) -> Option<String> {
    if !REDIRECT_STATUSES.contains(&res.status) {
        return None;
    }
    match res.header("location") {
        Some(location) => resolve_against(&res.url, location),
        None => {
            tracing::warn!("{} has status {} but no Location header", res.url, res.status);
            None
        }
    }
}

fn meta_refresh_redirect(url: &str, page: &PageElements) -> Result<Option<String>> {
    let refreshes = page.meta_refreshes();
    match refreshes.as_slice() {
        [] => Ok(None),
        [refresh] => Ok(refresh
            .attr("content")
            .and_then(refresh_target)
            .and_then(|target| resolve_against(url, &target))),
        _ => Err(ValidatorError::MultipleMetaRefresh {
            url: url.to_string(),
        }),
    }
}

/// Pulls the target URL out of a refresh `content` attribute
///
/// A refresh without a URL reloads the same page and is not a redirect.
fn refresh_target(content: &str) -> Option<String> {
    let captures = REFRESH_CONTENT.captures(content)?;
    let target = captures.get(1)?.as_str().trim_matches(|c| c == '"' || c == '\'');
    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

fn resolve_against(base: &str, target: &str) -> Option<String> {
    Url::parse(base)
        .and_then(|base| base.join(target))
        .map(|url| url.to_string())
        .ok()
}
