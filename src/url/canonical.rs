use url::Url;

/// Resolves a possibly relative URL against a base URL
///
/// Returns `None` if the result is not a valid URL.
pub fn resolve(base: &Url, url: &str) -> Option<Url> {
    base.join(url).ok()
}

/// Converts a URL to its canonical form relative to `base`
///
/// # Canonicalization Rules
///
/// 1. Resolve `url` against `base`
/// 2. If the resolved scheme differs from the base scheme, return `url` unchanged
/// 3. Keep the origin and path; a path ending in `/` gets `index_name` appended
/// 4. Keep the query string (cache-busted assets are distinct resources)
/// 5. Drop the fragment
///
/// The function is idempotent for every internal URL.
///
/// # Arguments
///
/// * `base` - The URL the link is resolved against (the site base or the page it was found on)
/// * `index_name` - File name served for directory URLs, usually `index.html`
/// * `url` - The URL to canonicalize
///
/// # Examples
///
/// ```
/// use site_validator::url::to_canonical;
/// use url::Url;
///
/// let base = Url::parse("https://example.com").unwrap();
/// assert_eq!(
///     to_canonical(&base, "index.html", "/blog/?page=2#top"),
///     "https://example.com/blog/index.html?page=2"
/// );
/// ```
pub fn to_canonical(base: &Url, index_name: &str, url: &str) -> String {
    let resolved = match resolve(base, url) {
        Some(resolved) => resolved,
        None => return url.to_string(),
    };

    if resolved.scheme() != base.scheme() {
        return url.to_string();
    }

    let path = resolved.path();
    let path = if path.ends_with('/') {
        format!("{}{}", path, index_name)
    } else {
        path.to_string()
    };

    let search = match resolved.query() {
        Some(query) if !query.is_empty() => format!("?{}", query),
        _ => String::new(),
    };

    format!("{}{}{}", resolved.origin().ascii_serialization(), path, search)
}

/// Returns true if `url`, resolved against `base`, has the same origin as `base`
pub fn is_internal_link(base: &Url, url: &str) -> bool {
    resolve(base, url)
        .map(|resolved| resolved.origin() == base.origin())
        .unwrap_or(false)
}

/// Returns the path and query of `url` resolved against `base`
///
/// This is the form additional validators match their URL patterns against,
/// e.g. `/blog/index.html`.
pub fn to_relative_url(base: &Url, url: &str) -> String {
    match resolve(base, url) {
        Some(resolved) => match resolved.query() {
            Some(query) if !query.is_empty() => format!("{}?{}", resolved.path(), query),
            _ => resolved.path().to_string(),
        },
        None => url.to_string(),
    }
}
