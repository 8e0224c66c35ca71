//! Links and seeds from inline extras
//!
//! Extra sitemaps and URLs describe parts of the site that crawling cannot
//! reach, such as pages only listed in a sitemap submitted elsewhere. They are
//! both crawled and checked like any other link.

use crate::extract::sitemap::{urls_from_sitemap, SitemapKind};
use crate::model::{Assertion, Extras, Link, LinkLocation, Seed, SitemapSource, UrlRole};
use crate::url::is_internal_link;
use crate::{Result, ValidatorError};
use url::Url;

/// Every link the extras declare, resolved against the site base URL
///
/// Sitemap entries get the `permanent` and `document` assertions; extra URLs
/// are plain assets.
///
/// # Errors
///
/// A malformed inline XML sitemap is a [`ValidatorError::Precondition`].
pub fn extra_links(base_url: &Url, extras: &Extras) -> Result<Vec<Link>> {
    let mut links = Vec::new();

    let sitemaps = extras
        .xml_sitemaps
        .iter()
        .enumerate()
        .map(|(index, contents)| (index, contents, SitemapKind::Xml))
        .chain(
            extras
                .txt_sitemaps
                .iter()
                .enumerate()
                .map(|(index, contents)| (index, contents, SitemapKind::Txt)),
        );

    for (index, contents, kind) in sitemaps {
        let entries = urls_from_sitemap(contents, kind, SitemapSource::ExtraSitemap(index))
            .map_err(|e| {
                ValidatorError::Precondition(format!("extra XML sitemap {} is malformed: {}", index, e))
            })?;
        links.extend(entries.into_iter().map(|entry| Link {
            url: resolve(base_url, &entry.url),
            asserts: vec![Assertion::Permanent, Assertion::Document],
            ..entry
        }));
    }

    links.extend(extras.urls.iter().enumerate().map(|(index, url)| Link {
        url: resolve(base_url, url),
        role: UrlRole::Asset,
        asserts: vec![],
        location: LinkLocation::ExtraUrl { index },
    }));

    Ok(links)
}

/// Crawl seeds contributed by the extras: every internal sitemap entry and every extra URL
///
/// # Errors
///
/// An extra URL outside the site, or a malformed inline XML sitemap, is a
/// [`ValidatorError::Precondition`].
pub fn extra_seeds(base_url: &Url, extras: &Extras) -> Result<Vec<Seed>> {
    if let Some(external) = extras.urls.iter().find(|url| !is_internal_link(base_url, url)) {
        return Err(ValidatorError::Precondition(format!(
            "extra URLs must be internal links: {}",
            external
        )));
    }

    Ok(extra_links(base_url, extras)?
        .into_iter()
        .filter(|link| is_internal_link(base_url, &link.url))
        .map(|link| Seed::new(link.url, link.role))
        .collect())
}

fn resolve(base_url: &Url, url: &str) -> String {
    base_url
        .join(url)
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| url.to_string())
}
