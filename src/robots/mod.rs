//! Robots.txt handling module
//!
//! robots.txt files are crawled like any other resource. Their `Sitemap:`
//! directives become links to follow and their `Host:` directive is checked
//! against the site base URL.

mod parser;

pub use parser::RobotsTxt;

use crate::model::{Link, LinkLocation, UrlRole};

/// One `sitemap` link per `Sitemap:` directive
///
/// # Examples
///
/// ```
/// use site_validator::robots::sitemap_links;
///
/// let links = sitemap_links("Sitemap: https://example.com/sitemap.xml\n");
/// assert_eq!(links.len(), 1);
/// ```
pub fn sitemap_links(content: &str) -> Vec<Link> {
    RobotsTxt::parse(content)
        .sitemaps
        .into_iter()
        .enumerate()
        .map(|(index, url)| Link {
            url,
            role: UrlRole::Sitemap,
            asserts: vec![],
            location: LinkLocation::RobotsSitemap { index },
        })
        .collect()
}
