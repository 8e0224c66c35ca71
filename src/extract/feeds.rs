//! RSS and Atom feed parsing

use crate::extract::sitemap::{is_named, node_text, parse_xml};
use crate::model::{Assertion, Link, LinkLocation, UrlRole};

/// A feed entry identified by its link, with its stable identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub link: String,
    pub guid: String,
}

/// One `document` + `permanent` link per `<item><link>` of every `<channel>`
///
/// The link index counts items across all channels.
pub fn rss_links(feed_url: &str, contents: &str) -> Result<Vec<Link>, roxmltree::Error> {
    let document = parse_xml(contents)?;
    let root = document.root_element();
    if !is_named(&root, "rss") {
        return Ok(Vec::new());
    }

    let items = root
        .children()
        .filter(|node| is_named(node, "channel"))
        .enumerate()
        .flat_map(|(channel_index, channel)| {
            channel
                .children()
                .filter(|node| is_named(node, "item"))
                .map(move |item| (channel_index, item))
        });

    let mut links = Vec::new();
    for (link_index, (channel_index, item)) in items.enumerate() {
        for link in item.children().filter(|node| is_named(node, "link")) {
            links.push(Link {
                url: node_text(&link),
                role: UrlRole::Document,
                asserts: vec![Assertion::Permanent],
                location: LinkLocation::Rss {
                    rss_url: feed_url.to_string(),
                    channel_index,
                    link_index,
                },
            });
        }
    }

    Ok(links)
}

/// One `document` + `permanent` link per `<entry><link href>`
pub fn atom_links(feed_url: &str, contents: &str) -> Result<Vec<Link>, roxmltree::Error> {
    let document = parse_xml(contents)?;
    let root = document.root_element();
    if !is_named(&root, "feed") {
        return Ok(Vec::new());
    }

    let mut links = Vec::new();
    for (entry_index, entry) in root
        .children()
        .filter(|node| is_named(node, "entry"))
        .enumerate()
    {
        for (link_index, link) in entry
            .children()
            .filter(|node| is_named(node, "link"))
            .enumerate()
        {
            if let Some(href) = link.attribute("href") {
                links.push(Link {
                    url: href.to_string(),
                    role: UrlRole::Document,
                    asserts: vec![Assertion::Permanent],
                    location: LinkLocation::Atom {
                        atom_url: feed_url.to_string(),
                        entry_index,
                        link_index,
                    },
                });
            }
        }
    }

    Ok(links)
}

/// `(link, guid)` pairs of every RSS item that has both
pub fn rss_items(contents: &str) -> Result<Vec<FeedItem>, roxmltree::Error> {
    let document = parse_xml(contents)?;
    Ok(document
        .root_element()
        .children()
        .filter(|node| is_named(node, "channel"))
        .flat_map(|channel| channel.children().filter(|node| is_named(node, "item")))
        .filter_map(|item| {
            let link = item.children().find(|node| is_named(node, "link"))?;
            let guid = item.children().find(|node| is_named(node, "guid"))?;
            Some(FeedItem {
                link: node_text(&link),
                guid: node_text(&guid),
            })
        })
        .collect())
}

/// `(first link href, id)` pairs of every Atom entry that has both
pub fn atom_entries(contents: &str) -> Result<Vec<FeedItem>, roxmltree::Error> {
    let document = parse_xml(contents)?;
    Ok(document
        .root_element()
        .children()
        .filter(|node| is_named(node, "entry"))
        .filter_map(|entry| {
            let href = entry
                .children()
                .find(|node| is_named(node, "link"))?
                .attribute("href")?;
            let id = entry.children().find(|node| is_named(node, "id"))?;
            Some(FeedItem {
                link: href.to_string(),
                guid: node_text(&id),
            })
        })
        .collect())
}
