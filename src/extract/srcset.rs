//! `srcset` attribute parsing

use serde::Serialize;

/// A descriptor attached to a srcset candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Descriptor {
    /// `2x`
    Density(f64),
    /// `480w`
    Width(u32),
}

/// One image candidate of a `srcset` attribute
#[derive(Debug, Clone, PartialEq)]
pub struct SrcsetCandidate {
    pub url: String,
    pub descriptor: Option<Descriptor>,
}

/// Parses a `srcset` attribute into its candidates
///
/// Follows the shape of the HTML image candidate string grammar: a URL runs up to
/// the next whitespace, and a URL ending in commas has no descriptor. Unknown
/// descriptors (e.g. `h`) are ignored, and a candidate without a usable
/// descriptor has `descriptor == None`, which means `1x`.
pub fn parse_srcset(srcset: &str) -> Vec<SrcsetCandidate> {
    let mut candidates = Vec::new();
    let mut rest = srcset;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let url_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (raw_url, after) = rest.split_at(url_end);

        if raw_url.ends_with(',') {
            candidates.push(SrcsetCandidate {
                url: raw_url.trim_end_matches(',').to_string(),
                descriptor: None,
            });
            rest = after;
            continue;
        }

        let descriptors_end = after.find(',').unwrap_or(after.len());
        let (descriptors, after) = after.split_at(descriptors_end);

        candidates.push(SrcsetCandidate {
            url: raw_url.to_string(),
            descriptor: descriptors.split_whitespace().find_map(parse_descriptor),
        });
        rest = after;
    }

    candidates
}

fn parse_descriptor(token: &str) -> Option<Descriptor> {
    if let Some(density) = token.strip_suffix('x') {
        density
            .parse::<f64>()
            .ok()
            .filter(|d| *d > 0.0)
            .map(Descriptor::Density)
    } else if let Some(width) = token.strip_suffix('w') {
        width.parse::<u32>().ok().map(Descriptor::Width)
    } else {
        None
    }
}
