//! Link extraction from JSON documents with JMESPath queries

use crate::model::{ExtractConfig, Link, LinkLocation};
use crate::{Result, ValidatorError};

/// Runs every extraction config against a parsed JSON document
///
/// Each string the query yields becomes a link with the config's role and
/// assertions. A single string result counts as one match; `null` and
/// non-string values yield nothing.
///
/// # Errors
///
/// A query that does not compile is a fatal [`ValidatorError::InvalidPattern`].
pub fn json_links(
    json_url: &str,
    value: &serde_json::Value,
    configs: &[ExtractConfig],
) -> Result<Vec<Link>> {
    let mut links = Vec::new();

    for config in configs {
        let matches = search_strings(&config.query, value)?;
        for (index, url) in matches.into_iter().enumerate() {
            links.push(Link {
                url,
                role: config.role.clone(),
                asserts: config.asserts.clone(),
                location: LinkLocation::Json {
                    json_url: json_url.to_string(),
                    query: config.query.clone(),
                    index,
                },
            });
        }
    }

    Ok(links)
}

/// Compiles a JMESPath expression
///
/// Config loading calls this for every extraction query so a typo fails
/// before the crawl starts.
pub fn compile_query(query: &str) -> Result<jmespath::Expression<'static>> {
    jmespath::compile(query)
        .map_err(|e| ValidatorError::InvalidPattern(format!("JMESPath query {:?}: {}", query, e)))
}

fn search_strings(query: &str, value: &serde_json::Value) -> Result<Vec<String>> {
    let expression = compile_query(query)?;
    let result = expression
        .search(value.clone())
        .map_err(|e| ValidatorError::InvalidPattern(format!("JMESPath query {:?}: {}", query, e)))?;

    if let Some(s) = result.as_string() {
        return Ok(vec![s.clone()]);
    }

    Ok(result
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_string().cloned())
                .collect()
        })
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assertion, UrlRole};
    use serde_json::json;

    fn config(query: &str) -> ExtractConfig {
        ExtractConfig {
            query: query.to_string(),
            asserts: vec![Assertion::Permanent],
            role: UrlRole::Document,
        }
    }

    #[test]
    fn test_extracts_matched_strings() {
        let value = json!({"items": [{"url": "/a.html"}, {"url": "/b.html"}, {"url": 5}]});
        let links = json_links(
            "https://example.com/data.json",
            &value,
            &[config("items[*].url")],
        )
        .unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links[1].url, "/b.html");
        assert_eq!(links[1].asserts, vec![Assertion::Permanent]);
        assert_eq!(
            links[1].location,
            LinkLocation::Json {
                json_url: "https://example.com/data.json".to_string(),
                query: "items[*].url".to_string(),
                index: 1
            }
        );
    }

    #[test]
    fn test_single_string_and_null() {
        let value = json!({"home": "/index.html"});
        let links = json_links("u", &value, &[config("home"), config("missing")]).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "/index.html");
    }

    #[test]
    fn test_invalid_query() {
        let value = json!({});
        assert!(matches!(
            json_links("u", &value, &[config("items[")]),
            Err(ValidatorError::InvalidPattern(_))
        ));
        assert!(compile_query("items[*].url").is_ok());
        assert!(compile_query("items[").is_err());
    }
}
