use serde::{Deserialize, Serialize};

/// Why a URL is being fetched, and therefore how its content is interpreted
///
/// The same canonical URL may be fetched under several roles during one crawl,
/// e.g. once as an `asset` reached through `<a href>` and once as a `json`
/// extraction source named in the seeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UrlRole {
    Document,
    Stylesheet,
    Asset,
    Sitemap,
    RobotsTxt,
    Rss,
    Atom,
    Json {
        #[serde(rename = "extract-configs", alias = "extractConfigs", default)]
        extract_configs: Vec<ExtractConfig>,
    },
}

impl UrlRole {
    /// Short name of the role, as used in the serialized form
    pub fn kind(&self) -> &'static str {
        match self {
            UrlRole::Document => "document",
            UrlRole::Stylesheet => "stylesheet",
            UrlRole::Asset => "asset",
            UrlRole::Sitemap => "sitemap",
            UrlRole::RobotsTxt => "robotstxt",
            UrlRole::Rss => "rss",
            UrlRole::Atom => "atom",
            UrlRole::Json { .. } => "json",
        }
    }
}

/// How to pull links out of a JSON document
///
/// `query` is a JMESPath expression; every string it yields becomes a link with
/// the given role and assertions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(alias = "jmespath")]
    pub query: String,

    #[serde(default)]
    pub asserts: Vec<Assertion>,

    pub role: UrlRole,
}

/// An expectation attached to a link about the resource it points to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Assertion {
    Image,
    Video,
    Font,
    #[serde(rename = "imageSize")]
    ImageSize { width: u32, height: u32 },
    #[serde(rename = "content-type")]
    ContentType {
        #[serde(rename = "contentType", alias = "content-type")]
        content_type: Vec<String>,
    },
    Permanent,
    Document,
}
