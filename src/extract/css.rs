//! Stylesheet parsing for `url(...)` references
//!
//! Every declaration of every rule is visited. A reference records its
//! structural position, e.g. `root / @media / .hero / background-image`, and the
//! literal target string as written in the stylesheet.

use crate::model::{Assertion, Link, LinkLocation, UrlRole};
use lightningcss::properties::Property;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;
use lightningcss::values::url::Url as CssUrl;
use lightningcss::visitor::{Visit, VisitTypes, Visitor};
use url::Url;

/// A `url(...)` reference found in a stylesheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssReference {
    pub target: String,
    pub position: String,
    pub is_font_source: bool,
}

/// Walks a stylesheet keeping track of the enclosing rules and declaration
struct ReferenceCollector {
    path: Vec<String>,
    property: Option<String>,
    references: Vec<CssReference>,
}

impl<'i> Visitor<'i> for ReferenceCollector {
    type Error = std::convert::Infallible;

    fn visit_types(&self) -> VisitTypes {
        lightningcss::visit_types!(RULES | PROPERTIES | URLS)
    }

    fn visit_rule(&mut self, rule: &mut CssRule<'i>) -> Result<(), Self::Error> {
        self.path.push(rule_segment(rule));
        let result = rule.visit_children(self);
        self.path.pop();
        result
    }

    fn visit_property(&mut self, property: &mut Property<'i>) -> Result<(), Self::Error> {
        self.property = Some(property.property_id().name().to_string());
        let result = property.visit_children(self);
        self.property = None;
        result
    }

    fn visit_url(&mut self, url: &mut CssUrl<'i>) -> Result<(), Self::Error> {
        let in_font_face = self.path.last().map(String::as_str) == Some("@font-face");
        // Font face descriptors are not properties; only `src` takes URLs
        let property = match (&self.property, in_font_face) {
            (Some(property), _) => property.clone(),
            (None, true) => "src".to_string(),
            (None, false) => String::new(),
        };

        let mut parts = vec!["root".to_string()];
        parts.extend(self.path.iter().cloned());
        if !property.is_empty() {
            parts.push(property.clone());
        }

        self.references.push(CssReference {
            target: url.url.to_string(),
            position: parts.join(" / "),
            is_font_source: in_font_face && property == "src",
        });
        Ok(())
    }
}

/// Names a rule the way it appears in a position path
fn rule_segment(rule: &CssRule) -> String {
    match rule {
        CssRule::Style(style) => style
            .selectors
            .to_css_string(PrinterOptions::default())
            .unwrap_or_else(|_| "rule".to_string()),
        CssRule::Media(_) => "@media".to_string(),
        CssRule::Import(_) => "@import".to_string(),
        CssRule::Supports(_) => "@supports".to_string(),
        CssRule::FontFace(_) => "@font-face".to_string(),
        CssRule::Page(_) => "@page".to_string(),
        CssRule::Keyframes(_) => "@keyframes".to_string(),
        CssRule::LayerBlock(_) => "@layer".to_string(),
        CssRule::Container(_) => "@container".to_string(),
        _ => "rule".to_string(),
    }
}

/// Lists every `url(...)` reference in a stylesheet, skipping `data:` URIs
///
/// Parsing runs with error recovery, so invalid rules are dropped instead of
/// failing the whole stylesheet.
pub fn css_references(css: &str) -> Result<Vec<CssReference>, String> {
    let options = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };
    let mut stylesheet = StyleSheet::parse(css, options).map_err(|e| e.to_string())?;

    let mut collector = ReferenceCollector {
        path: Vec::new(),
        property: None,
        references: Vec::new(),
    };
    if let Err(e) = stylesheet.visit(&mut collector) {
        match e {}
    }

    Ok(collector
        .references
        .into_iter()
        .filter(|reference| !reference.target.trim_start().starts_with("data:"))
        .collect())
}

/// Turns stylesheet references into links resolved against the stylesheet URL
pub fn css_links(stylesheet_url: &Url, css: &str) -> Result<Vec<Link>, String> {
    Ok(css_references(css)?
        .into_iter()
        .filter_map(|reference| {
            let url = stylesheet_url.join(&reference.target).ok()?;
            let asserts = if reference.is_font_source {
                vec![Assertion::Font]
            } else {
                vec![]
            };
            Some(Link {
                url: url.to_string(),
                role: UrlRole::Asset,
                asserts,
                location: LinkLocation::Css {
                    position: reference.position,
                    target: reference.target,
                },
            })
        })
        .collect())
}
