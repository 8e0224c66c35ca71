//! Robots.txt parser implementation
//!
//! This module collects the directives the validator cares about using the
//! robotstxt crate's callback parser.

use robotstxt::{parse_robotstxt, RobotsParseHandler};

/// The parts of a robots.txt file that point at other resources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsTxt {
    /// `Sitemap:` values in file order, as written
    pub sitemaps: Vec<String>,
    /// Value of the last `Host:` directive, if any
    pub host: Option<String>,
}

impl RobotsTxt {
    /// Parses robots.txt content
    ///
    /// The format is line based and forgiving: unknown lines are skipped, so
    /// parsing never fails.
    pub fn parse(content: &str) -> Self {
        let mut handler = DirectiveCollector::default();
        parse_robotstxt(content, &mut handler);
        handler.robots
    }
}

#[derive(Default)]
struct DirectiveCollector {
    robots: RobotsTxt,
}

impl RobotsParseHandler for DirectiveCollector {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, _user_agent: &str) {}

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {}

    fn handle_disallow(&mut self, _line_num: u32, _value: &str) {}

    fn handle_sitemap(&mut self, _line_num: u32, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.robots.sitemaps.push(value.to_string());
        }
    }

    // `Host:` is a Yandex extension the parser does not know about
    fn handle_unknown_action(&mut self, _line_num: u32, action: &str, value: &str) {
        if action.trim().eq_ignore_ascii_case("host") {
            let value = value.trim();
            if !value.is_empty() {
                self.robots.host = Some(value.to_string());
            }
        }
    }
}
