//! Finding statistics
//!
//! Counts findings per type for the summary printed after a text report.

use crate::validate::ValidationResult;
use indexmap::IndexMap;
use std::fmt::Write;

/// Findings summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindingStatistics {
    /// Total number of findings
    pub total: usize,

    /// Count of findings by type, in order of first appearance
    pub by_type: IndexMap<&'static str, usize>,

    /// Number of distinct URLs with at least one finding
    pub affected_urls: usize,
}

impl FindingStatistics {
    pub fn from_findings(findings: &[ValidationResult]) -> Self {
        let mut by_type = IndexMap::new();
        for finding in findings {
            *by_type.entry(finding.kind()).or_insert(0) += 1;
        }

        let mut urls: Vec<&str> = findings.iter().filter_map(|finding| finding.url()).collect();
        urls.sort_unstable();
        urls.dedup();

        Self {
            total: findings.len(),
            by_type,
            affected_urls: urls.len(),
        }
    }

    pub fn count(&self, kind: &str) -> usize {
        self.by_type.get(kind).copied().unwrap_or(0)
    }
}

/// Formats statistics as the summary block of a text report
pub fn format_statistics(stats: &FindingStatistics) -> String {
    let mut out = String::new();

    if stats.total == 0 {
        out.push_str("No findings.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{} findings on {} URLs",
        stats.total, stats.affected_urls
    );

    // Sort types by count (descending), keeping first-appearance order on ties
    let mut type_counts: Vec<_> = stats.by_type.iter().collect();
    type_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (kind, count) in type_counts {
        let percentage = (*count as f64 / stats.total as f64) * 100.0;
        let _ = writeln!(out, "  {}: {} ({:.1}%)", kind, count, percentage);
    }

    out
}
