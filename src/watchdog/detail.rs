use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{CheckStatus, Severity, WatchdogResult};

use super::runs::DEFAULT_RUN_TYPE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeverityFilter {
    #[default]
    All,
    Only(Severity),
}

impl SeverityFilter {
    pub const CHOICES: [SeverityFilter; 4] = [
        SeverityFilter::All,
        SeverityFilter::Only(Severity::Critical),
        SeverityFilter::Only(Severity::High),
        SeverityFilter::Only(Severity::Medium),
    ];

    pub fn parse(s: Option<&str>) -> Self {
        s.and_then(Severity::parse)
            .map(SeverityFilter::Only)
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityFilter::All => "all",
            SeverityFilter::Only(s) => s.as_str(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeverityFilter::All => "All",
            SeverityFilter::Only(s) => s.label(),
        }
    }

    pub fn matches(self, result: &WatchdogResult) -> bool {
        match self {
            SeverityFilter::All => true,
            SeverityFilter::Only(s) => result.severity == Some(s),
        }
    }
}

/// Failing results with violations, most severe first (stable).
pub fn failing_results(results: &[WatchdogResult]) -> Vec<&WatchdogResult> {
    let mut failing: Vec<&WatchdogResult> = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail && !r.violations.is_empty())
        .collect();
    failing.sort_by_key(|r| Severity::rank(r.severity));
    failing
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_type: String,
    pub run_at: Option<DateTime<Utc>>,
    pub passed: i64,
    pub total_violations: i64,
    pub total_resolved: i64,
    pub has_failures: bool,
}

pub fn summarize(results: &[WatchdogResult]) -> RunSummary {
    let failing = failing_results(results);
    let first = results.first();

    RunSummary {
        run_type: first
            .and_then(|r| r.run_type.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_RUN_TYPE.to_string()),
        run_at: results.iter().find_map(|r| r.run_at),
        passed: results
            .iter()
            .filter(|r| r.status == CheckStatus::Pass)
            .count() as i64,
        total_violations: failing.iter().map(|r| r.violation_count).sum(),
        total_resolved: results.iter().map(|r| r.resolutions.len() as i64).sum(),
        has_failures: !failing.is_empty(),
    }
}

/// `missing-owner-email` -> `Missing Owner Email`.
pub fn format_check_name(check_id: &str) -> String {
    check_id
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
