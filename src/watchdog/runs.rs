use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{CheckStatus, Severity, WatchdogResult};

pub const DEFAULT_RUN_TYPE: &str = "daily";

#[derive(Debug, Clone, Serialize)]
pub struct Run {
    pub run_id: String,
    pub run_type: String,
    pub run_at: DateTime<Utc>,
    pub results: Vec<WatchdogResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub passed: i64,
    pub total_violations: i64,
    pub resolved: i64,
}

/// Group rows into runs, most recent run first. Rows without a run id or a
/// readable `run_at` are dropped.
pub fn group_by_run_id(rows: Vec<WatchdogResult>) -> Vec<Run> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut runs: Vec<Run> = Vec::new();

    for row in rows {
        let Some(run_id) = row.run_id.clone().filter(|id| !id.is_empty()) else {
            continue;
        };
        let Some(run_at) = row.run_at else {
            tracing::warn!("Skipping result {} of run {run_id}: no usable run_at", row.id);
            continue;
        };

        let pos = *index.entry(run_id.clone()).or_insert_with(|| {
            runs.push(Run {
                run_id,
                run_type: row
                    .run_type
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| DEFAULT_RUN_TYPE.to_string()),
                run_at,
                results: Vec::new(),
            });
            runs.len() - 1
        });

        let run = &mut runs[pos];
        if run_at < run.run_at {
            run.run_at = run_at;
        }
        run.results.push(row);
    }

    runs.sort_by(|a, b| b.run_at.cmp(&a.run_at));
    runs
}

/// Missing or unrecognised severities count as medium.
pub fn run_stats(run: &Run) -> RunStats {
    let mut stats = RunStats::default();

    for r in &run.results {
        match r.status {
            CheckStatus::Pass => stats.passed += 1,
            CheckStatus::Fail => {
                match r.severity {
                    Some(Severity::Critical) => stats.critical += r.violation_count,
                    Some(Severity::High) => stats.high += r.violation_count,
                    _ => stats.medium += r.violation_count,
                }
                stats.total_violations += r.violation_count;
                stats.resolved += r.resolutions.len() as i64;
            }
            CheckStatus::Other => {}
        }
    }

    stats
}
