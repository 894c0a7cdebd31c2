use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::error::AppError;
use crate::inflight::{record_key, Action};
use crate::models::{ResolutionStatus, Severity, WatchdogResult};
use crate::state::SharedState;
use crate::watchdog::{self, resolve, ExceptionOutcome, ResolveError, SeverityFilter};

use super::{render, run_path};

#[derive(Template)]
#[template(path = "watchdog/runs.html")]
struct RunsTemplate {
    runs: Vec<RunRow>,
}

struct RunRow {
    href: String,
    run_at: String,
    run_type: String,
    critical: i64,
    high: i64,
    medium: i64,
    all_passed: bool,
    resolved: String,
}

#[derive(Template)]
#[template(path = "watchdog/run_detail.html")]
struct RunDetailTemplate {
    found: bool,
    run_type: String,
    run_type_label: &'static str,
    run_at: String,
    passed: i64,
    total_violations: i64,
    total_resolved: i64,
    filters: Vec<FilterPill>,
    groups: Vec<CheckGroup>,
    empty_message: Option<&'static str>,
    notice: Option<&'static str>,
    fixed_action: String,
    exception_action: String,
    severity: &'static str,
}

struct FilterPill {
    label: &'static str,
    href: String,
    active: bool,
}

struct CheckGroup {
    result_id: String,
    check_name: String,
    violation_count: i64,
    open: usize,
    severity_label: &'static str,
    severity_class: &'static str,
    items: Vec<ViolationItem>,
}

struct ViolationItem {
    record_id: String,
    record_name: String,
    details: String,
    hubspot_url: String,
    resolved: bool,
    resolution_label: Option<&'static str>,
    resolution_class: &'static str,
    fixed_busy: bool,
    exception_busy: bool,
    prompt: String,
}

#[derive(Deserialize)]
pub struct DetailQuery {
    pub severity: Option<String>,
    pub notice: Option<String>,
}

#[derive(Deserialize)]
pub struct ResolveForm {
    pub result_id: String,
    pub record_id: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub severity: String,
}

/// Banners carried across the redirect after a resolution action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
    ReasonRequired,
    Busy,
    NotFound,
    UpdateFailed,
    InsertFailed,
    Orphaned,
}

impl Notice {
    const ALL: [Notice; 6] = [
        Notice::ReasonRequired,
        Notice::Busy,
        Notice::NotFound,
        Notice::UpdateFailed,
        Notice::InsertFailed,
        Notice::Orphaned,
    ];

    fn code(self) -> &'static str {
        match self {
            Notice::ReasonRequired => "reason-required",
            Notice::Busy => "busy",
            Notice::NotFound => "not-found",
            Notice::UpdateFailed => "update-failed",
            Notice::InsertFailed => "insert-failed",
            Notice::Orphaned => "orphaned",
        }
    }

    fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.code() == code)
    }

    fn message(self) -> &'static str {
        match self {
            Notice::ReasonRequired => "An exception needs a reason. Nothing was changed.",
            Notice::Busy => "That action is already in progress for this record.",
            Notice::NotFound => "That check result is no longer part of this run.",
            Notice::UpdateFailed => "Could not record the resolution. Please try again.",
            Notice::InsertFailed => "Could not add the exception. Please try again.",
            Notice::Orphaned => {
                "The exception was added but the record could not be marked. Mark it fixed or contact support."
            }
        }
    }
}

fn detail_href(run_id: &str, filter: SeverityFilter, notice: Option<Notice>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if filter != SeverityFilter::All {
        query.append_pair("severity", filter.as_str());
    }
    if let Some(notice) = notice {
        query.append_pair("notice", notice.code());
    }
    let query = query.finish();

    if query.is_empty() {
        run_path(run_id)
    } else {
        format!("{}?{query}", run_path(run_id))
    }
}

fn severity_class(severity: Option<Severity>) -> &'static str {
    match severity {
        Some(Severity::Critical) => "critical",
        Some(Severity::High) => "high",
        _ => "medium",
    }
}

pub async fn runs_page(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let rows = match state.store.recent_results(state.config.run_limit).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Error fetching runs: {e}");
            Vec::new()
        }
    };

    let runs = watchdog::group_by_run_id(rows)
        .iter()
        .map(|run| {
            let stats = watchdog::run_stats(run);
            RunRow {
                href: run_path(&run.run_id),
                run_at: run.run_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                run_type: run.run_type.clone(),
                critical: stats.critical,
                high: stats.high,
                medium: stats.medium,
                all_passed: stats.total_violations == 0,
                resolved: if stats.total_violations > 0 {
                    format!("{}/{}", stats.resolved, stats.total_violations)
                } else {
                    "—".to_string()
                },
            }
        })
        .collect();

    render(&RunsTemplate { runs })
}

fn check_group(state: &SharedState, result: &WatchdogResult) -> CheckGroup {
    let items = result
        .violations
        .iter()
        .map(|v| {
            let status = result.resolution(&v.record_id).map(|r| r.status);
            let key = record_key(&result.id, &v.record_id);
            ViolationItem {
                record_id: v.record_id.clone(),
                record_name: v.record_name.clone(),
                details: v.details.clone(),
                hubspot_url: v.hubspot_url.clone(),
                resolved: status.is_some(),
                resolution_label: status.map(|s| match s {
                    Some(ResolutionStatus::Fixed) => "Fixed",
                    _ => "Exception",
                }),
                resolution_class: match status.flatten() {
                    Some(ResolutionStatus::Fixed) => "fixed",
                    _ => "exception",
                },
                fixed_busy: state.inflight.is_busy(Action::MarkFixed, &key),
                exception_busy: state.inflight.is_busy(Action::AddException, &key),
                prompt: resolve::exception_prompt(&result.check_id, &v.record_name),
            }
        })
        .collect();

    CheckGroup {
        result_id: result.id.clone(),
        check_name: watchdog::format_check_name(&result.check_id),
        violation_count: result.violation_count,
        open: result.unresolved().count(),
        severity_label: result.severity.unwrap_or(Severity::Medium).label(),
        severity_class: severity_class(result.severity),
        items,
    }
}

pub async fn run_page(
    State(state): State<SharedState>,
    Path(run_id): Path<String>,
    Query(q): Query<DetailQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = SeverityFilter::parse(q.severity.as_deref());

    let results = match state.store.run_results(&run_id).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Error fetching run {run_id}: {e}");
            Vec::new()
        }
    };

    let summary = watchdog::summarize(&results);
    let failing = watchdog::failing_results(&results);
    let groups: Vec<CheckGroup> = failing
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| check_group(&state, r))
        .collect();

    let empty_message = if !groups.is_empty() {
        None
    } else if failing.is_empty() {
        Some("All checks passed!")
    } else {
        Some("No violations match this filter.")
    };

    let filters = SeverityFilter::CHOICES
        .into_iter()
        .map(|f| FilterPill {
            label: f.label(),
            href: detail_href(&run_id, f, None),
            active: f == filter,
        })
        .collect();

    let template = RunDetailTemplate {
        found: !results.is_empty(),
        run_type_label: if summary.run_type == "hourly" { "Hourly" } else { "Daily" },
        run_type: summary.run_type,
        run_at: summary
            .run_at
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_default(),
        passed: summary.passed,
        total_violations: summary.total_violations,
        total_resolved: summary.total_resolved,
        filters,
        groups,
        empty_message,
        notice: q.notice.as_deref().and_then(Notice::parse).map(Notice::message),
        fixed_action: format!("{}/fixed", run_path(&run_id)),
        exception_action: format!("{}/exception", run_path(&run_id)),
        severity: filter.as_str(),
    };
    render(&template)
}

pub async fn mark_fixed(
    State(state): State<SharedState>,
    Path(run_id): Path<String>,
    Form(f): Form<ResolveForm>,
) -> Response {
    let filter = SeverityFilter::parse(Some(f.severity.as_str()));
    let back = |notice: Option<Notice>| Redirect::to(&detail_href(&run_id, filter, notice)).into_response();

    let key = record_key(&f.result_id, &f.record_id);
    let Some(_busy) = state.inflight.try_begin(Action::MarkFixed, key) else {
        return back(Some(Notice::Busy));
    };

    let row = match resolve::load_result(state.store.as_ref(), &run_id, &f.result_id).await {
        Ok(Some(row)) => row,
        Ok(None) => return back(Some(Notice::NotFound)),
        Err(e) => {
            tracing::error!("Error fetching run {run_id}: {e}");
            return back(Some(Notice::UpdateFailed));
        }
    };

    match resolve::mark_fixed(state.store.as_ref(), &row, &f.record_id).await {
        Ok(()) => back(None),
        Err(e) => {
            tracing::error!("Error marking {} fixed: {e}", f.record_id);
            back(Some(Notice::UpdateFailed))
        }
    }
}

pub async fn add_exception(
    State(state): State<SharedState>,
    Path(run_id): Path<String>,
    Form(f): Form<ResolveForm>,
) -> Response {
    let filter = SeverityFilter::parse(Some(f.severity.as_str()));
    let back = |notice: Option<Notice>| Redirect::to(&detail_href(&run_id, filter, notice)).into_response();

    if f.reason.trim().is_empty() {
        return back(Some(Notice::ReasonRequired));
    }

    let key = record_key(&f.result_id, &f.record_id);
    let Some(_busy) = state.inflight.try_begin(Action::AddException, key) else {
        return back(Some(Notice::Busy));
    };

    let row = match resolve::load_result(state.store.as_ref(), &run_id, &f.result_id).await {
        Ok(Some(row)) => row,
        Ok(None) => return back(Some(Notice::NotFound)),
        Err(e) => {
            tracing::error!("Error fetching run {run_id}: {e}");
            return back(Some(Notice::InsertFailed));
        }
    };

    match resolve::add_exception(state.store.as_ref(), &row, &f.record_id, Some(f.reason.as_str())).await {
        Ok(ExceptionOutcome::Added(_)) => back(None),
        Ok(ExceptionOutcome::Cancelled) => back(Some(Notice::ReasonRequired)),
        Err(ResolveError::Insert(e)) => {
            tracing::error!("Error adding exception: {e}");
            back(Some(Notice::InsertFailed))
        }
        Err(ResolveError::Update { .. }) => back(Some(Notice::Orphaned)),
    }
}
