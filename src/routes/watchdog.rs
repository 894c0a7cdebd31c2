use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::inflight::{record_key, Action};
use crate::state::SharedState;
use crate::watchdog::{self, resolve, ExceptionOutcome, SeverityFilter};

#[derive(Deserialize)]
pub struct DetailParams {
    pub severity: Option<String>,
}

#[derive(Deserialize)]
pub struct FixedRequest {
    pub record_id: String,
}

#[derive(Deserialize)]
pub struct ExceptionRequest {
    pub record_id: String,
    pub reason: Option<String>,
}

pub async fn list_runs(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let rows = state.store.recent_results(state.config.run_limit).await?;

    let runs: Vec<Value> = watchdog::group_by_run_id(rows)
        .iter()
        .map(|run| {
            json!({
                "run_id": run.run_id,
                "run_type": run.run_type,
                "run_at": run.run_at,
                "result_count": run.results.len(),
                "stats": watchdog::run_stats(run),
            })
        })
        .collect();

    Ok(Json(json!({ "runs": runs })))
}

pub async fn get_run(
    State(state): State<SharedState>,
    Path(run_id): Path<String>,
    Query(params): Query<DetailParams>,
) -> Result<Json<Value>, AppError> {
    let results = state.store.run_results(&run_id).await?;
    if results.is_empty() {
        return Err(AppError::NotFound("Run not found".to_string()));
    }

    let filter = SeverityFilter::parse(params.severity.as_deref());
    let failing: Vec<_> = watchdog::failing_results(&results)
        .into_iter()
        .filter(|r| filter.matches(r))
        .collect();

    Ok(Json(json!({
        "run_id": run_id,
        "summary": watchdog::summarize(&results),
        "failing": failing,
        "results": results,
    })))
}

async fn refetch(state: &SharedState, run_id: &str) -> Result<Json<Value>, AppError> {
    let results = state.store.run_results(run_id).await?;
    Ok(Json(json!({ "run_id": run_id, "results": results })))
}

pub async fn mark_fixed(
    State(state): State<SharedState>,
    Path((run_id, result_id)): Path<(String, String)>,
    Json(req): Json<FixedRequest>,
) -> Result<Json<Value>, AppError> {
    let key = record_key(&result_id, &req.record_id);
    let _busy = state
        .inflight
        .try_begin(Action::MarkFixed, key)
        .ok_or_else(|| AppError::Conflict("Mark fixed already in progress for this record".to_string()))?;

    let row = resolve::load_result(state.store.as_ref(), &run_id, &result_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Result not found in run".to_string()))?;

    resolve::mark_fixed(state.store.as_ref(), &row, &req.record_id).await?;
    refetch(&state, &run_id).await
}

pub async fn add_exception(
    State(state): State<SharedState>,
    Path((run_id, result_id)): Path<(String, String)>,
    Json(req): Json<ExceptionRequest>,
) -> Result<Json<Value>, AppError> {
    let key = record_key(&result_id, &req.record_id);
    let _busy = state
        .inflight
        .try_begin(Action::AddException, key)
        .ok_or_else(|| AppError::Conflict("Add exception already in progress for this record".to_string()))?;

    let row = resolve::load_result(state.store.as_ref(), &run_id, &result_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Result not found in run".to_string()))?;

    match resolve::add_exception(state.store.as_ref(), &row, &req.record_id, req.reason.as_deref())
        .await?
    {
        ExceptionOutcome::Cancelled => Err(AppError::BadRequest("reason is required".to_string())),
        ExceptionOutcome::Added(exception) => {
            let Json(mut body) = refetch(&state, &run_id).await?;
            body["exception"] = json!(exception);
            Ok(Json(body))
        }
    }
}
