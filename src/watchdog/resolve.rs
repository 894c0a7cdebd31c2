use chrono::{DateTime, Utc};

use crate::models::{
    NewException, Resolution, ResolutionStatus, Resolutions, WatchdogException, WatchdogResult,
};
use crate::qualification::iso_timestamp;
use crate::store::{RowStore, StoreError};

pub const ACTOR: &str = "dashboard";

/// `row.resolutions` with `record_id` set; other entries are copied as stored.
pub fn with_resolution(row: &WatchdogResult, record_id: &str, resolution: Resolution) -> Resolutions {
    let mut updated = row.resolutions.clone();
    updated.insert(record_id.to_string(), resolution.to_value());
    updated
}

pub fn fixed(at: DateTime<Utc>) -> Resolution {
    Resolution {
        status: Some(ResolutionStatus::Fixed),
        resolved_by: Some(ACTOR.to_string()),
        resolved_at: Some(iso_timestamp(at)),
        ..Resolution::default()
    }
}

pub fn excepted(exception_id: &str, at: DateTime<Utc>) -> Resolution {
    Resolution {
        status: Some(ResolutionStatus::Exception),
        exception_id: Some(exception_id.to_string()),
        resolved_at: Some(iso_timestamp(at)),
        ..Resolution::default()
    }
}

pub async fn load_result(
    store: &dyn RowStore,
    run_id: &str,
    result_id: &str,
) -> Result<Option<WatchdogResult>, StoreError> {
    let rows = store.run_results(run_id).await?;
    Ok(rows.into_iter().find(|r| r.id == result_id))
}

pub async fn mark_fixed(
    store: &dyn RowStore,
    row: &WatchdogResult,
    record_id: &str,
) -> Result<(), StoreError> {
    let updated = with_resolution(row, record_id, fixed(Utc::now()));
    store.update_resolutions(&row.id, &updated).await?;
    tracing::info!("Marked {record_id} fixed on result {}", row.id);
    Ok(())
}

#[derive(Debug)]
pub enum ExceptionOutcome {
    Cancelled,
    Added(WatchdogException),
}

#[derive(Debug)]
pub enum ResolveError {
    Insert(StoreError),
    /// The exception row exists but the resolution was not written.
    Update {
        exception_id: String,
        source: StoreError,
    },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::Insert(err) => write!(f, "Failed to add exception: {err}"),
            ResolveError::Update {
                exception_id,
                source,
            } => write!(
                f,
                "Exception {exception_id} added but resolution not recorded: {source}"
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Inserts the exception, then writes the resolution. Not atomic.
pub async fn add_exception(
    store: &dyn RowStore,
    row: &WatchdogResult,
    record_id: &str,
    reason: Option<&str>,
) -> Result<ExceptionOutcome, ResolveError> {
    let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(ExceptionOutcome::Cancelled);
    };

    let exception = store
        .insert_exception(&NewException {
            check_id: row.check_id.clone(),
            kind: "record".to_string(),
            value: record_id.to_string(),
            reason: reason.to_string(),
            created_by: ACTOR.to_string(),
            active: true,
        })
        .await
        .map_err(ResolveError::Insert)?;

    let updated = with_resolution(row, record_id, excepted(&exception.id, Utc::now()));
    if let Err(source) = store.update_resolutions(&row.id, &updated).await {
        tracing::warn!(
            "Exception {} for {record_id} on {} has no resolution entry: {source}",
            exception.id,
            row.check_id
        );
        return Err(ResolveError::Update {
            exception_id: exception.id,
            source,
        });
    }

    tracing::info!(
        "Added exception {} for {record_id} on {}",
        exception.id,
        row.check_id
    );
    Ok(ExceptionOutcome::Added(exception))
}

pub fn exception_prompt(check_id: &str, record_name: &str) -> String {
    format!(
        "Why should \"{record_name}\" be excluded from \"{}\"?",
        super::format_check_name(check_id)
    )
}
