pub mod form;
pub mod watchdog;

use askama::Template;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;

use crate::error::AppError;
use crate::state::SharedState;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        // Qualification form
        .route("/", get(form::show).post(form::submit))
        // Watchdog dashboard
        .route("/watchdog", get(watchdog::runs_page))
        .route("/watchdog/run/{run_id}", get(watchdog::run_page))
        .route("/watchdog/run/{run_id}/fixed", post(watchdog::mark_fixed))
        .route("/watchdog/run/{run_id}/exception", post(watchdog::add_exception))
}

fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    template
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(format!("Template render failed: {e}")))
}

pub fn run_path(run_id: &str) -> String {
    let segment: String = form_urlencoded::byte_serialize(run_id.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("/watchdog/run/{segment}")
}
