pub mod watchdog;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Watchdog
        .route("/api/v1/watchdog/runs", get(watchdog::list_runs))
        .route("/api/v1/watchdog/runs/{run_id}", get(watchdog::get_run))
        .route(
            "/api/v1/watchdog/runs/{run_id}/results/{result_id}/fixed",
            post(watchdog::mark_fixed),
        )
        .route(
            "/api/v1/watchdog/runs/{run_id}/results/{result_id}/exception",
            post(watchdog::add_exception),
        )
}
