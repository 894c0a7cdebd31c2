pub mod config;
pub mod error;
pub mod state;
pub mod models;
pub mod token;
pub mod guard;
pub mod inflight;
pub mod qualification;
pub mod webhook;
pub mod store;
pub mod watchdog;
pub mod routes;
pub mod views;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::inflight::InFlight;
use crate::state::{AppState, SharedState};
use crate::store::RowStore;
use crate::webhook::WebhookClient;

pub fn build_app(config: Config, store: Arc<dyn RowStore>) -> Router {
    let webhook = WebhookClient::new(config.webhook_url.clone());
    tracing::info!("Submissions go to {}", webhook.url());

    let max_body_size = config.max_body_size;
    let state: SharedState = Arc::new(AppState {
        config,
        store,
        webhook,
        inflight: InFlight::new(),
    });

    // Security headers
    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    Router::new()
        .merge(routes::api_routes())
        .merge(views::view_routes())
        .route("/health", axum::routing::get(health))
        .layer(security_headers)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
