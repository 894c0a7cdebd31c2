use std::sync::Arc;

use crate::config::Config;
use crate::inflight::InFlight;
use crate::store::RowStore;
use crate::webhook::WebhookClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn RowStore>,
    pub webhook: WebhookClient,
    pub inflight: InFlight,
}
