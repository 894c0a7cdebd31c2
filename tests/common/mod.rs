#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

use salwatch::config::{Config, StoreConfig};
use salwatch::models::{NewException, Resolutions, WatchdogException, WatchdogResult};
use salwatch::store::{RowStore, StoreError};

/// In-memory stand-in for the watchdog tables.
#[derive(Default)]
pub struct MemoryStore {
    pub results: Mutex<Vec<WatchdogResult>>,
    pub exceptions: Mutex<Vec<(WatchdogException, NewException)>>,
    pub updates: AtomicUsize,
    pub fail_queries: AtomicBool,
    pub fail_updates: AtomicBool,
    pub fail_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn with_rows(rows: Value) -> Arc<Self> {
        let rows: Vec<WatchdogResult> = serde_json::from_value(rows).expect("invalid test rows");
        let store = Self::default();
        *store.results.lock().unwrap() = rows;
        Arc::new(store)
    }

    pub fn row(&self, id: &str) -> WatchdogResult {
        self.results
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .expect("row not found")
    }

    pub fn exception_count(&self) -> usize {
        self.exceptions.lock().unwrap().len()
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

fn failure() -> StoreError {
    StoreError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn recent_results(&self, limit: usize) -> Result<Vec<WatchdogResult>, StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(failure());
        }
        let mut rows: Vec<WatchdogResult> = self
            .results
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.run_id.is_some())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.run_at.cmp(&a.run_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn run_results(&self, run_id: &str) -> Result<Vec<WatchdogResult>, StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(failure());
        }
        let mut rows: Vec<WatchdogResult> = self
            .results
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.run_id.as_deref() == Some(run_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.run_at.cmp(&b.run_at));
        Ok(rows)
    }

    async fn update_resolutions(
        &self,
        id: &str,
        resolutions: &Resolutions,
    ) -> Result<(), StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(failure());
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.results.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.resolutions = resolutions.clone();
        }
        Ok(())
    }

    async fn insert_exception(
        &self,
        exception: &NewException,
    ) -> Result<WatchdogException, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(failure());
        }
        let mut row = serde_json::to_value(exception).unwrap();
        row["id"] = json!(Uuid::now_v7().to_string());
        let stored: WatchdogException = serde_json::from_value(row).unwrap();
        self.exceptions
            .lock()
            .unwrap()
            .push((stored.clone(), exception.clone()));
        Ok(stored)
    }
}

/// A webhook that records every body it receives.
pub struct MockWebhook {
    pub addr: SocketAddr,
    pub received: Arc<Mutex<Vec<Value>>>,
    pub status: Arc<AtomicU16>,
    pub delay_ms: Arc<AtomicU64>,
}

#[derive(Clone)]
struct MockState {
    received: Arc<Mutex<Vec<Value>>>,
    status: Arc<AtomicU16>,
    delay_ms: Arc<AtomicU64>,
}

async fn receive(State(state): State<MockState>, Json(body): Json<Value>) -> StatusCode {
    let delay = state.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    state.received.lock().unwrap().push(body);
    StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap()
}

impl MockWebhook {
    pub async fn spawn() -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let status = Arc::new(AtomicU16::new(200));
        let delay_ms = Arc::new(AtomicU64::new(0));

        let app = Router::new()
            .route("/webhook/sal-form-submit", post(receive))
            .with_state(MockState {
                received: received.clone(),
                status: status.clone(),
                delay_ms: delay_ms.clone(),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock webhook");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock webhook failed");
        });

        Self {
            addr,
            received,
            status,
            delay_ms,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/webhook/sal-form-submit", self.addr)
    }

    pub fn calls(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    pub fn respond_with(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    pub fn delay(&self, ms: u64) {
        self.delay_ms.store(ms, Ordering::SeqCst);
    }
}

/// A running app instance wired to a memory store and a mock webhook.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryStore>,
    pub webhook: MockWebhook,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// GET a page, return (status, body).
    pub async fn get_page(&self, path: &str, cookie: Option<&str>) -> (StatusCode, String) {
        let mut req = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        let resp = req.send().await.expect("get request failed");
        let status = resp.status();
        (status, resp.text().await.unwrap_or_default())
    }

    /// Make a GET request expecting JSON.
    pub async fn get_json(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make a POST request with a JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// POST a form, return the raw response.
    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> reqwest::Response {
        let mut req = self.client.post(self.url(path)).form(fields);
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        req.send().await.expect("post request failed")
    }
}

pub fn test_config(webhook_url: String) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        webhook_url,
        store: StoreConfig::Rest {
            url: "http://localhost:0".to_string(),
            api_key: "unused".to_string(),
        },
        run_limit: 200,
        guard_max_age_days: 400,
        max_body_size: 65_536,
        log_level: "warn".to_string(),
    }
}

/// Spawn the app on a random port.
pub async fn spawn_app(store: Arc<MemoryStore>) -> TestApp {
    let webhook = MockWebhook::spawn().await;
    let app = salwatch::build_app(test_config(webhook.url()), store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        store,
        webhook,
    }
}

/// Rows of two runs: `r1` (daily, three checks) and `r2` (hourly, one pass).
pub fn sample_rows() -> Value {
    json!([
        {
            "id": 1,
            "run_id": "r1",
            "run_type": "daily",
            "run_at": "2024-01-01T10:00:00Z",
            "status": "pass",
            "severity": "high",
            "check_id": "deal-has-owner",
            "violation_count": 0,
            "violations": [],
            "resolutions": {}
        },
        {
            "id": 2,
            "run_id": "r1",
            "run_type": "daily",
            "run_at": "2024-01-01T09:00:00Z",
            "status": "fail",
            "severity": "medium",
            "check_id": "contact-missing-email",
            "violation_count": 1,
            "violations": [
                { "record_id": "c-9", "record_name": "Jane Roe", "details": "no email", "hubspot_url": "https://app.hubspot.com/contacts/9" }
            ],
            "resolutions": {}
        },
        {
            "id": 3,
            "run_id": "r1",
            "run_type": "daily",
            "run_at": "2024-01-01T09:30:00Z",
            "status": "fail",
            "severity": "critical",
            "check_id": "missing-owner",
            "violation_count": 2,
            "violations": [
                { "record_id": "d-1", "record_name": "Big Deal", "details": "no owner", "hubspot_url": "https://app.hubspot.com/deals/1" },
                { "record_id": "d-2", "record_name": "Small Deal", "details": "no owner", "hubspot_url": "https://app.hubspot.com/deals/2" }
            ],
            "resolutions": { "d-2": { "status": "fixed", "resolved_by": "dashboard", "resolved_at": "2024-01-01T11:00:00.000Z" } }
        },
        {
            "id": 4,
            "run_id": "r2",
            "run_type": "hourly",
            "run_at": "2024-01-02T00:00:00Z",
            "status": "pass",
            "check_id": "deal-has-owner",
            "violation_count": 0
        },
        {
            "id": 5,
            "run_id": null,
            "run_at": "2024-01-03T00:00:00Z",
            "status": "fail",
            "severity": "critical",
            "check_id": "legacy",
            "violation_count": 7
        }
    ])
}
