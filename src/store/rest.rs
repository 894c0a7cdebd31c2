use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{RowStore, StoreError};
use crate::models::{NewException, Resolutions, WatchdogException, WatchdogResult};

const RESULTS_TABLE: &str = "watchdog_results";
const EXCEPTIONS_TABLE: &str = "watchdog_exceptions";

pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(project_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }

    fn table(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let resp = self.authorized(req).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(1024)
            .collect::<String>();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, StoreError> {
        let resp = self.send(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RowStore for RestStore {
    async fn recent_results(&self, limit: usize) -> Result<Vec<WatchdogResult>, StoreError> {
        let req = self.client.get(self.table(RESULTS_TABLE)).query(&[
            ("select", "*".to_string()),
            ("run_id", "not.is.null".to_string()),
            ("order", "run_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]);
        self.fetch(req).await
    }

    async fn run_results(&self, run_id: &str) -> Result<Vec<WatchdogResult>, StoreError> {
        let req = self.client.get(self.table(RESULTS_TABLE)).query(&[
            ("select", "*".to_string()),
            ("run_id", format!("eq.{run_id}")),
            ("order", "run_at.asc".to_string()),
        ]);
        self.fetch(req).await
    }

    async fn update_resolutions(
        &self,
        id: &str,
        resolutions: &Resolutions,
    ) -> Result<(), StoreError> {
        let req = self
            .client
            .patch(self.table(RESULTS_TABLE))
            .query(&[("id", format!("eq.{id}"))])
            .json(&json!({ "resolutions": resolutions }));
        self.send(req).await?;
        Ok(())
    }

    async fn insert_exception(
        &self,
        exception: &NewException,
    ) -> Result<WatchdogException, StoreError> {
        let req = self
            .client
            .post(self.table(EXCEPTIONS_TABLE))
            .header("Prefer", "return=representation")
            .json(exception);
        let rows: Vec<WatchdogException> = self.fetch(req).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no row".to_string()))
    }
}
