pub mod postgres;
pub mod rest;

use async_trait::async_trait;

use crate::models::{NewException, Resolutions, WatchdogException, WatchdogResult};

pub use postgres::PgStore;
pub use rest::RestStore;

#[derive(Debug)]
pub enum StoreError {
    Request(String),
    Status { status: u16, body: String },
    Decode(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Request(msg) => write!(f, "Store request failed: {msg}"),
            StoreError::Status { status, body } => {
                write!(f, "Store returned status {status}: {body}")
            }
            StoreError::Decode(msg) => write!(f, "Store response could not be decoded: {msg}"),
            StoreError::Database(err) => write!(f, "Database error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Request(err.to_string())
        }
    }
}

#[async_trait]
pub trait RowStore: Send + Sync {
    /// Newest first.
    async fn recent_results(&self, limit: usize) -> Result<Vec<WatchdogResult>, StoreError>;

    /// Oldest first.
    async fn run_results(&self, run_id: &str) -> Result<Vec<WatchdogResult>, StoreError>;

    async fn update_resolutions(
        &self,
        id: &str,
        resolutions: &Resolutions,
    ) -> Result<(), StoreError>;

    async fn insert_exception(
        &self,
        exception: &NewException,
    ) -> Result<WatchdogException, StoreError>;
}
