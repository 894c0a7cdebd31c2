use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{RowStore, StoreError};
use crate::models::{NewException, Resolutions, WatchdogException, WatchdogResult};

/// Rows are read through `to_jsonb` so both backends share one serde model.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl RowStore for PgStore {
    async fn recent_results(&self, limit: usize) -> Result<Vec<WatchdogResult>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<WatchdogResult>>(
            "SELECT to_jsonb(w) FROM watchdog_results w
             WHERE w.run_id IS NOT NULL
             ORDER BY w.run_at DESC
             LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(r)| r).collect())
    }

    async fn run_results(&self, run_id: &str) -> Result<Vec<WatchdogResult>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<WatchdogResult>>(
            "SELECT to_jsonb(w) FROM watchdog_results w
             WHERE w.run_id::text = $1
             ORDER BY w.run_at ASC",
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(r)| r).collect())
    }

    async fn update_resolutions(
        &self,
        id: &str,
        resolutions: &Resolutions,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE watchdog_results SET resolutions = $2 WHERE id::text = $1")
            .bind(id)
            .bind(Json(resolutions))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_exception(
        &self,
        exception: &NewException,
    ) -> Result<WatchdogException, StoreError> {
        let Json(row) = sqlx::query_scalar::<_, Json<WatchdogException>>(
            "INSERT INTO watchdog_exceptions AS e (check_id, type, value, reason, created_by, active)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING to_jsonb(e)",
        )
        .bind(&exception.check_id)
        .bind(&exception.kind)
        .bind(&exception.value)
        .bind(&exception.reason)
        .bind(&exception.created_by)
        .bind(exception.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
