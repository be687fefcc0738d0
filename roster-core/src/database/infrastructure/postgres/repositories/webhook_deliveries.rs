use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::ports::webhook_deliveries::WebhookDeliveriesRepository;
use crate::error::{Result, RosterError};

#[derive(Clone, Debug)]
pub struct PostgresWebhookDeliveriesRepository {
    pool: PgPool,
}

impl PostgresWebhookDeliveriesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WebhookDeliveriesRepository for PostgresWebhookDeliveriesRepository {
    async fn register(&self, delivery_id: &str, event_type: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_deliveries (delivery_id, event_type)
            VALUES ($1, $2)
            ON CONFLICT (delivery_id) DO NOTHING
            "#,
        )
        .bind(delivery_id)
        .bind(event_type)
        .execute(self.pool())
        .await
        .map_err(|e| {
            RosterError::Internal(format!("Failed to register webhook delivery: {e}"))
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn forget(&self, delivery_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM webhook_deliveries WHERE delivery_id = $1")
            .bind(delivery_id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                RosterError::Internal(format!("Failed to forget webhook delivery: {e}"))
            })?;
        Ok(())
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM webhook_deliveries WHERE received_at >= $1",
        )
        .bind(since)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            RosterError::Internal(format!("Failed to count webhook deliveries: {e}"))
        })?;
        Ok(count)
    }

    async fn purge_before(&self, before: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM webhook_deliveries WHERE received_at < $1")
            .bind(before)
            .execute(self.pool())
            .await
            .map_err(|e| {
                RosterError::Internal(format!("Failed to purge webhook deliveries: {e}"))
            })?;
        Ok(result.rows_affected())
    }
}
