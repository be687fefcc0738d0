use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

#[async_trait]
pub trait WebhookDeliveriesRepository: Send + Sync {
    /// Remember a delivery id. Returns false when it was seen before.
    async fn register(&self, delivery_id: &str, event_type: &str) -> Result<bool>;

    /// Forget a delivery so the provider's retry is processed again.
    async fn forget(&self, delivery_id: &str) -> Result<()>;

    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64>;

    /// Remove deliveries received before `before`, returning the number of
    /// rows removed.
    async fn purge_before(&self, before: DateTime<Utc>) -> Result<u64>;
}
