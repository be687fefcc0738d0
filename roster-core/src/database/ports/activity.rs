use async_trait::async_trait;
use uuid::Uuid;

use roster_model::{ActivityEntry, AgencyId, MemberId};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub actor_member_id: Option<MemberId>,
    pub actor_identity_id: Option<String>,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Option<Uuid>,
    pub agency_id: Option<AgencyId>,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub agency: Option<AgencyId>,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn record(&self, activity: NewActivity) -> Result<ActivityEntry>;

    /// Newest first.
    async fn list(&self, filter: &ActivityFilter) -> Result<(Vec<ActivityEntry>, i64)>;
}
