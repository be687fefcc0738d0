use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{AgencyId, MemberId};

/// One row of the activity log written after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub actor_member_id: Option<MemberId>,
    pub actor_identity_id: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub agency_id: Option<AgencyId>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityQuery {
    #[serde(default)]
    pub agency_id: Option<AgencyId>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<Uuid>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Well-known activity action names
pub mod actions {
    pub const AGENCY_CREATED: &str = "agency.created";
    pub const AGENCY_UPDATED: &str = "agency.updated";
    pub const AGENCY_DELETED: &str = "agency.deleted";

    pub const MEMBER_CREATED: &str = "member.created";
    pub const MEMBER_UPDATED: &str = "member.updated";
    pub const MEMBER_DELETED: &str = "member.deleted";
    pub const MEMBER_ROLE_CHANGED: &str = "member.role_changed";
    pub const MEMBER_ONBOARDED: &str = "member.onboarded";
    pub const MEMBER_LINKED: &str = "member.linked";
    pub const MEMBER_UNLINKED: &str = "member.unlinked";
    pub const MEMBER_ROLE_REPAIRED: &str = "member.role_repaired";

    pub const SETUP_BOOTSTRAP: &str = "setup.bootstrap";
}

/// Well-known entity type names
pub mod entities {
    pub const AGENCY: &str = "agency";
    pub const MEMBER: &str = "member";
}
