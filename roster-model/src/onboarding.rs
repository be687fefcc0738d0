//! Payloads for onboarding, the self-service diagnostics endpoints and the
//! role-repair utilities.

use serde::{Deserialize, Serialize};

use crate::{
    activity::ActivityEntry,
    ids::AgencyId,
    member::Member,
    role::Role,
};

/// Completes onboarding for the calling identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingRequest {
    #[serde(default)]
    pub agency_id: Option<AgencyId>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Only consulted when the session token carries no email claim and no
    /// member row exists yet.
    #[serde(default)]
    pub email: Option<String>,
}

/// Super-admin repair of a member's role and agency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRepairRequest {
    pub role: Role,
    #[serde(default)]
    pub agency_id: Option<AgencyId>,
    /// Detach the member from its agency instead of leaving it untouched.
    #[serde(default)]
    pub clear_agency: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapRequest {
    #[serde(default)]
    pub setup_token: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Who the server thinks the caller is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmI {
    pub identity_id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub agency_id: Option<AgencyId>,
    pub member: Option<Member>,
    pub capabilities: Vec<String>,
    pub needs_onboarding: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSyncOutcome {
    pub linked: bool,
    pub role: Option<Role>,
    pub member: Option<Member>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub agency_count: i64,
    pub inactive_agency_count: i64,
    pub member_count: i64,
    pub super_admin_count: i64,
    pub members_without_agency: i64,
    pub members_without_identity: i64,
    pub members_in_inactive_agencies: i64,
    pub webhook_deliveries_last_24h: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub role: Role,
    pub agency_id: Option<AgencyId>,
    pub agency_count: i64,
    pub member_count: i64,
    pub active_member_count: i64,
    pub pending_member_count: i64,
    pub recent_activity: Vec<ActivityEntry>,
}
