//! Core data model definitions shared across Roster crates.
//!
//! Everything here is plain data: identifiers, role and status enums,
//! persisted records, request/response payloads and the versioned route
//! table. Behaviour lives in `roster-core`.
#![allow(missing_docs)]

pub mod activity;
pub mod agency;
pub mod api;
pub mod error;
pub mod ids;
pub mod member;
pub mod onboarding;
pub mod role;
pub mod routes;

// Intentionally curated re-exports for downstream consumers.
pub use activity::{ActivityEntry, ActivityQuery, actions};
pub use agency::{
    Agency, AgencyOption, AgencyQuery, AgencySummary, CreateAgencyRequest,
    UpdateAgencyRequest,
};
pub use api::{ApiResponse, Page};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{AgencyId, MemberId};
pub use member::{
    AssignRoleRequest, CreateMemberRequest, Member, MemberQuery,
    UpdateMemberRequest,
};
pub use onboarding::{
    BootstrapRequest, DashboardSummary, DiagnosticsReport, OnboardingRequest,
    RoleRepairRequest, RoleSyncOutcome, WhoAmI,
};
pub use role::{AgencyStatus, MemberStatus, MembershipType, Role};
