use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ids::{AgencyId, MemberId},
    role::{MemberStatus, MembershipType, Role},
};

/// A user record belonging to at most one agency.
///
/// `identity_id` is the identity provider's user id once the person has
/// signed in; rows created by administrators stay unlinked until the
/// matching identity shows up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub identity_id: Option<String>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub membership_type: MembershipType,
    pub status: MemberStatus,
    pub agency_id: Option<AgencyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.email.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub membership_type: Option<MembershipType>,
    #[serde(default)]
    pub status: Option<MemberStatus>,
    #[serde(default)]
    pub agency_id: Option<AgencyId>,
}

/// Partial member update. Role changes go through
/// [`AssignRoleRequest`] instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub membership_type: Option<MembershipType>,
    #[serde(default)]
    pub status: Option<MemberStatus>,
    #[serde(default)]
    pub agency_id: Option<AgencyId>,
}

impl UpdateMemberRequest {
    /// Whether the update only touches fields a member may edit on their
    /// own record.
    pub fn is_profile_only(&self) -> bool {
        self.email.is_none()
            && self.membership_type.is_none()
            && self.status.is_none()
            && self.agency_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberQuery {
    #[serde(default)]
    pub agency_id: Option<AgencyId>,
    #[serde(default)]
    pub status: Option<MemberStatus>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}
