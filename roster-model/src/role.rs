//! Roles, membership types and lifecycle statuses.
//!
//! Stored and serialized using their canonical `SCREAMING_SNAKE_CASE`
//! names. Parsing is lenient about case and separators and understands the
//! legacy role names older records still carry (`ADMIN`, `PRIMARY`,
//! `STANDARD`, `GUEST`, `USER`).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase().replace(['-', ' '], "_")
}

/// Authorization level of an authenticated identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Role {
    SuperAdmin,
    AgencyAdmin,
    AgencyUser,
}

impl Role {
    pub const ALL: [Role; 3] =
        [Role::SuperAdmin, Role::AgencyAdmin, Role::AgencyUser];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::AgencyAdmin => "AGENCY_ADMIN",
            Role::AgencyUser => "AGENCY_USER",
        }
    }

    /// Whether the role may manage members of an agency.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::AgencyAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "SUPER_ADMIN" | "SUPERADMIN" => Ok(Role::SuperAdmin),
            "AGENCY_ADMIN" | "ADMIN" => Ok(Role::AgencyAdmin),
            "AGENCY_USER" | "USER" | "PRIMARY" | "STANDARD" | "GUEST" => {
                Ok(Role::AgencyUser)
            }
            _ => Err(ModelError::UnknownRole(raw.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Kind of membership a member holds inside an agency.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum MembershipType {
    Primary,
    #[default]
    Standard,
    Guest,
}

impl MembershipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipType::Primary => "PRIMARY",
            MembershipType::Standard => "STANDARD",
            MembershipType::Guest => "GUEST",
        }
    }
}

impl fmt::Display for MembershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipType {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "PRIMARY" => Ok(MembershipType::Primary),
            "STANDARD" => Ok(MembershipType::Standard),
            "GUEST" => Ok(MembershipType::Guest),
            _ => Err(ModelError::UnknownMembershipType(raw.to_string())),
        }
    }
}

impl TryFrom<String> for MembershipType {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lifecycle status of a member record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum MemberStatus {
    Active,
    Inactive,
    #[default]
    Pending,
    Suspended,
}

impl MemberStatus {
    pub const ALL: [MemberStatus; 4] = [
        MemberStatus::Active,
        MemberStatus::Inactive,
        MemberStatus::Pending,
        MemberStatus::Suspended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "ACTIVE",
            MemberStatus::Inactive => "INACTIVE",
            MemberStatus::Pending => "PENDING",
            MemberStatus::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "ACTIVE" => Ok(MemberStatus::Active),
            "INACTIVE" => Ok(MemberStatus::Inactive),
            "PENDING" => Ok(MemberStatus::Pending),
            "SUSPENDED" => Ok(MemberStatus::Suspended),
            _ => Err(ModelError::UnknownStatus(raw.to_string())),
        }
    }
}

impl TryFrom<String> for MemberStatus {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lifecycle status of an agency.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum AgencyStatus {
    #[default]
    Active,
    Inactive,
}

impl AgencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgencyStatus::Active => "ACTIVE",
            AgencyStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for AgencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgencyStatus {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "ACTIVE" => Ok(AgencyStatus::Active),
            "INACTIVE" => Ok(AgencyStatus::Inactive),
            _ => Err(ModelError::UnknownStatus(raw.to_string())),
        }
    }
}

impl TryFrom<String> for AgencyStatus {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_role_names_collapse_onto_canonical_roles() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::AgencyAdmin);
        assert_eq!("primary".parse::<Role>().unwrap(), Role::AgencyUser);
        assert_eq!("Standard".parse::<Role>().unwrap(), Role::AgencyUser);
        assert_eq!(" guest ".parse::<Role>().unwrap(), Role::AgencyUser);
        assert_eq!("super-admin".parse::<Role>().unwrap(), Role::SuperAdmin);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "OWNER".parse::<Role>().unwrap_err();
        assert_eq!(err, ModelError::UnknownRole("OWNER".to_string()));
    }

    #[test]
    fn roles_serialize_canonically_and_accept_aliases() {
        let json = serde_json::to_string(&Role::AgencyAdmin).unwrap();
        assert_eq!(json, "\"AGENCY_ADMIN\"");

        let parsed: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(parsed, Role::AgencyAdmin);
        assert!(serde_json::from_str::<Role>("\"ROOT\"").is_err());
    }

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!(
            "suspended".parse::<MemberStatus>().unwrap(),
            MemberStatus::Suspended
        );
        assert_eq!(
            "inactive".parse::<AgencyStatus>().unwrap(),
            AgencyStatus::Inactive
        );
        assert!("archived".parse::<AgencyStatus>().is_err());
    }

    #[test]
    fn defaults_match_new_record_expectations() {
        assert_eq!(MemberStatus::default(), MemberStatus::Pending);
        assert_eq!(MembershipType::default(), MembershipType::Standard);
        assert_eq!(AgencyStatus::default(), AgencyStatus::Active);
    }
}
