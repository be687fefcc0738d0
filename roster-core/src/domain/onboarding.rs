//! Role assignment for identities arriving from the identity provider.

use roster_model::{AgencyId, Member, MemberId, MemberStatus, Role};
use serde::Serialize;

/// An identity the provider told us about, already normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub identity_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// An existing member row not yet linked to any identity whose email
/// matches the arriving identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailMatch {
    pub member_id: MemberId,
    pub role: Role,
    pub agency_id: Option<AgencyId>,
    pub status: MemberStatus,
}

impl From<&Member> for EmailMatch {
    fn from(member: &Member) -> Self {
        Self {
            member_id: member.id,
            role: member.role,
            agency_id: member.agency_id,
            status: member.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    FirstSuperAdmin,
    Recovered,
    Default,
}

impl AssignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentKind::FirstSuperAdmin => "first_super_admin",
            AssignmentKind::Recovered => "recovered",
            AssignmentKind::Default => "default",
        }
    }
}

/// Outcome of [`decide_assignment`]. `existing` names the member row the
/// identity should be attached to; `None` means a new row is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub kind: AssignmentKind,
    pub role: Role,
    pub agency_id: Option<AgencyId>,
    pub status: MemberStatus,
    pub existing: Option<MemberId>,
}

/// Pick the role for a newly seen identity.
///
/// The first identity ever seen becomes super administrator. Otherwise an
/// unlinked member row with the same email hands over its role and agency.
/// Everyone else starts as a pending agency user without an agency.
pub fn decide_assignment(
    super_admin_count: i64,
    email_match: Option<&EmailMatch>,
) -> Assignment {
    if super_admin_count == 0 {
        return Assignment {
            kind: AssignmentKind::FirstSuperAdmin,
            role: Role::SuperAdmin,
            agency_id: email_match.and_then(|found| found.agency_id),
            status: MemberStatus::Active,
            existing: email_match.map(|found| found.member_id),
        };
    }

    if let Some(found) = email_match {
        // Pre-provisioned rows wait in Pending until their owner signs in.
        let status = match found.status {
            MemberStatus::Pending
                if found.agency_id.is_some() || found.role == Role::SuperAdmin =>
            {
                MemberStatus::Active
            }
            other => other,
        };
        return Assignment {
            kind: AssignmentKind::Recovered,
            role: found.role,
            agency_id: found.agency_id,
            status,
            existing: Some(found.member_id),
        };
    }

    Assignment {
        kind: AssignmentKind::Default,
        role: Role::AgencyUser,
        agency_id: None,
        status: MemberStatus::Pending,
        existing: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// The identity was already attached to a member row.
    AlreadyLinked,
    Assigned(AssignmentKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkOutcome {
    pub member: Member,
    pub kind: LinkKind,
}

impl LinkOutcome {
    pub fn newly_linked(&self) -> bool {
        matches!(self.kind, LinkKind::Assigned(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(role: Role, agency: Option<AgencyId>, status: MemberStatus) -> EmailMatch {
        EmailMatch {
            member_id: MemberId::new(),
            role,
            agency_id: agency,
            status,
        }
    }

    #[test]
    fn first_identity_becomes_super_admin() {
        let assignment = decide_assignment(0, None);
        assert_eq!(assignment.kind, AssignmentKind::FirstSuperAdmin);
        assert_eq!(assignment.role, Role::SuperAdmin);
        assert_eq!(assignment.status, MemberStatus::Active);
        assert_eq!(assignment.existing, None);
    }

    #[test]
    fn first_identity_reuses_matching_row() {
        let row = found(Role::AgencyUser, None, MemberStatus::Pending);
        let assignment = decide_assignment(0, Some(&row));
        assert_eq!(assignment.role, Role::SuperAdmin);
        assert_eq!(assignment.existing, Some(row.member_id));
    }

    #[test]
    fn email_match_recovers_role_and_agency() {
        let agency = AgencyId::new();
        let row = found(Role::AgencyAdmin, Some(agency), MemberStatus::Pending);
        let assignment = decide_assignment(1, Some(&row));
        assert_eq!(assignment.kind, AssignmentKind::Recovered);
        assert_eq!(assignment.role, Role::AgencyAdmin);
        assert_eq!(assignment.agency_id, Some(agency));
        assert_eq!(assignment.status, MemberStatus::Active);
        assert_eq!(assignment.existing, Some(row.member_id));
    }

    #[test]
    fn recovery_keeps_suspension() {
        let row = found(
            Role::AgencyUser,
            Some(AgencyId::new()),
            MemberStatus::Suspended,
        );
        assert_eq!(
            decide_assignment(2, Some(&row)).status,
            MemberStatus::Suspended
        );
    }

    #[test]
    fn recovered_row_without_agency_stays_pending() {
        let row = found(Role::AgencyUser, None, MemberStatus::Pending);
        assert_eq!(decide_assignment(1, Some(&row)).status, MemberStatus::Pending);
    }

    #[test]
    fn everyone_else_gets_default_role() {
        let assignment = decide_assignment(3, None);
        assert_eq!(assignment.kind, AssignmentKind::Default);
        assert_eq!(assignment.role, Role::AgencyUser);
        assert_eq!(assignment.agency_id, None);
        assert_eq!(assignment.status, MemberStatus::Pending);
    }
}
