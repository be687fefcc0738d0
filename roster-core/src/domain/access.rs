//! Access policy.
//!
//! Every permission check in the service funnels through [`authorize`].
//! Handlers and services describe what they are about to do as an
//! [`Action`]; the policy compares it against the caller's [`Principal`].
//! Listing endpoints additionally narrow their result set with
//! [`agency_scope`].

use roster_model::{AgencyId, Member, MemberId, MemberStatus, Role};
use thiserror::Error;

/// Coarse capability names reported by the whoami endpoint.
pub mod permissions {
    pub const AGENCIES_READ: &str = "agencies:read";
    pub const AGENCIES_CREATE: &str = "agencies:create";
    pub const AGENCIES_UPDATE: &str = "agencies:update";
    pub const AGENCIES_DELETE: &str = "agencies:delete";
    pub const MEMBERS_READ: &str = "members:read";
    pub const MEMBERS_CREATE: &str = "members:create";
    pub const MEMBERS_UPDATE: &str = "members:update";
    pub const MEMBERS_DELETE: &str = "members:delete";
    pub const MEMBERS_ASSIGN_ROLE: &str = "members:assign_role";
    pub const ACTIVITY_READ: &str = "activity:read";
    pub const DIAGNOSTICS_READ: &str = "diagnostics:read";
    pub const ROLES_REPAIR: &str = "roles:repair";
    pub const PROFILE_UPDATE: &str = "profile:update";
    pub const ONBOARDING_COMPLETE: &str = "onboarding:complete";
}

/// The authenticated identity together with whatever the member table
/// knows about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub identity_id: String,
    pub email: Option<String>,
    pub member_id: Option<MemberId>,
    pub role: Option<Role>,
    pub agency_id: Option<AgencyId>,
    pub status: Option<MemberStatus>,
}

impl Principal {
    /// An identity with no member row yet.
    pub fn unlinked(identity_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            identity_id: identity_id.into(),
            email,
            member_id: None,
            role: None,
            agency_id: None,
            status: None,
        }
    }

    pub fn from_member(
        identity_id: impl Into<String>,
        email: Option<String>,
        member: &Member,
    ) -> Self {
        Self {
            identity_id: identity_id.into(),
            email: email.or_else(|| Some(member.email.clone())),
            member_id: Some(member.id),
            role: Some(member.role),
            agency_id: member.agency_id,
            status: Some(member.status),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == Some(MemberStatus::Active)
    }

    pub fn is_super_admin(&self) -> bool {
        self.is_active() && self.role == Some(Role::SuperAdmin)
    }

    pub fn is_self(&self, member: MemberId) -> bool {
        self.member_id == Some(member)
    }

    /// Whether the identity still has to pick an agency or be linked to a
    /// member row before it can use the rest of the API.
    pub fn needs_onboarding(&self) -> bool {
        match (self.member_id, self.role, self.status) {
            (None, _, _) => true,
            (_, _, Some(MemberStatus::Pending)) => true,
            (_, Some(Role::SuperAdmin), _) => false,
            _ => self.agency_id.is_none(),
        }
    }
}

/// The parts of a member row the policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberTarget {
    pub id: MemberId,
    pub agency_id: Option<AgencyId>,
    pub role: Role,
}

impl From<&Member> for MemberTarget {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            agency_id: member.agency_id,
            role: member.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListAgencies,
    ViewAgency(AgencyId),
    CreateAgency,
    UpdateAgency {
        agency: AgencyId,
        changes_status: bool,
    },
    DeleteAgency(AgencyId),
    ListMembers(Option<AgencyId>),
    ViewMember(MemberTarget),
    CreateMember {
        agency: Option<AgencyId>,
        role: Role,
    },
    UpdateMember {
        target: MemberTarget,
        profile_only: bool,
        new_agency: Option<AgencyId>,
    },
    DeleteMember(MemberTarget),
    AssignRole {
        target: MemberTarget,
        role: Role,
    },
    ViewActivity(Option<AgencyId>),
    ViewDashboard,
    ViewDiagnostics,
    RepairRoles,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("onboarding must be completed first")]
    NotOnboarded,
    #[error("member account is {0}")]
    Inactive(MemberStatus),
    #[error("{0}")]
    Forbidden(&'static str),
}

/// Decide whether `principal` may perform `action`.
pub fn authorize(principal: &Principal, action: &Action) -> Result<(), AccessDenied> {
    let role = principal.role.ok_or(AccessDenied::NotOnboarded)?;
    match principal.status {
        Some(MemberStatus::Active) => {}
        Some(MemberStatus::Pending) | None => return Err(AccessDenied::NotOnboarded),
        Some(other) => return Err(AccessDenied::Inactive(other)),
    }

    match action {
        Action::DeleteMember(target) if principal.is_self(target.id) => {
            return Err(AccessDenied::Forbidden("members cannot delete themselves"));
        }
        Action::AssignRole { target, .. } if principal.is_self(target.id) => {
            return Err(AccessDenied::Forbidden(
                "members cannot change their own role",
            ));
        }
        _ => {}
    }

    match role {
        Role::SuperAdmin => Ok(()),
        Role::AgencyAdmin => authorize_agency_admin(principal, action),
        Role::AgencyUser => authorize_agency_user(principal, action),
    }
}

fn authorize_agency_admin(
    principal: &Principal,
    action: &Action,
) -> Result<(), AccessDenied> {
    let in_own = |agency: Option<AgencyId>| {
        principal.agency_id.is_some() && agency == principal.agency_id
    };

    let allowed = match action {
        Action::ListAgencies
        | Action::ListMembers(None)
        | Action::ViewActivity(None)
        | Action::ViewDashboard => true,
        Action::ViewAgency(id)
        | Action::ListMembers(Some(id))
        | Action::ViewActivity(Some(id)) => in_own(Some(*id)),
        Action::UpdateAgency {
            agency,
            changes_status,
        } => {
            if *changes_status {
                return Err(AccessDenied::Forbidden(
                    "only super administrators may change an agency's status",
                ));
            }
            in_own(Some(*agency))
        }
        Action::CreateAgency | Action::DeleteAgency(_) => {
            return Err(AccessDenied::Forbidden(
                "only super administrators may create or delete agencies",
            ));
        }
        Action::ViewDiagnostics | Action::RepairRoles => {
            return Err(AccessDenied::Forbidden(
                "super administrator access required",
            ));
        }
        Action::ViewMember(target) => {
            principal.is_self(target.id) || in_own(target.agency_id)
        }
        Action::CreateMember { agency, role } => {
            if *role == Role::SuperAdmin {
                return Err(AccessDenied::Forbidden(
                    "agency administrators cannot grant super administrator",
                ));
            }
            in_own(*agency)
        }
        Action::UpdateMember {
            target,
            profile_only,
            new_agency,
        } => {
            // Their own row: profile fields only.
            let reachable = if principal.is_self(target.id) {
                *profile_only
            } else {
                in_own(target.agency_id) && target.role != Role::SuperAdmin
            };
            reachable && new_agency.is_none_or(|agency| in_own(Some(agency)))
        }
        Action::DeleteMember(target) => {
            in_own(target.agency_id) && target.role != Role::SuperAdmin
        }
        Action::AssignRole { target, role } => {
            if *role == Role::SuperAdmin {
                return Err(AccessDenied::Forbidden(
                    "agency administrators cannot grant super administrator",
                ));
            }
            in_own(target.agency_id) && target.role != Role::SuperAdmin
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessDenied::Forbidden(
            "agency administrators may only manage their own agency",
        ))
    }
}

fn authorize_agency_user(
    principal: &Principal,
    action: &Action,
) -> Result<(), AccessDenied> {
    let in_own = |agency: Option<AgencyId>| {
        principal.agency_id.is_some() && agency == principal.agency_id
    };

    let allowed = match action {
        Action::ListAgencies | Action::ListMembers(None) | Action::ViewDashboard => {
            true
        }
        Action::ViewAgency(id) | Action::ListMembers(Some(id)) => in_own(Some(*id)),
        Action::ViewMember(target) => {
            principal.is_self(target.id) || in_own(target.agency_id)
        }
        Action::UpdateMember {
            target,
            profile_only,
            new_agency,
        } => principal.is_self(target.id) && *profile_only && new_agency.is_none(),
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessDenied::Forbidden(
            "agency users may only view their agency and edit their own profile",
        ))
    }
}

/// Which agencies a listing may include for this caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgencyScope {
    All,
    Agency(AgencyId),
    Empty,
}

impl AgencyScope {
    pub fn agency(&self) -> Option<AgencyId> {
        match self {
            AgencyScope::Agency(id) => Some(*id),
            _ => None,
        }
    }

    /// Combine the scope with a caller-requested agency filter. `None`
    /// means the listing must come back empty.
    pub fn narrow(&self, requested: Option<AgencyId>) -> Option<Option<AgencyId>> {
        match (self, requested) {
            (AgencyScope::All, requested) => Some(requested),
            (AgencyScope::Agency(own), None) => Some(Some(*own)),
            (AgencyScope::Agency(own), Some(requested)) if *own == requested => {
                Some(Some(requested))
            }
            _ => None,
        }
    }
}

pub fn agency_scope(principal: &Principal) -> AgencyScope {
    if principal.is_super_admin() {
        return AgencyScope::All;
    }
    match principal.agency_id {
        Some(agency) => AgencyScope::Agency(agency),
        None => AgencyScope::Empty,
    }
}

/// Capability names for the whoami response.
pub fn capabilities(principal: &Principal) -> Vec<&'static str> {
    use permissions::*;

    if principal.needs_onboarding()
        && !matches!(
            principal.status,
            Some(MemberStatus::Inactive | MemberStatus::Suspended)
        )
    {
        return vec![ONBOARDING_COMPLETE];
    }
    if !principal.is_active() {
        return Vec::new();
    }

    match principal.role {
        Some(Role::SuperAdmin) => vec![
            AGENCIES_READ,
            AGENCIES_CREATE,
            AGENCIES_UPDATE,
            AGENCIES_DELETE,
            MEMBERS_READ,
            MEMBERS_CREATE,
            MEMBERS_UPDATE,
            MEMBERS_DELETE,
            MEMBERS_ASSIGN_ROLE,
            ACTIVITY_READ,
            DIAGNOSTICS_READ,
            ROLES_REPAIR,
            PROFILE_UPDATE,
        ],
        Some(Role::AgencyAdmin) => vec![
            AGENCIES_READ,
            AGENCIES_UPDATE,
            MEMBERS_READ,
            MEMBERS_CREATE,
            MEMBERS_UPDATE,
            MEMBERS_DELETE,
            MEMBERS_ASSIGN_ROLE,
            ACTIVITY_READ,
            PROFILE_UPDATE,
        ],
        Some(Role::AgencyUser) => vec![AGENCIES_READ, MEMBERS_READ, PROFILE_UPDATE],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role, agency: Option<AgencyId>) -> Principal {
        Principal {
            identity_id: "user_test".into(),
            email: Some("test@example.com".into()),
            member_id: Some(MemberId::new()),
            role: Some(role),
            agency_id: agency,
            status: Some(MemberStatus::Active),
        }
    }

    fn target(agency: Option<AgencyId>, role: Role) -> MemberTarget {
        MemberTarget {
            id: MemberId::new(),
            agency_id: agency,
            role,
        }
    }

    #[test]
    fn super_admin_may_do_everything_but_touch_own_role() {
        let admin = principal(Role::SuperAdmin, None);
        let other = AgencyId::new();
        for action in [
            Action::CreateAgency,
            Action::DeleteAgency(other),
            Action::ViewDiagnostics,
            Action::RepairRoles,
            Action::AssignRole {
                target: target(Some(other), Role::AgencyUser),
                role: Role::SuperAdmin,
            },
        ] {
            assert_eq!(authorize(&admin, &action), Ok(()), "{action:?}");
        }

        let own = MemberTarget {
            id: admin.member_id.unwrap(),
            agency_id: None,
            role: Role::SuperAdmin,
        };
        assert!(
            authorize(
                &admin,
                &Action::AssignRole {
                    target: own,
                    role: Role::AgencyUser
                }
            )
            .is_err()
        );
        assert!(authorize(&admin, &Action::DeleteMember(own)).is_err());
    }

    #[test]
    fn agency_admin_is_confined_to_own_agency() {
        let agency = AgencyId::new();
        let elsewhere = AgencyId::new();
        let admin = principal(Role::AgencyAdmin, Some(agency));

        assert!(authorize(&admin, &Action::ViewAgency(agency)).is_ok());
        assert!(authorize(&admin, &Action::ViewAgency(elsewhere)).is_err());
        assert!(authorize(&admin, &Action::CreateAgency).is_err());
        assert!(
            authorize(
                &admin,
                &Action::UpdateAgency {
                    agency,
                    changes_status: true
                }
            )
            .is_err()
        );
        assert!(
            authorize(
                &admin,
                &Action::CreateMember {
                    agency: Some(agency),
                    role: Role::AgencyAdmin
                }
            )
            .is_ok()
        );
        assert!(
            authorize(
                &admin,
                &Action::CreateMember {
                    agency: Some(elsewhere),
                    role: Role::AgencyUser
                }
            )
            .is_err()
        );
        assert!(
            authorize(
                &admin,
                &Action::AssignRole {
                    target: target(Some(agency), Role::AgencyUser),
                    role: Role::SuperAdmin
                }
            )
            .is_err()
        );
        assert!(
            authorize(
                &admin,
                &Action::DeleteMember(target(Some(agency), Role::SuperAdmin))
            )
            .is_err()
        );
        assert!(
            authorize(
                &admin,
                &Action::UpdateMember {
                    target: target(Some(agency), Role::AgencyUser),
                    profile_only: false,
                    new_agency: Some(elsewhere),
                }
            )
            .is_err()
        );
        assert!(authorize(&admin, &Action::ViewDiagnostics).is_err());
    }

    #[test]
    fn agency_admin_edits_only_profile_fields_on_own_row() {
        let agency = AgencyId::new();
        let admin = principal(Role::AgencyAdmin, Some(agency));
        let own = MemberTarget {
            id: admin.member_id.unwrap(),
            agency_id: Some(agency),
            role: Role::AgencyAdmin,
        };

        assert!(
            authorize(
                &admin,
                &Action::UpdateMember {
                    target: own,
                    profile_only: true,
                    new_agency: None,
                }
            )
            .is_ok()
        );
        assert!(
            authorize(
                &admin,
                &Action::UpdateMember {
                    target: own,
                    profile_only: false,
                    new_agency: None,
                }
            )
            .is_err()
        );
        assert!(
            authorize(
                &admin,
                &Action::UpdateMember {
                    target: target(Some(agency), Role::AgencyUser),
                    profile_only: false,
                    new_agency: None,
                }
            )
            .is_ok()
        );
    }

    #[test]
    fn agency_user_reads_own_agency_and_edits_own_profile() {
        let agency = AgencyId::new();
        let user = principal(Role::AgencyUser, Some(agency));
        let me = MemberTarget {
            id: user.member_id.unwrap(),
            agency_id: Some(agency),
            role: Role::AgencyUser,
        };

        assert!(authorize(&user, &Action::ListMembers(Some(agency))).is_ok());
        assert!(
            authorize(&user, &Action::ViewMember(target(Some(agency), Role::AgencyAdmin)))
                .is_ok()
        );
        assert!(
            authorize(
                &user,
                &Action::UpdateMember {
                    target: me,
                    profile_only: true,
                    new_agency: None
                }
            )
            .is_ok()
        );
        assert!(
            authorize(
                &user,
                &Action::UpdateMember {
                    target: me,
                    profile_only: false,
                    new_agency: None
                }
            )
            .is_err()
        );
        assert!(authorize(&user, &Action::ViewActivity(Some(agency))).is_err());
        assert!(
            authorize(
                &user,
                &Action::CreateMember {
                    agency: Some(agency),
                    role: Role::AgencyUser
                }
            )
            .is_err()
        );
    }

    #[test]
    fn unlinked_and_inactive_principals_are_denied() {
        let unlinked = Principal::unlinked("user_new", None);
        assert_eq!(
            authorize(&unlinked, &Action::ListAgencies),
            Err(AccessDenied::NotOnboarded)
        );
        assert_eq!(capabilities(&unlinked), vec![permissions::ONBOARDING_COMPLETE]);

        let mut suspended = principal(Role::SuperAdmin, None);
        suspended.status = Some(MemberStatus::Suspended);
        assert_eq!(
            authorize(&suspended, &Action::ListAgencies),
            Err(AccessDenied::Inactive(MemberStatus::Suspended))
        );
        assert!(capabilities(&suspended).is_empty());
    }

    #[test]
    fn scope_narrows_requested_agency() {
        let agency = AgencyId::new();
        let elsewhere = AgencyId::new();
        let admin = principal(Role::AgencyAdmin, Some(agency));
        let scope = agency_scope(&admin);

        assert_eq!(scope.narrow(None), Some(Some(agency)));
        assert_eq!(scope.narrow(Some(agency)), Some(Some(agency)));
        assert_eq!(scope.narrow(Some(elsewhere)), None);
        assert_eq!(
            agency_scope(&principal(Role::SuperAdmin, None)).narrow(Some(elsewhere)),
            Some(Some(elsewhere))
        );
        assert_eq!(AgencyScope::Empty.narrow(None), None);
    }

    #[test]
    fn needs_onboarding_until_agency_is_attached() {
        let mut user = principal(Role::AgencyUser, None);
        assert!(user.needs_onboarding());
        user.agency_id = Some(AgencyId::new());
        assert!(!user.needs_onboarding());
        assert!(!principal(Role::SuperAdmin, None).needs_onboarding());
    }
}
