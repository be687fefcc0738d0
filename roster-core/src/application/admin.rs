use chrono::{Duration, Utc};
use serde_json::json;
use tracing::info;

use roster_model::{
    DashboardSummary, DiagnosticsReport, Member, MemberId, MemberStatus, Role,
    RoleRepairRequest, actions, activity::entities,
};

use super::{
    activity::{ActivityRecord, ActivityService, Actor},
    members::MemberService,
    unit_of_work::AppUnitOfWork,
};
use crate::{
    domain::access::{AccessDenied, Action, AgencyScope, Principal, agency_scope, authorize},
    error::Result,
};

const RECENT_ACTIVITY_LIMIT: i64 = 10;

/// Super-admin diagnostics, role repair and the per-role dashboard.
#[derive(Debug, Clone)]
pub struct AdminService {
    uow: AppUnitOfWork,
    members: MemberService,
    activity: ActivityService,
}

impl AdminService {
    pub fn new(uow: AppUnitOfWork) -> Self {
        Self {
            members: MemberService::new(uow.clone()),
            activity: ActivityService::new(uow.clone()),
            uow,
        }
    }

    /// Counts that surface broken membership data.
    pub async fn diagnostics(&self, principal: &Principal) -> Result<DiagnosticsReport> {
        authorize(principal, &Action::ViewDiagnostics)?;

        let agencies = self.uow.agencies.counts().await?;
        let members = self.uow.members.counts(None).await?;
        let super_admins = self.uow.members.count_active_super_admins().await?;
        let integrity = self.uow.members.integrity().await?;
        let deliveries = self
            .uow
            .webhook_deliveries
            .count_since(Utc::now() - Duration::hours(24))
            .await?;

        Ok(DiagnosticsReport {
            agency_count: agencies.total,
            inactive_agency_count: agencies.inactive,
            member_count: members.total,
            super_admin_count: super_admins,
            members_without_agency: integrity.without_agency,
            members_without_identity: integrity.without_identity,
            members_in_inactive_agencies: integrity.in_inactive_agencies,
            webhook_deliveries_last_24h: deliveries,
        })
    }

    /// Overwrite a member's role and agency, bypassing the agency-scoped
    /// rules of ordinary role assignment.
    pub async fn repair_role(
        &self,
        principal: &Principal,
        id: MemberId,
        request: RoleRepairRequest,
    ) -> Result<Member> {
        authorize(principal, &Action::RepairRoles)?;
        let current = self.members.load(id).await?;

        let mut updated = current.clone();
        updated.role = request.role;
        if request.clear_agency {
            updated.agency_id = None;
        } else if let Some(agency) = request.agency_id {
            if current.agency_id != Some(agency) {
                self.members.ensure_agency(agency).await?;
            }
            updated.agency_id = Some(agency);
        }
        // A repaired member with somewhere to belong no longer waits on onboarding.
        if updated.status == MemberStatus::Pending
            && (updated.agency_id.is_some() || updated.role == Role::SuperAdmin)
            && updated.identity_id.is_some()
        {
            updated.status = MemberStatus::Active;
        }

        if updated == current {
            return Ok(current);
        }
        self.uow.members.update(&updated).await?;
        updated.updated_at = Utc::now();

        info!(
            member_id = %id,
            from = %current.role,
            to = %updated.role,
            agency_id = ?updated.agency_id,
            "member role repaired"
        );
        self.activity
            .record(
                &Actor::from(principal),
                ActivityRecord {
                    action: actions::MEMBER_ROLE_REPAIRED,
                    entity_type: entities::MEMBER,
                    entity_id: Some(id.to_uuid()),
                    agency_id: updated.agency_id,
                    details: json!({
                        "from": { "role": current.role, "agency_id": current.agency_id },
                        "to": { "role": updated.role, "agency_id": updated.agency_id },
                    }),
                },
            )
            .await;

        Ok(updated)
    }

    /// Counts and recent activity scoped to what the caller may see.
    pub async fn dashboard(&self, principal: &Principal) -> Result<DashboardSummary> {
        authorize(principal, &Action::ViewDashboard)?;
        let role = principal.role.ok_or(AccessDenied::NotOnboarded)?;

        let scope = agency_scope(principal);
        let (agency_count, members) = match scope {
            AgencyScope::All => (
                self.uow.agencies.counts().await?.total,
                self.uow.members.counts(None).await?,
            ),
            AgencyScope::Agency(agency) => (1, self.uow.members.counts(Some(agency)).await?),
            AgencyScope::Empty => (0, Default::default()),
        };
        let recent_activity = self
            .activity
            .recent(principal, RECENT_ACTIVITY_LIMIT)
            .await?;

        Ok(DashboardSummary {
            role,
            agency_id: principal.agency_id,
            agency_count,
            member_count: members.total,
            active_member_count: members.active,
            pending_member_count: members.pending,
            recent_activity,
        })
    }
}
