use chrono::Utc;
use serde_json::json;
use tracing::info;

use roster_model::{
    AgencyId, AgencyStatus, CreateMemberRequest, Member, MemberId, MemberQuery,
    MemberStatus, Page, Role, UpdateMemberRequest, actions, activity::entities,
};

use super::{
    activity::{ActivityRecord, ActivityService, Actor},
    unit_of_work::AppUnitOfWork,
};
use crate::{
    database::ports::members::MemberFilter,
    domain::{
        access::{Action, MemberTarget, Principal, agency_scope, authorize},
        validation::{self, PERSON_NAME_MAX, PHONE_MAX},
    },
    error::{Result, RosterError},
};

#[derive(Debug, Clone)]
pub struct MemberService {
    uow: AppUnitOfWork,
    activity: ActivityService,
}

impl MemberService {
    pub fn new(uow: AppUnitOfWork) -> Self {
        let activity = ActivityService::new(uow.clone());
        Self { uow, activity }
    }

    pub async fn list(&self, principal: &Principal, query: MemberQuery) -> Result<Page<Member>> {
        authorize(principal, &Action::ListMembers(query.agency_id))?;
        let (limit, offset) = Page::<Member>::bounds(query.limit, query.offset);

        let Some(agency) = agency_scope(principal).narrow(query.agency_id) else {
            return Ok(Page {
                items: Vec::new(),
                total: 0,
                limit,
                offset,
            });
        };

        let (items, total) = self
            .uow
            .members
            .list(&MemberFilter {
                agency,
                status: query.status,
                role: query.role,
                search: query.search,
                limit,
                offset,
            })
            .await?;

        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }

    pub async fn get(&self, principal: &Principal, id: MemberId) -> Result<Member> {
        let member = self.load(id).await?;
        authorize(principal, &Action::ViewMember(MemberTarget::from(&member)))?;
        Ok(member)
    }

    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateMemberRequest,
    ) -> Result<Member> {
        let role = request.role.unwrap_or(Role::AgencyUser);
        // Agency administrators always create into their own agency.
        let agency_id = match principal.role {
            Some(Role::AgencyAdmin) => principal.agency_id,
            _ => request.agency_id,
        };
        authorize(
            principal,
            &Action::CreateMember {
                agency: agency_id,
                role,
            },
        )?;

        let email = validation::normalize_email(&request.email)?;
        if self.uow.members.email_taken(&email, None).await? {
            return Err(RosterError::Conflict(format!(
                "a member with email {email} already exists"
            )));
        }
        if let Some(agency) = agency_id {
            self.ensure_agency(agency).await?;
        }

        let now = Utc::now();
        let member = Member {
            id: MemberId::new(),
            identity_id: None,
            email,
            first_name: validation::optional_text(
                "first name",
                request.first_name.as_deref(),
                PERSON_NAME_MAX,
            )?,
            last_name: validation::optional_text(
                "last name",
                request.last_name.as_deref(),
                PERSON_NAME_MAX,
            )?,
            phone: validation::optional_text("phone", request.phone.as_deref(), PHONE_MAX)?,
            role,
            membership_type: request.membership_type.unwrap_or_default(),
            status: request.status.unwrap_or(MemberStatus::Pending),
            agency_id,
            created_at: now,
            updated_at: now,
        };
        self.uow.members.insert(&member).await?;

        info!(member_id = %member.id, role = %member.role, "member created");
        self.activity
            .record(
                &Actor::from(principal),
                ActivityRecord {
                    action: actions::MEMBER_CREATED,
                    entity_type: entities::MEMBER,
                    entity_id: Some(member.id.to_uuid()),
                    agency_id: member.agency_id,
                    details: json!({
                        "email": member.email,
                        "role": member.role,
                    }),
                },
            )
            .await;

        Ok(member)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: MemberId,
        request: UpdateMemberRequest,
    ) -> Result<Member> {
        let current = self.load(id).await?;
        authorize(
            principal,
            &Action::UpdateMember {
                target: MemberTarget::from(&current),
                profile_only: request.is_profile_only(),
                new_agency: request.agency_id,
            },
        )?;

        let mut updated = current.clone();
        if let Some(email) = request.email.as_deref() {
            let email = validation::normalize_email(email)?;
            if email != current.email && self.uow.members.email_taken(&email, Some(id)).await? {
                return Err(RosterError::Conflict(format!(
                    "a member with email {email} already exists"
                )));
            }
            updated.email = email;
        }
        updated.first_name = validation::patch_text(
            "first name",
            updated.first_name,
            request.first_name.as_deref(),
            PERSON_NAME_MAX,
        )?;
        updated.last_name = validation::patch_text(
            "last name",
            updated.last_name,
            request.last_name.as_deref(),
            PERSON_NAME_MAX,
        )?;
        updated.phone =
            validation::patch_text("phone", updated.phone, request.phone.as_deref(), PHONE_MAX)?;
        if let Some(membership_type) = request.membership_type {
            updated.membership_type = membership_type;
        }
        if let Some(status) = request.status {
            updated.status = status;
        }
        if let Some(agency) = request.agency_id
            && current.agency_id != Some(agency)
        {
            self.ensure_agency(agency).await?;
            updated.agency_id = Some(agency);
        }

        let changed = changed_fields(&current, &updated);
        if changed.is_empty() {
            return Ok(current);
        }
        self.uow.members.update(&updated).await?;
        updated.updated_at = Utc::now();

        self.activity
            .record(
                &Actor::from(principal),
                ActivityRecord {
                    action: actions::MEMBER_UPDATED,
                    entity_type: entities::MEMBER,
                    entity_id: Some(id.to_uuid()),
                    agency_id: updated.agency_id,
                    details: json!({ "changed": changed }),
                },
            )
            .await;

        Ok(updated)
    }

    pub async fn delete(&self, principal: &Principal, id: MemberId) -> Result<()> {
        let member = self.load(id).await?;
        authorize(principal, &Action::DeleteMember(MemberTarget::from(&member)))?;

        if !self.uow.members.delete(id).await? {
            return Err(RosterError::NotFound(format!("member {id}")));
        }

        info!(member_id = %id, "member deleted");
        self.activity
            .record(
                &Actor::from(principal),
                ActivityRecord {
                    action: actions::MEMBER_DELETED,
                    entity_type: entities::MEMBER,
                    entity_id: Some(id.to_uuid()),
                    agency_id: member.agency_id,
                    details: json!({ "email": member.email, "role": member.role }),
                },
            )
            .await;
        Ok(())
    }

    pub async fn assign_role(
        &self,
        principal: &Principal,
        id: MemberId,
        role: Role,
    ) -> Result<Member> {
        let current = self.load(id).await?;
        authorize(
            principal,
            &Action::AssignRole {
                target: MemberTarget::from(&current),
                role,
            },
        )?;
        if current.role == role {
            return Ok(current);
        }

        let mut updated = current.clone();
        updated.role = role;
        self.uow.members.update(&updated).await?;
        updated.updated_at = Utc::now();

        info!(member_id = %id, from = %current.role, to = %role, "member role changed");
        self.activity
            .record(
                &Actor::from(principal),
                ActivityRecord {
                    action: actions::MEMBER_ROLE_CHANGED,
                    entity_type: entities::MEMBER,
                    entity_id: Some(id.to_uuid()),
                    agency_id: updated.agency_id,
                    details: json!({ "from": current.role, "to": role }),
                },
            )
            .await;

        Ok(updated)
    }

    pub(crate) async fn load(&self, id: MemberId) -> Result<Member> {
        self.uow
            .members
            .get(id)
            .await?
            .ok_or_else(|| RosterError::NotFound(format!("member {id}")))
    }

    pub(crate) async fn ensure_agency(&self, id: AgencyId) -> Result<()> {
        match self.uow.agencies.get(id).await? {
            Some(agency) if agency.status == AgencyStatus::Active => Ok(()),
            Some(agency) => Err(RosterError::Validation(format!(
                "agency '{}' is inactive",
                agency.name
            ))),
            None => Err(RosterError::Validation(format!("agency {id} does not exist"))),
        }
    }
}

fn changed_fields(before: &Member, after: &Member) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if before.email != after.email {
        changed.push("email");
    }
    if before.first_name != after.first_name {
        changed.push("first_name");
    }
    if before.last_name != after.last_name {
        changed.push("last_name");
    }
    if before.phone != after.phone {
        changed.push("phone");
    }
    if before.membership_type != after.membership_type {
        changed.push("membership_type");
    }
    if before.status != after.status {
        changed.push("status");
    }
    if before.agency_id != after.agency_id {
        changed.push("agency_id");
    }
    changed
}
