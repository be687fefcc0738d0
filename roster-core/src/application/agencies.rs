use chrono::Utc;
use serde_json::json;
use tracing::info;

use roster_model::{
    Agency, AgencyId, AgencyOption, AgencyQuery, AgencyStatus, AgencySummary,
    CreateAgencyRequest, Page, UpdateAgencyRequest, actions,
    activity::entities,
};

use super::{
    activity::{ActivityRecord, ActivityService, Actor},
    unit_of_work::AppUnitOfWork,
};
use crate::{
    database::ports::agencies::AgencyFilter,
    domain::{
        access::{Action, Principal, agency_scope, authorize},
        validation::{self, FREE_TEXT_MAX, PHONE_MAX},
    },
    error::{Result, RosterError},
};

#[derive(Debug, Clone)]
pub struct AgencyService {
    uow: AppUnitOfWork,
    activity: ActivityService,
}

impl AgencyService {
    pub fn new(uow: AppUnitOfWork) -> Self {
        let activity = ActivityService::new(uow.clone());
        Self { uow, activity }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        query: AgencyQuery,
    ) -> Result<Page<AgencySummary>> {
        authorize(principal, &Action::ListAgencies)?;
        let (limit, offset) = Page::<AgencySummary>::bounds(query.limit, query.offset);

        let Some(agency) = agency_scope(principal).narrow(None) else {
            return Ok(Page {
                items: Vec::new(),
                total: 0,
                limit,
                offset,
            });
        };

        let (items, total) = self
            .uow
            .agencies
            .list(&AgencyFilter {
                search: query.search,
                status: query.status,
                agency,
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

    pub async fn get(&self, principal: &Principal, id: AgencyId) -> Result<Agency> {
        authorize(principal, &Action::ViewAgency(id))?;
        self.load(id).await
    }

    /// Active agencies an onboarding identity may pick from.
    pub async fn options(&self) -> Result<Vec<AgencyOption>> {
        self.uow.agencies.active_options().await
    }

    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateAgencyRequest,
    ) -> Result<Agency> {
        authorize(principal, &Action::CreateAgency)?;

        let name = validation::agency_name(&request.name)?;
        if self.uow.agencies.name_taken(&name, None).await? {
            return Err(RosterError::Conflict(format!(
                "an agency named '{name}' already exists"
            )));
        }

        let now = Utc::now();
        let agency = Agency {
            id: AgencyId::new(),
            name,
            description: validation::optional_text(
                "description",
                request.description.as_deref(),
                FREE_TEXT_MAX,
            )?,
            email: validation::optional_email(request.email.as_deref())?,
            phone: validation::optional_text("phone", request.phone.as_deref(), PHONE_MAX)?,
            website: validation::optional_website(request.website.as_deref())?,
            address: validation::optional_text(
                "address",
                request.address.as_deref(),
                FREE_TEXT_MAX,
            )?,
            status: AgencyStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.uow.agencies.insert(&agency).await?;

        info!(agency_id = %agency.id, name = %agency.name, "agency created");
        self.activity
            .record(
                &Actor::from(principal),
                ActivityRecord {
                    action: actions::AGENCY_CREATED,
                    entity_type: entities::AGENCY,
                    entity_id: Some(agency.id.to_uuid()),
                    agency_id: Some(agency.id),
                    details: json!({ "name": agency.name }),
                },
            )
            .await;

        Ok(agency)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: AgencyId,
        request: UpdateAgencyRequest,
    ) -> Result<Agency> {
        let current = self.load(id).await?;
        authorize(
            principal,
            &Action::UpdateAgency {
                agency: id,
                changes_status: request.status.is_some_and(|status| status != current.status),
            },
        )?;

        let mut updated = current.clone();
        if let Some(name) = request.name.as_deref() {
            let name = validation::agency_name(name)?;
            if !name.eq_ignore_ascii_case(&current.name)
                && self.uow.agencies.name_taken(&name, Some(id)).await?
            {
                return Err(RosterError::Conflict(format!(
                    "an agency named '{name}' already exists"
                )));
            }
            updated.name = name;
        }
        updated.description = validation::patch_text(
            "description",
            updated.description,
            request.description.as_deref(),
            FREE_TEXT_MAX,
        )?;
        if let Some(email) = request.email.as_deref() {
            updated.email = validation::optional_email(Some(email))?;
        }
        updated.phone =
            validation::patch_text("phone", updated.phone, request.phone.as_deref(), PHONE_MAX)?;
        if let Some(website) = request.website.as_deref() {
            updated.website = validation::optional_website(Some(website))?;
        }
        updated.address = validation::patch_text(
            "address",
            updated.address,
            request.address.as_deref(),
            FREE_TEXT_MAX,
        )?;
        if let Some(status) = request.status {
            updated.status = status;
        }

        let changed = changed_fields(&current, &updated);
        if changed.is_empty() {
            return Ok(current);
        }

        self.uow.agencies.update(&updated).await?;
        updated.updated_at = Utc::now();

        self.activity
            .record(
                &Actor::from(principal),
                ActivityRecord {
                    action: actions::AGENCY_UPDATED,
                    entity_type: entities::AGENCY,
                    entity_id: Some(id.to_uuid()),
                    agency_id: Some(id),
                    details: json!({ "changed": changed }),
                },
            )
            .await;

        Ok(updated)
    }

    pub async fn delete(&self, principal: &Principal, id: AgencyId) -> Result<()> {
        authorize(principal, &Action::DeleteAgency(id))?;
        let agency = self.load(id).await?;

        let members = self.uow.agencies.member_count(id).await?;
        if members > 0 {
            return Err(RosterError::Conflict(format!(
                "agency '{}' still has {members} member(s); move or remove them first",
                agency.name
            )));
        }

        if !self.uow.agencies.delete(id).await? {
            return Err(RosterError::NotFound(format!("agency {id}")));
        }

        info!(agency_id = %id, name = %agency.name, "agency deleted");
        self.activity
            .record(
                &Actor::from(principal),
                ActivityRecord {
                    action: actions::AGENCY_DELETED,
                    entity_type: entities::AGENCY,
                    entity_id: Some(id.to_uuid()),
                    agency_id: None,
                    details: json!({ "name": agency.name }),
                },
            )
            .await;
        Ok(())
    }

    pub(crate) async fn load(&self, id: AgencyId) -> Result<Agency> {
        self.uow
            .agencies
            .get(id)
            .await?
            .ok_or_else(|| RosterError::NotFound(format!("agency {id}")))
    }
}

fn changed_fields(before: &Agency, after: &Agency) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if before.name != after.name {
        changed.push("name");
    }
    if before.description != after.description {
        changed.push("description");
    }
    if before.email != after.email {
        changed.push("email");
    }
    if before.phone != after.phone {
        changed.push("phone");
    }
    if before.website != after.website {
        changed.push("website");
    }
    if before.address != after.address {
        changed.push("address");
    }
    if before.status != after.status {
        changed.push("status");
    }
    changed
}
