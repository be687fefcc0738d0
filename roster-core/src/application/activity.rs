use roster_model::{ActivityEntry, ActivityQuery, AgencyId, MemberId, Page};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::unit_of_work::AppUnitOfWork;
use crate::{
    database::ports::activity::{ActivityFilter, NewActivity},
    domain::access::{Action, AgencyScope, Principal, agency_scope, authorize},
    error::Result,
};

/// Who performed a recorded change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    pub member_id: Option<MemberId>,
    pub identity_id: Option<String>,
}

impl Actor {
    /// Changes driven by the identity provider rather than a signed-in user.
    pub fn identity(identity_id: impl Into<String>) -> Self {
        Self {
            member_id: None,
            identity_id: Some(identity_id.into()),
        }
    }
}

impl From<&Principal> for Actor {
    fn from(principal: &Principal) -> Self {
        Self {
            member_id: principal.member_id,
            identity_id: Some(principal.identity_id.clone()),
        }
    }
}

/// One change to write to the activity log.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Option<Uuid>,
    pub agency_id: Option<AgencyId>,
    pub details: Value,
}

#[derive(Debug, Clone)]
pub struct ActivityService {
    uow: AppUnitOfWork,
}

impl ActivityService {
    pub fn new(uow: AppUnitOfWork) -> Self {
        Self { uow }
    }

    /// Append an entry. The change it describes has already been committed,
    /// so a failed write is logged rather than surfaced to the caller.
    pub async fn record(&self, actor: &Actor, record: ActivityRecord) {
        let action = record.action;
        let result = self
            .uow
            .activity
            .record(NewActivity {
                actor_member_id: actor.member_id,
                actor_identity_id: actor.identity_id.clone(),
                action: record.action,
                entity_type: record.entity_type,
                entity_id: record.entity_id,
                agency_id: record.agency_id,
                details: record.details,
            })
            .await;

        if let Err(err) = result {
            warn!(action, error = %err, "failed to record activity");
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        query: ActivityQuery,
    ) -> Result<Page<ActivityEntry>> {
        authorize(principal, &Action::ViewActivity(query.agency_id))?;
        let (limit, offset) = Page::<ActivityEntry>::bounds(query.limit, query.offset);

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
            .activity
            .list(&ActivityFilter {
                agency,
                entity_type: query.entity_type,
                entity_id: query.entity_id,
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

    /// Latest entries the caller may see, or nothing for callers without
    /// access to the log.
    pub async fn recent(&self, principal: &Principal, limit: i64) -> Result<Vec<ActivityEntry>> {
        let scope = agency_scope(principal);
        if authorize(principal, &Action::ViewActivity(scope.agency())).is_err()
            || scope == AgencyScope::Empty
        {
            return Ok(Vec::new());
        }

        let (items, _) = self
            .uow
            .activity
            .list(&ActivityFilter {
                agency: scope.agency(),
                limit,
                ..ActivityFilter::default()
            })
            .await?;
        Ok(items)
    }
}
