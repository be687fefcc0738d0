use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use roster_model::{MemberId, actions, activity::entities};

use super::{
    activity::{ActivityRecord, ActivityService, Actor},
    unit_of_work::AppUnitOfWork,
};
use crate::{
    domain::onboarding::LinkKind,
    error::{Result, RosterError},
    identity::{IdentityEvent, IdentityUser},
};

/// What happened to one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Processed {
        event_type: String,
        member_id: Option<MemberId>,
    },
    Duplicate,
    Ignored {
        event_type: String,
    },
    Skipped {
        event_type: String,
        reason: String,
    },
}

/// Applies identity provider user events to the member table.
#[derive(Debug, Clone)]
pub struct IdentityWebhookService {
    uow: AppUnitOfWork,
    activity: ActivityService,
}

impl IdentityWebhookService {
    pub fn new(uow: AppUnitOfWork) -> Self {
        let activity = ActivityService::new(uow.clone());
        Self { uow, activity }
    }

    /// Handle a verified delivery exactly once per delivery id.
    pub async fn handle(&self, delivery_id: &str, event: IdentityEvent) -> Result<WebhookOutcome> {
        let event_type = event.event_type().to_string();
        if !self
            .uow
            .webhook_deliveries
            .register(delivery_id, &event_type)
            .await?
        {
            debug!(delivery_id, event_type, "duplicate webhook delivery");
            return Ok(WebhookOutcome::Duplicate);
        }

        match self.dispatch(event).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                // Let the provider's retry run the event again.
                if let Err(forget_err) = self.uow.webhook_deliveries.forget(delivery_id).await {
                    warn!(delivery_id, error = %forget_err, "failed to release webhook delivery");
                }
                Err(err)
            }
        }
    }

    async fn dispatch(&self, event: IdentityEvent) -> Result<WebhookOutcome> {
        match event {
            IdentityEvent::UserCreated(user) => self.link(IdentityEvent::USER_CREATED, &user).await,
            IdentityEvent::UserUpdated(user) => self.sync(&user).await,
            IdentityEvent::UserDeleted { identity_id } => self.unlink(&identity_id).await,
            IdentityEvent::Other(event_type) => {
                debug!(event_type, "ignoring identity event");
                Ok(WebhookOutcome::Ignored { event_type })
            }
        }
    }

    async fn link(&self, event_type: &str, user: &IdentityUser) -> Result<WebhookOutcome> {
        let identity = match user.to_new_identity() {
            Ok(identity) => identity,
            Err(err) => return Ok(skipped(event_type, &user.id, err.to_string())),
        };

        let outcome = match self.uow.onboarding.link_identity(&identity).await {
            Ok(outcome) => outcome,
            Err(RosterError::Conflict(reason)) => {
                return Ok(skipped(event_type, &user.id, reason));
            }
            Err(err) => return Err(err),
        };

        if let LinkKind::Assigned(kind) = outcome.kind {
            self.activity
                .record(
                    &Actor::identity(&identity.identity_id),
                    ActivityRecord {
                        action: actions::MEMBER_LINKED,
                        entity_type: entities::MEMBER,
                        entity_id: Some(outcome.member.id.to_uuid()),
                        agency_id: outcome.member.agency_id,
                        details: json!({
                            "identity_id": identity.identity_id,
                            "assignment": kind,
                            "role": outcome.member.role,
                        }),
                    },
                )
                .await;
        }

        Ok(WebhookOutcome::Processed {
            event_type: event_type.to_string(),
            member_id: Some(outcome.member.id),
        })
    }

    /// Mirror profile changes onto the linked member. Unknown identities
    /// are linked as if `user.created` had arrived.
    async fn sync(&self, user: &IdentityUser) -> Result<WebhookOutcome> {
        let event_type = IdentityEvent::USER_UPDATED;
        let Some(current) = self.uow.members.find_by_identity(&user.id).await? else {
            return self.link(event_type, user).await;
        };
        let identity = match user.to_new_identity() {
            Ok(identity) => identity,
            Err(err) => return Ok(skipped(event_type, &user.id, err.to_string())),
        };

        let mut updated = current.clone();
        if identity.email != current.email {
            if self
                .uow
                .members
                .email_taken(&identity.email, Some(current.id))
                .await?
            {
                warn!(
                    identity_id = %user.id,
                    email = %identity.email,
                    "identity email belongs to another member; keeping stored email"
                );
            } else {
                updated.email = identity.email.clone();
            }
        }
        if identity.first_name.is_some() {
            updated.first_name = identity.first_name;
        }
        if identity.last_name.is_some() {
            updated.last_name = identity.last_name;
        }
        if identity.phone.is_some() {
            updated.phone = identity.phone;
        }

        if updated != current {
            self.uow.members.update(&updated).await?;
            self.activity
                .record(
                    &Actor::identity(&user.id),
                    ActivityRecord {
                        action: actions::MEMBER_UPDATED,
                        entity_type: entities::MEMBER,
                        entity_id: Some(current.id.to_uuid()),
                        agency_id: current.agency_id,
                        details: json!({ "source": "identity_provider" }),
                    },
                )
                .await;
        }

        Ok(WebhookOutcome::Processed {
            event_type: event_type.to_string(),
            member_id: Some(current.id),
        })
    }

    async fn unlink(&self, identity_id: &str) -> Result<WebhookOutcome> {
        let event_type = IdentityEvent::USER_DELETED.to_string();
        let Some(member) = self.uow.members.unlink_identity(identity_id).await? else {
            return Ok(WebhookOutcome::Ignored { event_type });
        };

        info!(identity_id, member_id = %member.id, "identity deleted; member deactivated");
        self.activity
            .record(
                &Actor::identity(identity_id),
                ActivityRecord {
                    action: actions::MEMBER_UNLINKED,
                    entity_type: entities::MEMBER,
                    entity_id: Some(member.id.to_uuid()),
                    agency_id: member.agency_id,
                    details: json!({ "identity_id": identity_id }),
                },
            )
            .await;

        Ok(WebhookOutcome::Processed {
            event_type,
            member_id: Some(member.id),
        })
    }

    /// Drop delivery records older than the retention window.
    pub async fn purge_deliveries(&self, retention_days: u32) -> Result<u64> {
        let cutoff = Duration::try_days(i64::from(retention_days))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| {
                RosterError::Validation(format!(
                    "webhook retention of {retention_days} days is out of range"
                ))
            })?;
        self.uow.webhook_deliveries.purge_before(cutoff).await
    }
}

fn skipped(event_type: &str, identity_id: &str, reason: String) -> WebhookOutcome {
    warn!(event_type, identity_id, %reason, "skipping identity event");
    WebhookOutcome::Skipped {
        event_type: event_type.to_string(),
        reason,
    }
}
