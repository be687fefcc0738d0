use std::fmt;

use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use roster_model::{
    AgencyOption, BootstrapRequest, Member, MemberStatus, OnboardingRequest, Role,
    RoleSyncOutcome, WhoAmI, actions, activity::entities,
};
use zeroize::Zeroizing;

use super::{
    activity::{ActivityRecord, ActivityService, Actor},
    members::MemberService,
    unit_of_work::AppUnitOfWork,
};
use crate::{
    domain::{
        access::{Principal, capabilities},
        onboarding::{AssignmentKind, LinkKind, LinkOutcome, NewIdentity},
        validation::{self, PERSON_NAME_MAX, PHONE_MAX},
    },
    error::{Result, RosterError},
    identity::IdentityClaims,
};

/// First-login flows: resolving who a caller is, linking identities to
/// member rows, picking an agency and bootstrapping the first super
/// administrator.
#[derive(Clone)]
pub struct OnboardingService {
    uow: AppUnitOfWork,
    members: MemberService,
    activity: ActivityService,
    setup_token: Option<Zeroizing<String>>,
}

impl fmt::Debug for OnboardingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnboardingService")
            .field("uow", &self.uow)
            .field("setup_token", &self.setup_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl OnboardingService {
    pub fn new(uow: AppUnitOfWork) -> Self {
        Self {
            members: MemberService::new(uow.clone()),
            activity: ActivityService::new(uow.clone()),
            uow,
            setup_token: None,
        }
    }

    /// Require this token on the bootstrap endpoint.
    pub fn with_setup_token(mut self, token: Option<String>) -> Self {
        self.setup_token = token.filter(|t| !t.is_empty()).map(Zeroizing::new);
        self
    }

    /// Build the principal for verified token claims. Read-only: an
    /// identity without a member row is returned unlinked.
    pub async fn resolve_principal(&self, claims: &IdentityClaims) -> Result<Principal> {
        let email = claims
            .email
            .as_deref()
            .and_then(|raw| validation::normalize_email(raw).ok());

        Ok(match self.uow.members.find_by_identity(&claims.sub).await? {
            Some(member) => Principal::from_member(&claims.sub, email, &member),
            None => Principal::unlinked(&claims.sub, email),
        })
    }

    pub async fn whoami(&self, principal: &Principal) -> Result<WhoAmI> {
        let member = match principal.member_id {
            Some(id) => self.uow.members.get(id).await?,
            None => None,
        };

        Ok(WhoAmI {
            identity_id: principal.identity_id.clone(),
            email: principal.email.clone(),
            role: principal.role,
            agency_id: principal.agency_id,
            member,
            capabilities: capabilities(principal)
                .into_iter()
                .map(str::to_string)
                .collect(),
            needs_onboarding: principal.needs_onboarding(),
        })
    }

    pub async fn agency_options(&self) -> Result<Vec<AgencyOption>> {
        self.uow.agencies.active_options().await
    }

    /// Link the caller's identity to a member row if it is not linked yet.
    async fn ensure_linked(
        &self,
        principal: &Principal,
        fallback_email: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<LinkOutcome> {
        if let Some(id) = principal.member_id {
            let member = self.members.load(id).await?;
            return Ok(LinkOutcome {
                member,
                kind: LinkKind::AlreadyLinked,
            });
        }

        let raw_email = principal
            .email
            .as_deref()
            .or(fallback_email)
            .ok_or_else(|| {
                RosterError::Validation(
                    "an email address is required to complete onboarding".into(),
                )
            })?;
        let identity = NewIdentity {
            identity_id: principal.identity_id.clone(),
            email: validation::normalize_email(raw_email)?,
            first_name: validation::optional_text("first name", first_name, PERSON_NAME_MAX)?,
            last_name: validation::optional_text("last name", last_name, PERSON_NAME_MAX)?,
            phone: validation::optional_text("phone", phone, PHONE_MAX)?,
        };

        let outcome = self.uow.onboarding.link_identity(&identity).await?;
        if let LinkKind::Assigned(kind) = outcome.kind {
            self.record_link(&Actor::from(principal), &outcome.member, kind)
                .await;
        }
        Ok(outcome)
    }

    pub(crate) async fn record_link(&self, actor: &Actor, member: &Member, kind: AssignmentKind) {
        self.activity
            .record(
                actor,
                ActivityRecord {
                    action: actions::MEMBER_LINKED,
                    entity_type: entities::MEMBER,
                    entity_id: Some(member.id.to_uuid()),
                    agency_id: member.agency_id,
                    details: json!({
                        "identity_id": member.identity_id,
                        "assignment": kind,
                        "role": member.role,
                    }),
                },
            )
            .await;
    }

    /// Finish onboarding: link the identity if needed, attach the chosen
    /// agency and activate the member.
    pub async fn complete(
        &self,
        principal: &Principal,
        request: OnboardingRequest,
    ) -> Result<Member> {
        let outcome = self
            .ensure_linked(
                principal,
                request.email.as_deref(),
                request.first_name.as_deref(),
                request.last_name.as_deref(),
                request.phone.as_deref(),
            )
            .await?;
        let current = outcome.member;

        if matches!(
            current.status,
            MemberStatus::Inactive | MemberStatus::Suspended
        ) {
            return Err(RosterError::Forbidden(format!(
                "member account is {}",
                current.status
            )));
        }

        let mut updated = current.clone();
        match (current.agency_id, request.agency_id) {
            (Some(existing), Some(requested)) if existing != requested => {
                return Err(RosterError::Conflict(
                    "member already belongs to a different agency".to_string(),
                ));
            }
            (Some(_), _) => {}
            (None, Some(requested)) => {
                self.members.ensure_agency(requested).await?;
                updated.agency_id = Some(requested);
            }
            (None, None) if current.role == Role::SuperAdmin => {}
            (None, None) => {
                return Err(RosterError::Validation(
                    "choose an agency to complete onboarding".to_string(),
                ));
            }
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
        updated.status = MemberStatus::Active;

        if updated == current {
            return Ok(current);
        }
        self.uow.members.update(&updated).await?;
        updated.updated_at = Utc::now();

        info!(
            member_id = %updated.id,
            agency_id = ?updated.agency_id,
            "onboarding completed"
        );
        self.activity
            .record(
                &Actor {
                    member_id: Some(updated.id),
                    identity_id: Some(principal.identity_id.clone()),
                },
                ActivityRecord {
                    action: actions::MEMBER_ONBOARDED,
                    entity_type: entities::MEMBER,
                    entity_id: Some(updated.id.to_uuid()),
                    agency_id: updated.agency_id,
                    details: json!({ "role": updated.role }),
                },
            )
            .await;

        Ok(updated)
    }

    /// Re-run the role assignment for an identity whose webhook was missed,
    /// or report the stored role when it is already linked.
    pub async fn sync_role(&self, principal: &Principal) -> Result<RoleSyncOutcome> {
        let outcome = self
            .ensure_linked(principal, None, None, None, None)
            .await?;

        let message = match outcome.kind {
            LinkKind::AlreadyLinked => "identity already linked; stored role reported",
            LinkKind::Assigned(AssignmentKind::FirstSuperAdmin) => {
                "no super administrator existed; identity promoted"
            }
            LinkKind::Assigned(AssignmentKind::Recovered) => {
                "identity linked to existing member record; role recovered"
            }
            LinkKind::Assigned(AssignmentKind::Default) => {
                "identity linked with the default role; onboarding required"
            }
        };

        Ok(RoleSyncOutcome {
            linked: outcome.newly_linked(),
            role: Some(outcome.member.role),
            member: Some(outcome.member),
            message: message.to_string(),
        })
    }

    /// Promote the caller to super administrator while none is active.
    pub async fn bootstrap(
        &self,
        principal: &Principal,
        request: BootstrapRequest,
    ) -> Result<Member> {
        if let Some(expected) = self.setup_token.as_ref() {
            let provided = request.setup_token.as_deref().unwrap_or_default();
            if Sha256::digest(provided.as_bytes()) != Sha256::digest(expected.as_bytes()) {
                warn!(identity_id = %principal.identity_id, "bootstrap rejected: bad setup token");
                return Err(RosterError::Unauthorized("invalid setup token".to_string()));
            }
        }

        let raw_email = principal
            .email
            .as_deref()
            .or(request.email.as_deref())
            .ok_or_else(|| RosterError::Validation("an email address is required".into()))?;
        let identity = NewIdentity {
            identity_id: principal.identity_id.clone(),
            email: validation::normalize_email(raw_email)?,
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
            phone: None,
        };

        let member = self
            .uow
            .onboarding
            .bootstrap_super_admin(&identity)
            .await?
            .ok_or_else(|| {
                RosterError::Conflict("an active super administrator already exists".into())
            })?;

        self.activity
            .record(
                &Actor {
                    member_id: Some(member.id),
                    identity_id: Some(principal.identity_id.clone()),
                },
                ActivityRecord {
                    action: actions::SETUP_BOOTSTRAP,
                    entity_type: entities::MEMBER,
                    entity_id: Some(member.id.to_uuid()),
                    agency_id: member.agency_id,
                    details: json!({ "email": member.email }),
                },
            )
            .await;

        Ok(member)
    }
}
