use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use roster_model::{Member, MemberId, MemberStatus, MembershipType, Role};

use super::lock_membership;
use super::members::{MEMBER_COLUMNS, insert_member, map_member, update_member};
use crate::database::ports::onboarding::OnboardingRepository;
use crate::domain::onboarding::{
    EmailMatch, LinkKind, LinkOutcome, NewIdentity, decide_assignment,
};
use crate::error::{Result, RosterError};

#[derive(Clone, Debug)]
pub struct PostgresOnboardingRepository {
    pool: PgPool,
}

impl PostgresOnboardingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn by_identity(conn: &mut PgConnection, identity_id: &str) -> Result<Option<Member>> {
        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE identity_id = $1 FOR UPDATE"
        ))
        .bind(identity_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to load member by identity: {e}")))?;
        row.as_ref().map(map_member).transpose()
    }

    /// Unlinked member row with the same email. A row already linked to a
    /// different identity is a conflict.
    async fn unlinked_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<Member>> {
        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE lower(email) = lower($1) FOR UPDATE"
        ))
        .bind(email)
        .fetch_optional(conn)
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to load member by email: {e}")))?;

        match row.as_ref().map(map_member).transpose()? {
            Some(member) if member.identity_id.is_some() => Err(RosterError::Conflict(
                format!("{email} is already linked to another identity"),
            )),
            other => Ok(other),
        }
    }

    async fn count_super_admins(conn: &mut PgConnection, active_only: bool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM members
            WHERE role = $1 AND (NOT $2 OR status = $3)
            "#,
        )
        .bind(Role::SuperAdmin.as_str())
        .bind(active_only)
        .bind(MemberStatus::Active.as_str())
        .fetch_one(conn)
        .await
        .map_err(|e| {
            RosterError::Internal(format!("Failed to count super administrators: {e}"))
        })?;
        Ok(count)
    }

    fn fresh_member(identity: &NewIdentity, role: Role, status: MemberStatus) -> Member {
        let now = Utc::now();
        Member {
            id: MemberId::new(),
            identity_id: Some(identity.identity_id.clone()),
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            phone: identity.phone.clone(),
            role,
            membership_type: MembershipType::default(),
            status,
            agency_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the identity to an existing row, filling profile gaps from
    /// the provider without overwriting what administrators entered.
    fn adopt(mut member: Member, identity: &NewIdentity) -> Member {
        member.identity_id = Some(identity.identity_id.clone());
        member.first_name = member.first_name.or_else(|| identity.first_name.clone());
        member.last_name = member.last_name.or_else(|| identity.last_name.clone());
        member.phone = member.phone.or_else(|| identity.phone.clone());
        member
    }
}

#[async_trait]
impl OnboardingRepository for PostgresOnboardingRepository {
    async fn link_identity(&self, identity: &NewIdentity) -> Result<LinkOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to start transaction: {e}")))?;
        lock_membership(&mut tx).await?;

        if let Some(member) = Self::by_identity(&mut tx, &identity.identity_id).await? {
            tx.commit().await.map_err(|e| {
                RosterError::Internal(format!("Failed to commit transaction: {e}"))
            })?;
            return Ok(LinkOutcome {
                member,
                kind: LinkKind::AlreadyLinked,
            });
        }

        let super_admins = Self::count_super_admins(&mut tx, false).await?;
        let existing = Self::unlinked_by_email(&mut tx, &identity.email).await?;
        let assignment =
            decide_assignment(super_admins, existing.as_ref().map(EmailMatch::from).as_ref());

        let member = match existing {
            Some(row) => {
                let mut row = Self::adopt(row, identity);
                row.role = assignment.role;
                row.agency_id = assignment.agency_id;
                row.status = assignment.status;
                update_member(&mut *tx, &row).await?
            }
            None => {
                let member = Self::fresh_member(identity, assignment.role, assignment.status);
                insert_member(&mut *tx, &member).await?;
                member
            }
        };

        tx.commit()
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to commit transaction: {e}")))?;

        info!(
            identity_id = %identity.identity_id,
            member_id = %member.id,
            role = %member.role,
            assignment = assignment.kind.as_str(),
            "linked identity to member"
        );
        Ok(LinkOutcome {
            member,
            kind: LinkKind::Assigned(assignment.kind),
        })
    }

    async fn bootstrap_super_admin(&self, identity: &NewIdentity) -> Result<Option<Member>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to start transaction: {e}")))?;
        lock_membership(&mut tx).await?;

        if Self::count_super_admins(&mut tx, true).await? > 0 {
            return Ok(None);
        }

        let existing = match Self::by_identity(&mut tx, &identity.identity_id).await? {
            Some(member) => Some(member),
            None => Self::unlinked_by_email(&mut tx, &identity.email).await?,
        };

        let member = match existing {
            Some(row) => {
                let mut row = Self::adopt(row, identity);
                row.role = Role::SuperAdmin;
                row.status = MemberStatus::Active;
                update_member(&mut *tx, &row).await?
            }
            None => {
                let member =
                    Self::fresh_member(identity, Role::SuperAdmin, MemberStatus::Active);
                insert_member(&mut *tx, &member).await?;
                member
            }
        };

        tx.commit()
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to commit transaction: {e}")))?;

        info!(
            identity_id = %identity.identity_id,
            member_id = %member.id,
            "bootstrapped super administrator"
        );
        Ok(Some(member))
    }
}
