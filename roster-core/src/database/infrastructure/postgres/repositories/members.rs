use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use roster_model::{AgencyId, Member, MemberId, MemberStatus, Role};

use super::{like_pattern, lock_membership, map_write_error};
use crate::database::ports::members::{
    MemberCounts, MemberFilter, MemberIntegrity, MembersRepository,
};
use crate::error::{Result, RosterError};

pub(crate) const MEMBER_COLUMNS: &str = "id, identity_id, email, first_name, last_name, phone, \
     role, membership_type, status, agency_id, created_at, updated_at";

/// PostgreSQL-backed implementation of the `MembersRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresMembersRepository {
    pool: PgPool,
}

impl PostgresMembersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) fn map_member(row: &PgRow) -> Result<Member> {
    let read = |column: &str, e: sqlx::Error| {
        RosterError::Internal(format!("Failed to read member {column}: {e}"))
    };

    let id: Uuid = row.try_get("id").map_err(|e| read("id", e))?;
    let role: String = row.try_get("role").map_err(|e| read("role", e))?;
    let membership_type: String = row
        .try_get("membership_type")
        .map_err(|e| read("membership_type", e))?;
    let status: String = row.try_get("status").map_err(|e| read("status", e))?;
    let agency_id: Option<Uuid> =
        row.try_get("agency_id").map_err(|e| read("agency_id", e))?;
    let created_at: DateTime<Utc> =
        row.try_get("created_at").map_err(|e| read("created_at", e))?;
    let updated_at: DateTime<Utc> =
        row.try_get("updated_at").map_err(|e| read("updated_at", e))?;

    Ok(Member {
        id: MemberId(id),
        identity_id: row
            .try_get("identity_id")
            .map_err(|e| read("identity_id", e))?,
        email: row.try_get("email").map_err(|e| read("email", e))?,
        first_name: row.try_get("first_name").map_err(|e| read("first_name", e))?,
        last_name: row.try_get("last_name").map_err(|e| read("last_name", e))?,
        phone: row.try_get("phone").map_err(|e| read("phone", e))?,
        role: role.parse()?,
        membership_type: membership_type.parse()?,
        status: status.parse()?,
        agency_id: agency_id.map(AgencyId),
        created_at,
        updated_at,
    })
}

/// Insert `member` on any executor (pool or open transaction).
pub(crate) async fn insert_member<'e, E>(executor: E, member: &Member) -> Result<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO members (
            id, identity_id, email, first_name, last_name, phone,
            role, membership_type, status, agency_id, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(member.id.to_uuid())
    .bind(member.identity_id.as_deref())
    .bind(&member.email)
    .bind(member.first_name.as_deref())
    .bind(member.last_name.as_deref())
    .bind(member.phone.as_deref())
    .bind(member.role.as_str())
    .bind(member.membership_type.as_str())
    .bind(member.status.as_str())
    .bind(member.agency_id.map(|id| id.to_uuid()))
    .bind(member.created_at)
    .bind(member.updated_at)
    .execute(executor)
    .await
    .map_err(|e| map_write_error(e, "Failed to create member"))?;
    Ok(())
}

/// Write every mutable column back and return the stored row.
pub(crate) async fn update_member<'e, E>(executor: E, member: &Member) -> Result<Member>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query(&format!(
        r#"
        UPDATE members
        SET identity_id = $2,
            email = $3,
            first_name = $4,
            last_name = $5,
            phone = $6,
            role = $7,
            membership_type = $8,
            status = $9,
            agency_id = $10,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {MEMBER_COLUMNS}
        "#
    ))
    .bind(member.id.to_uuid())
    .bind(member.identity_id.as_deref())
    .bind(&member.email)
    .bind(member.first_name.as_deref())
    .bind(member.last_name.as_deref())
    .bind(member.phone.as_deref())
    .bind(member.role.as_str())
    .bind(member.membership_type.as_str())
    .bind(member.status.as_str())
    .bind(member.agency_id.map(|id| id.to_uuid()))
    .fetch_optional(executor)
    .await
    .map_err(|e| map_write_error(e, "Failed to update member"))?;

    match row {
        Some(row) => map_member(&row),
        None => Err(RosterError::NotFound(format!("member {}", member.id))),
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &MemberFilter) {
    if let Some(agency) = filter.agency {
        builder.push(" AND agency_id = ");
        builder.push_bind(agency.to_uuid());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(role) = filter.role {
        builder.push(" AND role = ");
        builder.push_bind(role.as_str());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        builder.push(" AND (email ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR first_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR last_name ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

/// Fail when `id` is an active super administrator and no other one is
/// active. Run under the membership lock so concurrent demotions see each
/// other's writes.
async fn ensure_other_super_admin(conn: &mut PgConnection, id: MemberId) -> Result<()> {
    let row = sqlx::query(
        r#"
        SELECT
            EXISTS (
                SELECT 1 FROM members WHERE id = $1 AND role = $2 AND status = $3
            ) AS is_super_admin,
            (
                SELECT COUNT(*) FROM members WHERE id <> $1 AND role = $2 AND status = $3
            ) AS others
        "#,
    )
    .bind(id.to_uuid())
    .bind(Role::SuperAdmin.as_str())
    .bind(MemberStatus::Active.as_str())
    .fetch_one(conn)
    .await
    .map_err(|e| {
        RosterError::Internal(format!("Failed to count super administrators: {e}"))
    })?;

    let is_super_admin: bool = row.try_get("is_super_admin")?;
    let others: i64 = row.try_get("others")?;
    if is_super_admin && others == 0 {
        return Err(RosterError::Conflict(
            "cannot remove the last active super administrator".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl MembersRepository for PostgresMembersRepository {
    async fn insert(&self, member: &Member) -> Result<()> {
        insert_member(self.pool(), member).await
    }

    async fn get(&self, id: MemberId) -> Result<Option<Member>> {
        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"
        ))
        .bind(id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to load member: {e}")))?;

        row.as_ref().map(map_member).transpose()
    }

    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<Member>> {
        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE identity_id = $1"
        ))
        .bind(identity_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            RosterError::Internal(format!("Failed to load member by identity: {e}"))
        })?;

        row.as_ref().map(map_member).transpose()
    }

    async fn email_taken(&self, email: &str, except: Option<MemberId>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM members
                WHERE lower(email) = lower($1)
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except.map(|id| id.to_uuid()))
        .fetch_one(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to check member email: {e}")))?;

        Ok(taken)
    }

    async fn list(&self, filter: &MemberFilter) -> Result<(Vec<Member>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM members WHERE 1=1");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to count members: {e}")))?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE 1=1"
        ));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY last_name NULLS LAST, first_name NULLS LAST, email LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let rows = builder
            .build()
            .fetch_all(self.pool())
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to list members: {e}")))?;

        let members = rows.iter().map(map_member).collect::<Result<Vec<_>>>()?;
        Ok((members, total))
    }

    async fn update(&self, member: &Member) -> Result<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to start transaction: {e}")))?;
        lock_membership(&mut tx).await?;
        if !(member.role == Role::SuperAdmin && member.is_active()) {
            ensure_other_super_admin(&mut tx, member.id).await?;
        }
        update_member(&mut *tx, member).await?;
        tx.commit()
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to commit transaction: {e}")))
    }

    async fn delete(&self, id: MemberId) -> Result<bool> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to start transaction: {e}")))?;
        lock_membership(&mut tx).await?;
        ensure_other_super_admin(&mut tx, id).await?;

        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id.to_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "Failed to delete member"))?;
        tx.commit()
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to commit transaction: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_active_super_admins(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM members WHERE role = $1 AND status = $2",
        )
        .bind(Role::SuperAdmin.as_str())
        .bind(MemberStatus::Active.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            RosterError::Internal(format!("Failed to count super administrators: {e}"))
        })?;
        Ok(count)
    }

    async fn counts(&self, agency: Option<AgencyId>) -> Result<MemberCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'ACTIVE') AS active,
                COUNT(*) FILTER (WHERE status = 'PENDING') AS pending
            FROM members
            WHERE ($1::uuid IS NULL OR agency_id = $1)
            "#,
        )
        .bind(agency.map(|id| id.to_uuid()))
        .fetch_one(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to count members: {e}")))?;

        Ok(MemberCounts {
            total: row.try_get("total")?,
            active: row.try_get("active")?,
            pending: row.try_get("pending")?,
        })
    }

    async fn integrity(&self) -> Result<MemberIntegrity> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (
                    WHERE m.agency_id IS NULL AND m.role <> 'SUPER_ADMIN'
                ) AS without_agency,
                COUNT(*) FILTER (WHERE m.identity_id IS NULL) AS without_identity,
                COUNT(*) FILTER (WHERE a.status = 'INACTIVE') AS in_inactive_agencies
            FROM members m
            LEFT JOIN agencies a ON a.id = m.agency_id
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            RosterError::Internal(format!("Failed to compute member integrity: {e}"))
        })?;

        Ok(MemberIntegrity {
            without_agency: row.try_get("without_agency")?,
            without_identity: row.try_get("without_identity")?,
            in_inactive_agencies: row.try_get("in_inactive_agencies")?,
        })
    }

    async fn unlink_identity(&self, identity_id: &str) -> Result<Option<Member>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE members
            SET identity_id = NULL,
                status = $2,
                updated_at = NOW()
            WHERE identity_id = $1
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(identity_id)
        .bind(MemberStatus::Inactive.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to unlink identity: {e}")))?;

        row.as_ref().map(map_member).transpose()
    }
}
