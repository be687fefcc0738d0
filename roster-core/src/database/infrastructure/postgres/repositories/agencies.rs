use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use roster_model::{Agency, AgencyId, AgencyOption, AgencySummary};

use super::{like_pattern, map_write_error};
use crate::database::ports::agencies::{AgenciesRepository, AgencyCounts, AgencyFilter};
use crate::error::{Result, RosterError};

const AGENCY_COLUMNS: &str = "a.id, a.name, a.description, a.email, a.phone, a.website, \
     a.address, a.status, a.created_at, a.updated_at";

#[derive(Clone, Debug)]
pub struct PostgresAgenciesRepository {
    pool: PgPool,
}

impl PostgresAgenciesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<Agency> {
        let read = |column: &str, e: sqlx::Error| {
            RosterError::Internal(format!("Failed to read agency {column}: {e}"))
        };

        let id: Uuid = row.try_get("id").map_err(|e| read("id", e))?;
        let status: String = row.try_get("status").map_err(|e| read("status", e))?;
        let created_at: DateTime<Utc> =
            row.try_get("created_at").map_err(|e| read("created_at", e))?;
        let updated_at: DateTime<Utc> =
            row.try_get("updated_at").map_err(|e| read("updated_at", e))?;

        Ok(Agency {
            id: AgencyId(id),
            name: row.try_get("name").map_err(|e| read("name", e))?,
            description: row
                .try_get("description")
                .map_err(|e| read("description", e))?,
            email: row.try_get("email").map_err(|e| read("email", e))?,
            phone: row.try_get("phone").map_err(|e| read("phone", e))?,
            website: row.try_get("website").map_err(|e| read("website", e))?,
            address: row.try_get("address").map_err(|e| read("address", e))?,
            status: status.parse()?,
            created_at,
            updated_at,
        })
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &AgencyFilter) {
    if let Some(agency) = filter.agency {
        builder.push(" AND a.id = ");
        builder.push_bind(agency.to_uuid());
    }
    if let Some(status) = filter.status {
        builder.push(" AND a.status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        builder.push(" AND a.name ILIKE ");
        builder.push_bind(like_pattern(search));
    }
}

#[async_trait]
impl AgenciesRepository for PostgresAgenciesRepository {
    async fn insert(&self, agency: &Agency) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO agencies (
                id, name, description, email, phone, website, address,
                status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(agency.id.to_uuid())
        .bind(&agency.name)
        .bind(agency.description.as_deref())
        .bind(agency.email.as_deref())
        .bind(agency.phone.as_deref())
        .bind(agency.website.as_deref())
        .bind(agency.address.as_deref())
        .bind(agency.status.as_str())
        .bind(agency.created_at)
        .bind(agency.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_write_error(e, "Failed to create agency"))?;
        Ok(())
    }

    async fn get(&self, id: AgencyId) -> Result<Option<Agency>> {
        let row = sqlx::query(&format!(
            "SELECT {AGENCY_COLUMNS} FROM agencies a WHERE a.id = $1"
        ))
        .bind(id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to load agency: {e}")))?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn name_taken(&self, name: &str, except: Option<AgencyId>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM agencies
                WHERE lower(name) = lower($1)
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(except.map(|id| id.to_uuid()))
        .fetch_one(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to check agency name: {e}")))?;

        Ok(taken)
    }

    async fn list(&self, filter: &AgencyFilter) -> Result<(Vec<AgencySummary>, i64)> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM agencies a WHERE 1=1");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to count agencies: {e}")))?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            r#"
            SELECT {AGENCY_COLUMNS},
                (SELECT COUNT(*) FROM members m WHERE m.agency_id = a.id) AS member_count
            FROM agencies a
            WHERE 1=1
            "#
        ));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY lower(a.name) LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let rows = builder
            .build()
            .fetch_all(self.pool())
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to list agencies: {e}")))?;

        let agencies = rows
            .iter()
            .map(|row| -> Result<AgencySummary> {
                Ok(AgencySummary {
                    agency: Self::map_row(row)?,
                    member_count: row.try_get("member_count")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((agencies, total))
    }

    async fn update(&self, agency: &Agency) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE agencies
            SET name = $2,
                description = $3,
                email = $4,
                phone = $5,
                website = $6,
                address = $7,
                status = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(agency.id.to_uuid())
        .bind(&agency.name)
        .bind(agency.description.as_deref())
        .bind(agency.email.as_deref())
        .bind(agency.phone.as_deref())
        .bind(agency.website.as_deref())
        .bind(agency.address.as_deref())
        .bind(agency.status.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| map_write_error(e, "Failed to update agency"))?;

        if result.rows_affected() == 0 {
            return Err(RosterError::NotFound(format!("agency {}", agency.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: AgencyId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM agencies WHERE id = $1")
            .bind(id.to_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| match map_write_error(e, "Failed to delete agency") {
                RosterError::Conflict(_) => RosterError::Conflict(
                    "agency still has members; move or remove them first".to_string(),
                ),
                other => other,
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn member_count(&self, id: AgencyId) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE agency_id = $1")
                .bind(id.to_uuid())
                .fetch_one(self.pool())
                .await
                .map_err(|e| {
                    RosterError::Internal(format!("Failed to count agency members: {e}"))
                })?;
        Ok(count)
    }

    async fn active_options(&self) -> Result<Vec<AgencyOption>> {
        let rows = sqlx::query(
            "SELECT id, name FROM agencies WHERE status = 'ACTIVE' ORDER BY lower(name)",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to list agency options: {e}")))?;

        rows.iter()
            .map(|row| -> Result<AgencyOption> {
                Ok(AgencyOption {
                    id: AgencyId(row.try_get("id")?),
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn counts(&self) -> Result<AgencyCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'INACTIVE') AS inactive
            FROM agencies
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to count agencies: {e}")))?;

        Ok(AgencyCounts {
            total: row.try_get("total")?,
            inactive: row.try_get("inactive")?,
        })
    }
}
