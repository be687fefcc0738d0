use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use roster_model::{ActivityEntry, AgencyId, MemberId};

use crate::database::ports::activity::{ActivityFilter, ActivityRepository, NewActivity};
use crate::error::{Result, RosterError};

const ACTIVITY_COLUMNS: &str = "id, actor_member_id, actor_identity_id, action, entity_type, \
     entity_id, agency_id, details, created_at";

#[derive(Clone, Debug)]
pub struct PostgresActivityRepository {
    pool: PgPool,
}

impl PostgresActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<ActivityEntry> {
        let read = |column: &str, e: sqlx::Error| {
            RosterError::Internal(format!("Failed to read activity {column}: {e}"))
        };

        let actor_member_id: Option<Uuid> = row
            .try_get("actor_member_id")
            .map_err(|e| read("actor_member_id", e))?;
        let agency_id: Option<Uuid> =
            row.try_get("agency_id").map_err(|e| read("agency_id", e))?;
        let created_at: DateTime<Utc> =
            row.try_get("created_at").map_err(|e| read("created_at", e))?;

        Ok(ActivityEntry {
            id: row.try_get("id").map_err(|e| read("id", e))?,
            actor_member_id: actor_member_id.map(MemberId),
            actor_identity_id: row
                .try_get("actor_identity_id")
                .map_err(|e| read("actor_identity_id", e))?,
            action: row.try_get("action").map_err(|e| read("action", e))?,
            entity_type: row
                .try_get("entity_type")
                .map_err(|e| read("entity_type", e))?,
            entity_id: row.try_get("entity_id").map_err(|e| read("entity_id", e))?,
            agency_id: agency_id.map(AgencyId),
            details: row.try_get("details").map_err(|e| read("details", e))?,
            created_at,
        })
    }
}

#[async_trait]
impl ActivityRepository for PostgresActivityRepository {
    async fn record(&self, activity: NewActivity) -> Result<ActivityEntry> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO activity_log (
                id, actor_member_id, actor_identity_id, action, entity_type,
                entity_id, agency_id, details
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ACTIVITY_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(activity.actor_member_id.map(|id| id.to_uuid()))
        .bind(activity.actor_identity_id)
        .bind(activity.action)
        .bind(activity.entity_type)
        .bind(activity.entity_id)
        .bind(activity.agency_id.map(|id| id.to_uuid()))
        .bind(activity.details)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to record activity: {e}")))?;

        Self::map_row(&row)
    }

    async fn list(&self, filter: &ActivityFilter) -> Result<(Vec<ActivityEntry>, i64)> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ACTIVITY_COLUMNS}, COUNT(*) OVER() AS total_count FROM activity_log WHERE 1=1"
        ));

        if let Some(agency) = filter.agency {
            builder.push(" AND agency_id = ");
            builder.push_bind(agency.to_uuid());
        }
        if let Some(entity_type) = filter.entity_type.clone() {
            builder.push(" AND entity_type = ");
            builder.push_bind(entity_type);
        }
        if let Some(entity_id) = filter.entity_id {
            builder.push(" AND entity_id = ");
            builder.push_bind(entity_id);
        }

        builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let rows = builder
            .build()
            .fetch_all(self.pool())
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to list activity: {e}")))?;

        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total_count")?,
            None => 0,
        };
        let entries = rows.iter().map(Self::map_row).collect::<Result<Vec<_>>>()?;
        Ok((entries, total))
    }
}
