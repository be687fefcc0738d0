use std::{fmt, time::Duration};

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::{info, warn};

use crate::error::{Result, RosterError};

/// Statistics about the connection pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    max_connections: u32,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn connect(connection_string: &str, settings: PoolSettings) -> Result<Self> {
        let options = connection_string
            .trim()
            .parse::<PgConnectOptions>()
            .map_err(|e| {
                RosterError::Internal(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        let min_connections = settings.min_connections.min(settings.max_connections);
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .max_lifetime(Duration::from_secs(1800))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .map_err(|e| RosterError::Internal(format!("Database connection failed: {e}")))?;

        info!(
            max_connections = settings.max_connections,
            min_connections, "database pool initialized"
        );

        Ok(Self {
            pool,
            max_connections: settings.max_connections,
        })
    }

    /// Wrap an existing pool (tests hand one in from `#[sqlx::test]`).
    pub fn from_pool(pool: PgPool) -> Self {
        let max_connections = pool.options().get_max_connections();
        Self {
            pool,
            max_connections,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX),
            max_size: self.max_connections,
        }
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| RosterError::Internal(format!("Database ping failed: {e}")))?;
        Ok(())
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        self.preflight().await?;
        crate::MIGRATOR.run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }

    /// Check that the connected role may create objects in the current
    /// schema, so migrations fail with an actionable message instead of a
    /// bare permission error.
    pub async fn preflight(&self) -> Result<()> {
        let row: (String, String, bool) = sqlx::query_as(
            r#"
            SELECT current_user::text,
                   current_schema()::text,
                   has_schema_privilege(current_user, current_schema(), 'CREATE')
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RosterError::Internal(format!("Privilege preflight failed: {e}")))?;
        let (user, schema, can_create) = row;

        if !can_create {
            warn!(%user, %schema, "role lacks CREATE on schema");
            return Err(RosterError::Internal(format!(
                "Database preflight failed: role '{user}' lacks CREATE on schema {schema}.\n\
                 Run as the database owner: GRANT USAGE, CREATE ON SCHEMA {schema} TO {user};"
            )));
        }
        Ok(())
    }
}
