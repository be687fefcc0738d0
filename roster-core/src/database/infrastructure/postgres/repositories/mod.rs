pub mod activity;
pub mod agencies;
pub mod members;
pub mod onboarding;
pub mod webhook_deliveries;

pub use activity::PostgresActivityRepository;
pub use agencies::PostgresAgenciesRepository;
pub use members::PostgresMembersRepository;
pub use onboarding::PostgresOnboardingRepository;
pub use webhook_deliveries::PostgresWebhookDeliveriesRepository;

use sqlx::PgConnection;

use crate::error::{Result, RosterError};

/// Advisory lock key serialising role assignment and super-admin changes
/// across server instances.
const MEMBERSHIP_LOCK_KEY: i64 = 0x526f_7374_6572;

/// Name of the unique index on `lower(members.email)`.
pub(crate) const MEMBER_EMAIL_KEY: &str = "members_email_lower_key";
pub(crate) const MEMBER_IDENTITY_KEY: &str = "members_identity_id_key";
pub(crate) const AGENCY_NAME_KEY: &str = "agencies_name_lower_key";

/// Translate constraint violations into domain errors, wrapping anything
/// else with `context`.
pub(crate) fn map_write_error(err: sqlx::Error, context: &str) -> RosterError {
    if let Some(db_err) = err.as_database_error() {
        match db_err.constraint() {
            Some(MEMBER_EMAIL_KEY) => {
                return RosterError::Conflict(
                    "a member with this email already exists".to_string(),
                );
            }
            Some(MEMBER_IDENTITY_KEY) => {
                return RosterError::Conflict(
                    "this identity is already linked to another member".to_string(),
                );
            }
            Some(AGENCY_NAME_KEY) => {
                return RosterError::Conflict(
                    "an agency with this name already exists".to_string(),
                );
            }
            _ => {}
        }
        if db_err.is_foreign_key_violation() {
            return RosterError::Conflict(format!("{context}: row is still referenced"));
        }
    }
    RosterError::Internal(format!("{context}: {err}"))
}

/// Take the transaction-scoped membership lock on `conn`.
pub(crate) async fn lock_membership(conn: &mut PgConnection) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MEMBERSHIP_LOCK_KEY)
        .execute(conn)
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to acquire membership lock: {e}")))?;
    Ok(())
}

/// Escape `%`/`_` so user input is matched literally inside `ILIKE`.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" acme "), "%acme%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
