use thiserror::Error;

use roster_model::ModelError;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ModelError> for RosterError {
    fn from(err: ModelError) -> Self {
        // Model parse failures only surface when a stored row carries a
        // value the enums no longer understand.
        RosterError::Internal(err.to_string())
    }
}

impl From<crate::domain::access::AccessDenied> for RosterError {
    fn from(err: crate::domain::access::AccessDenied) -> Self {
        RosterError::Forbidden(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
