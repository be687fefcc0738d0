use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use roster_core::{
    RosterError,
    domain::access::AccessDenied,
    identity::{TokenError, WebhookError},
};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<RosterError> for AppError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::Validation(msg) => Self::unprocessable(msg),
            RosterError::NotFound(msg) => Self::not_found(msg),
            RosterError::Conflict(msg) => Self::conflict(msg),
            RosterError::Forbidden(msg) => Self::forbidden(msg),
            RosterError::Unauthorized(msg) => Self::unauthorized(msg),
            RosterError::Database(err) => {
                tracing::error!(error = ?err, "database operation failed");
                Self::internal("Database operation failed")
            }
            other => {
                tracing::error!(error = %other, "request failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<AccessDenied> for AppError {
    fn from(err: AccessDenied) -> Self {
        Self::forbidden(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        Self::unauthorized(err.to_string())
    }
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::InvalidPayload(msg) => Self::bad_request(msg),
            other => Self::unauthorized(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_errors_map_to_statuses() {
        let cases = [
            (RosterError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (RosterError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (RosterError::Conflict("x".into()), StatusCode::CONFLICT),
            (RosterError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (RosterError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (RosterError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let err = AppError::from(RosterError::Internal("connection string leaked".into()));
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn bad_signatures_are_unauthorized() {
        assert_eq!(
            AppError::from(WebhookError::SignatureMismatch).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(WebhookError::InvalidPayload("no".into())).status,
            StatusCode::BAD_REQUEST
        );
    }
}
