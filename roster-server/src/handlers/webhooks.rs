use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
};
use chrono::Utc;
use tracing::{info, warn};

use roster_core::{
    application::WebhookOutcome,
    identity::{
        IdentityEvent, WebhookHeaders,
        webhook::{HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP},
    },
};
use roster_model::ApiResponse;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

/// Receives identity provider user events. Authenticated by the delivery
/// signature, not by a session token.
pub async fn identity(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<WebhookOutcome>>> {
    let Some(verifier) = state.webhook_verifier.as_ref() else {
        warn!("identity webhook received but no webhook secret is configured");
        return Err(AppError::service_unavailable(
            "identity webhooks are not configured",
        ));
    };

    let delivery = WebhookHeaders {
        id: header_str(&headers, HEADER_ID),
        timestamp: header_str(&headers, HEADER_TIMESTAMP),
        signature: header_str(&headers, HEADER_SIGNATURE),
    };
    verifier
        .verify(&delivery, &body, Utc::now())
        .inspect_err(|err| warn!(delivery_id = delivery.id, error = %err, "rejected webhook"))?;

    let event = IdentityEvent::parse(&body)?;
    let outcome = state.webhooks.handle(delivery.id, event).await?;
    info!(delivery_id = delivery.id, ?outcome, "identity webhook handled");

    Ok(Json(ApiResponse::success(outcome)))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
