use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use roster_core::domain::access::Principal;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

/// Verify the bearer session token and attach the caller's [`Principal`].
/// The member table is only read here; linking happens in the onboarding
/// handlers and the webhook.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = extract_bearer_token(&request)?;

    let claims = state.identity_verifier.verify(&token).map_err(|err| {
        debug!(error = %err, "rejected session token");
        AppError::from(err)
    })?;
    let principal = state.onboarding.resolve_principal(&claims).await?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Must run after [`auth_middleware`].
pub async fn super_admin_middleware(request: Request, next: Next) -> AppResult<Response> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    if !principal.is_super_admin() {
        return Err(AppError::forbidden("Super administrator access required"));
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> AppResult<String> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing bearer token"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::unauthorized("Missing bearer token"))
}
