pub mod v1;

use axum::Router;

use crate::AppState;

/// Create the main API router with all versions
pub fn create_api_router(state: AppState) -> Router<AppState> {
    // v1 route constants carry their `/api/v1` prefix.
    Router::new().merge(v1::create_v1_router(state))
}
