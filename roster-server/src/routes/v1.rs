use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use roster_model::routes::v1;

use crate::{
    AppState,
    handlers::{activity, admin, agencies, me, members, webhooks},
    middleware::{auth_middleware, super_admin_middleware},
};

/// Create all v1 API routes
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Signature-authenticated
        .route(v1::webhooks::IDENTITY, post(webhooks::identity))
        .merge(create_protected_routes(state.clone()))
        .merge(create_admin_routes(state))
}

/// Routes that require a verified session token. Fine-grained role checks
/// happen in the services.
fn create_protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(v1::me::CURRENT, get(me::whoami))
        .route(v1::me::ROLE_SYNC, post(me::sync_role))
        .route(v1::onboarding::COMPLETE, post(me::complete_onboarding))
        .route(v1::onboarding::AGENCIES, get(me::onboarding_agencies))
        .route(v1::setup::BOOTSTRAP, post(me::bootstrap))
        .route(
            v1::agencies::COLLECTION,
            get(agencies::list).post(agencies::create),
        )
        .route(
            v1::agencies::ITEM,
            get(agencies::get)
                .put(agencies::update)
                .delete(agencies::delete),
        )
        .route(v1::agencies::MEMBERS, get(agencies::members))
        .route(
            v1::members::COLLECTION,
            get(members::list).post(members::create),
        )
        .route(
            v1::members::ITEM,
            get(members::get)
                .put(members::update)
                .delete(members::delete),
        )
        .route(v1::members::ROLE, put(members::assign_role))
        .route(v1::activity::COLLECTION, get(activity::list))
        .route(v1::dashboard::SUMMARY, get(activity::dashboard))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Super-administrator utilities
fn create_admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(v1::admin::DIAGNOSTICS, get(admin::diagnostics))
        .route(v1::admin::MEMBER_ROLE_REPAIR, put(admin::repair_role))
        .route_layer(middleware::from_fn(super_admin_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
