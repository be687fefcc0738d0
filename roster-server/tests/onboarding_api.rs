use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;

use roster_model::{Role, routes::v1};

#[path = "support/mod.rs"]
mod support;

use support::{bearer, build_test_app, build_test_app_with, test_config, token_for};

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn requests_without_valid_token_are_rejected(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;

    app.server
        .get(v1::me::CURRENT)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .get(v1::me::CURRENT)
        .add_header("Authorization", bearer("not-a-jwt"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["status"], 401);
    Ok(())
}

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn first_identity_is_promoted_on_role_sync(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    let token = token_for("user_first", Some("Founder@Example.com"));

    let me = app
        .server
        .get(v1::me::CURRENT)
        .add_header("Authorization", bearer(&token))
        .await;
    me.assert_status_ok();
    let body: Value = me.json();
    assert_eq!(body["data"]["needs_onboarding"], true);
    assert!(body["data"]["role"].is_null());

    let sync = app
        .server
        .post(v1::me::ROLE_SYNC)
        .add_header("Authorization", bearer(&token))
        .await;
    sync.assert_status_ok();
    let body: Value = sync.json();
    assert_eq!(body["data"]["linked"], true);
    assert_eq!(body["data"]["role"], "SUPER_ADMIN");
    assert_eq!(body["data"]["member"]["email"], "founder@example.com");

    let me: Value = app
        .server
        .get(v1::me::CURRENT)
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(me["data"]["needs_onboarding"], false);
    assert!(
        me["data"]["capabilities"]
            .as_array()
            .is_some_and(|caps| caps.iter().any(|cap| cap == "roles:repair"))
    );
    Ok(())
}

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn later_identities_complete_onboarding_with_an_agency(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.super_admin("owner@example.com").await?;
    let agency = app.agency("North Shore").await?;
    let token = token_for("user_newcomer", Some("newcomer@example.com"));

    app.server
        .get(v1::agencies::COLLECTION)
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let options: Value = app
        .server
        .get(v1::onboarding::AGENCIES)
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(options["data"][0]["name"], "North Shore");

    let completed = app
        .server
        .post(v1::onboarding::COMPLETE)
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "agency_id": agency.id, "first_name": "Nia" }))
        .await;
    completed.assert_status_ok();
    let body: Value = completed.json();
    assert_eq!(body["data"]["role"], Role::AgencyUser.as_str());
    assert_eq!(body["data"]["status"], "ACTIVE");
    assert_eq!(body["data"]["agency_id"], agency.id.to_string());

    let agencies = app
        .server
        .get(v1::agencies::COLLECTION)
        .add_header("Authorization", bearer(&token))
        .await;
    agencies.assert_status_ok();
    let body: Value = agencies.json();
    assert_eq!(body["data"]["total"], 1);
    Ok(())
}

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn email_match_recovers_role_through_sync(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.super_admin("owner@example.com").await?;
    let agency = app.agency("Harbour").await?;
    let (owner_token, admin_token) = (
        token_for(&support::identity_for("owner@example.com"), Some("owner@example.com")),
        token_for("user_returning", Some("returning@example.com")),
    );

    app.server
        .post(v1::members::COLLECTION)
        .add_header("Authorization", bearer(&owner_token))
        .json(&json!({
            "email": "Returning@Example.com",
            "role": "ADMIN",
            "agency_id": agency.id,
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let sync: Value = app
        .server
        .post(v1::me::ROLE_SYNC)
        .add_header("Authorization", bearer(&admin_token))
        .await
        .json();
    assert_eq!(sync["data"]["linked"], true);
    assert_eq!(sync["data"]["role"], "AGENCY_ADMIN");
    assert_eq!(sync["data"]["member"]["status"], "ACTIVE");
    Ok(())
}

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn bootstrap_honours_setup_token(pool: PgPool) -> Result<()> {
    let app = build_test_app_with(pool, test_config(Some("open-sesame"))).await?;
    let token = token_for("user_operator", Some("operator@example.com"));

    app.server
        .post(v1::setup::BOOTSTRAP)
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "setup_token": "wrong" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let promoted = app
        .server
        .post(v1::setup::BOOTSTRAP)
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "setup_token": "open-sesame" }))
        .await;
    promoted.assert_status_ok();
    let body: Value = promoted.json();
    assert_eq!(body["data"]["role"], "SUPER_ADMIN");

    let second = token_for("user_latecomer", Some("late@example.com"));
    app.server
        .post(v1::setup::BOOTSTRAP)
        .add_header("Authorization", bearer(&second))
        .json(&json!({ "setup_token": "open-sesame" }))
        .await
        .assert_status(StatusCode::CONFLICT);
    Ok(())
}
