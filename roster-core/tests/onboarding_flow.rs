//! Identity linking, first-user promotion, email recovery and bootstrap.

use anyhow::Result;
use roster_core::{
    RosterError,
    application::OnboardingService,
    domain::{access::Principal, onboarding::NewIdentity},
    identity::IdentityClaims,
};
use roster_model::{BootstrapRequest, MemberStatus, OnboardingRequest, Role};
use sqlx::PgPool;

#[path = "support/mod.rs"]
mod support;

use support::{MemberSeed, TestHarness};

fn identity(id: &str, email: &str) -> NewIdentity {
    NewIdentity {
        identity_id: id.to_string(),
        email: email.to_string(),
        first_name: None,
        last_name: None,
        phone: None,
    }
}

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn first_identity_becomes_super_admin(pool: PgPool) -> Result<()> {
    let harness = TestHarness::new(pool);
    let service = OnboardingService::new(harness.uow.clone());

    let principal = Principal::unlinked("idp_first", Some("first@example.org".into()));
    let outcome = service.sync_role(&principal).await?;

    assert!(outcome.linked);
    assert_eq!(outcome.role, Some(Role::SuperAdmin));
    let member = outcome.member.expect("member linked");
    assert_eq!(member.status, MemberStatus::Active);
    assert_eq!(member.identity_id.as_deref(), Some("idp_first"));

    // Running the sync again reports the stored role without relinking.
    let principal = Principal::from_member("idp_first", None, &member);
    let again = service.sync_role(&principal).await?;
    assert!(!again.linked);
    assert_eq!(again.role, Some(Role::SuperAdmin));
    Ok(())
}

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn later_identities_wait_for_onboarding(pool: PgPool) -> Result<()> {
    let harness = TestHarness::new(pool);
    harness.super_admin("root@example.org").await?;
    let agency = harness.agency("North Branch").await?;
    let service = OnboardingService::new(harness.uow.clone());

    let principal = Principal::unlinked("idp_new", Some("new@example.org".into()));
    let outcome = service.sync_role(&principal).await?;
    let member = outcome.member.expect("member linked");
    assert_eq!(member.role, Role::AgencyUser);
    assert_eq!(member.status, MemberStatus::Pending);
    assert_eq!(member.agency_id, None);

    let principal = service
        .resolve_principal(&claims("idp_new", "new@example.org"))
        .await?;
    assert!(principal.needs_onboarding());

    let missing_agency = service
        .complete(&principal, OnboardingRequest::default())
        .await;
    assert!(matches!(missing_agency, Err(RosterError::Validation(_))));

    let completed = service
        .complete(
            &principal,
            OnboardingRequest {
                agency_id: Some(agency.id),
                first_name: Some("Nia".into()),
                ..OnboardingRequest::default()
            },
        )
        .await?;
    assert_eq!(completed.status, MemberStatus::Active);
    assert_eq!(completed.agency_id, Some(agency.id));
    assert_eq!(completed.first_name.as_deref(), Some("Nia"));

    let principal = service
        .resolve_principal(&claims("idp_new", "new@example.org"))
        .await?;
    assert!(!principal.needs_onboarding());
    Ok(())
}

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn email_match_recovers_prior_role(pool: PgPool) -> Result<()> {
    let harness = TestHarness::new(pool);
    harness.super_admin("root@example.org").await?;
    let agency = harness.agency("Harbour").await?;
    let seeded = harness
        .member(MemberSeed {
            email: "lead@example.org",
            role: Role::AgencyAdmin,
            status: MemberStatus::Pending,
            agency_id: Some(agency.id),
            identity_id: None,
        })
        .await?;

    let linked = harness
        .uow
        .onboarding
        .link_identity(&identity("idp_lead", "lead@example.org"))
        .await?;

    assert!(linked.newly_linked());
    assert_eq!(linked.member.id, seeded.id);
    assert_eq!(linked.member.role, Role::AgencyAdmin);
    assert_eq!(linked.member.agency_id, Some(agency.id));
    assert_eq!(linked.member.status, MemberStatus::Active);
    Ok(())
}

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn email_linked_elsewhere_is_a_conflict(pool: PgPool) -> Result<()> {
    let harness = TestHarness::new(pool);
    harness.super_admin("root@example.org").await?;

    let result = harness
        .uow
        .onboarding
        .link_identity(&identity("idp_other", "root@example.org"))
        .await;
    assert!(matches!(result, Err(RosterError::Conflict(_))));
    Ok(())
}

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn concurrent_first_logins_promote_once(pool: PgPool) -> Result<()> {
    let harness = TestHarness::new(pool);
    let first = identity("idp_a", "a@example.org");
    let second = identity("idp_b", "b@example.org");

    let (a, b) = tokio::join!(
        harness.uow.onboarding.link_identity(&first),
        harness.uow.onboarding.link_identity(&second),
    );
    let roles = [a?.member.role, b?.member.role];

    assert_eq!(
        roles.iter().filter(|role| **role == Role::SuperAdmin).count(),
        1
    );
    assert_eq!(harness.uow.members.count_active_super_admins().await?, 1);
    Ok(())
}

#[sqlx::test(migrator = "roster_core::MIGRATOR")]
async fn bootstrap_requires_token_and_no_active_super_admin(pool: PgPool) -> Result<()> {
    let harness = TestHarness::new(pool);
    harness
        .member(MemberSeed {
            email: "parked@example.org",
            role: Role::SuperAdmin,
            status: MemberStatus::Suspended,
            agency_id: None,
            identity_id: Some("idp_parked"),
        })
        .await?;
    let service = OnboardingService::new(harness.uow.clone())
        .with_setup_token(Some("let-me-in".into()));
    let principal = Principal::unlinked("idp_ops", Some("ops@example.org".into()));

    let wrong = service
        .bootstrap(
            &principal,
            BootstrapRequest {
                setup_token: Some("guess".into()),
                ..BootstrapRequest::default()
            },
        )
        .await;
    assert!(matches!(wrong, Err(RosterError::Unauthorized(_))));

    let request = BootstrapRequest {
        setup_token: Some("let-me-in".into()),
        ..BootstrapRequest::default()
    };
    let member = service.bootstrap(&principal, request.clone()).await?;
    assert_eq!(member.role, Role::SuperAdmin);
    assert_eq!(member.status, MemberStatus::Active);

    let again = service.bootstrap(&principal, request).await;
    assert!(matches!(again, Err(RosterError::Conflict(_))));
    Ok(())
}

fn claims(sub: &str, email: &str) -> IdentityClaims {
    IdentityClaims {
        sub: sub.to_string(),
        email: Some(email.to_string()),
        azp: None,
        iss: None,
        exp: 0,
        iat: None,
        nbf: None,
    }
}
