//! Shared fixtures for the roster-server HTTP tests.
#![allow(dead_code)]

use anyhow::{Result, anyhow};
use axum_test::{TestResponse, TestServer};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use sqlx::PgPool;

use roster_config::{
    Config, ConfigMetadata, CorsConfig, DatabaseConfig, IdentityConfig, ServerConfig, TokenKey,
};
use roster_core::{
    database::PostgresDatabase,
    identity::{
        IdentityClaims, WebhookVerifier,
        webhook::{HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP},
    },
};
use roster_model::{
    Agency, AgencyId, AgencyStatus, Member, MemberId, MemberStatus, MembershipType, Role,
    routes::v1,
};
use roster_server::{AppState, create_app};

pub const TOKEN_SECRET: &str = "roster-integration-token-secret";
pub const ISSUER: &str = "https://identity.roster.test";
/// `whsec_` + base64("roster-integration-webhook-key")
pub const WEBHOOK_SECRET: &str = "whsec_cm9zdGVyLWludGVncmF0aW9uLXdlYmhvb2sta2V5";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

pub fn test_config(setup_token: Option<&str>) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 5,
        },
        identity: IdentityConfig {
            issuer: Some(ISSUER.into()),
            authorized_parties: Vec::new(),
            token_key: Some(TokenKey::Hs256Secret(TOKEN_SECRET.into())),
            token_leeway_secs: 5,
            webhook_secret: Some(WEBHOOK_SECRET.into()),
            webhook_tolerance_secs: 300,
            webhook_retention_days: 30,
        },
        cors: CorsConfig {
            allowed_origins: Vec::new(),
            allowed_methods: vec!["GET".into(), "POST".into(), "PUT".into(), "DELETE".into()],
            allowed_headers: vec!["authorization".into(), "content-type".into()],
            allow_credentials: false,
        },
        setup_token: setup_token.map(str::to_string),
        dev_mode: true,
        metadata: ConfigMetadata::default(),
    }
}

pub async fn build_test_app(pool: PgPool) -> Result<TestApp> {
    build_test_app_with(pool, test_config(None)).await
}

pub async fn build_test_app_with(pool: PgPool, config: Config) -> Result<TestApp> {
    let state = AppState::new(PostgresDatabase::from_pool(pool), config)?;
    let server = TestServer::new(create_app(state.clone()))
        .map_err(|err| anyhow!(err.to_string()))?;
    Ok(TestApp { server, state })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// A session token the provider would issue for `identity_id`.
pub fn token_for(identity_id: &str, email: Option<&str>) -> String {
    let claims = IdentityClaims {
        sub: identity_id.to_string(),
        email: email.map(str::to_string),
        azp: None,
        iss: Some(ISSUER.to_string()),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        iat: Some(Utc::now().timestamp()),
        nbf: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TOKEN_SECRET.as_bytes()),
    )
    .expect("test token encodes")
}

pub fn identity_for(email: &str) -> String {
    format!("user_{}", email.replace(['@', '.'], "_"))
}

impl TestApp {
    pub async fn agency(&self, name: &str) -> Result<Agency> {
        let now = Utc::now();
        let agency = Agency {
            id: AgencyId::new(),
            name: name.to_string(),
            description: None,
            email: None,
            phone: None,
            website: None,
            address: None,
            status: AgencyStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.state.unit_of_work.agencies.insert(&agency).await?;
        Ok(agency)
    }

    /// Insert an active member linked to an identity and return it with a
    /// session token for that identity.
    pub async fn linked_member(
        &self,
        email: &str,
        role: Role,
        agency_id: Option<AgencyId>,
    ) -> Result<(Member, String)> {
        let identity = identity_for(email);
        let now = Utc::now();
        let member = Member {
            id: MemberId::new(),
            identity_id: Some(identity.clone()),
            email: email.to_string(),
            first_name: None,
            last_name: None,
            phone: None,
            role,
            membership_type: MembershipType::default(),
            status: MemberStatus::Active,
            agency_id,
            created_at: now,
            updated_at: now,
        };
        self.state.unit_of_work.members.insert(&member).await?;
        Ok((member, token_for(&identity, Some(email))))
    }

    pub async fn super_admin(&self, email: &str) -> Result<(Member, String)> {
        self.linked_member(email, Role::SuperAdmin, None).await
    }

    /// Deliver a correctly signed webhook.
    pub async fn deliver_webhook(&self, delivery_id: &str, payload: &Value) -> TestResponse {
        let body = serde_json::to_vec(payload).expect("payload serializes");
        let verifier = WebhookVerifier::new(WEBHOOK_SECRET, 300).expect("test secret is valid");
        let timestamp = Utc::now().timestamp();
        let signature = verifier.sign(delivery_id, timestamp, &body);

        self.server
            .post(v1::webhooks::IDENTITY)
            .add_header(HEADER_ID, delivery_id.to_string())
            .add_header(HEADER_TIMESTAMP, timestamp.to_string())
            .add_header(HEADER_SIGNATURE, signature)
            .add_header("content-type", "application/json")
            .bytes(body.into())
            .await
    }
}

pub fn user_payload(event_type: &str, identity_id: &str, email: &str) -> Value {
    serde_json::json!({
        "type": event_type,
        "data": {
            "id": identity_id,
            "email_addresses": [{ "id": "idn_primary", "email_address": email }],
            "primary_email_address_id": "idn_primary",
            "first_name": "Robin",
            "last_name": "Park",
        }
    })
}
