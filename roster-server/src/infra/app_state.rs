use std::{fmt, sync::Arc};

use anyhow::Context;
use tracing::info;

use roster_config::{Config, TokenKey};
use roster_core::{
    application::{
        ActivityService, AdminService, AgencyService, AppUnitOfWork, IdentityWebhookService,
        MemberService, OnboardingService,
    },
    database::PostgresDatabase,
    identity::{IdentityVerifier, TokenSettings, WebhookVerifier},
};

#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresDatabase>,
    pub unit_of_work: Arc<AppUnitOfWork>,
    pub config: Arc<Config>,
    pub identity_verifier: Arc<IdentityVerifier>,
    /// Absent only in development mode without a configured secret; the
    /// webhook endpoint then refuses every delivery.
    pub webhook_verifier: Option<Arc<WebhookVerifier>>,
    pub agencies: AgencyService,
    pub members: MemberService,
    pub onboarding: OnboardingService,
    pub activity: ActivityService,
    pub admin: AdminService,
    pub webhooks: IdentityWebhookService,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("postgres", &self.postgres)
            .field("identity_verifier", &self.identity_verifier)
            .field("webhooks_enabled", &self.webhook_verifier.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire services and verifiers from a connected database and a loaded
    /// configuration.
    pub fn new(postgres: PostgresDatabase, config: Config) -> anyhow::Result<Self> {
        let identity_verifier = build_identity_verifier(&config)?;
        let webhook_verifier = match config.identity.webhook_secret.as_deref() {
            Some(secret) => Some(Arc::new(
                WebhookVerifier::new(secret, config.identity.webhook_tolerance_secs)
                    .context("invalid identity webhook secret")?,
            )),
            None => None,
        };

        let uow = AppUnitOfWork::from_postgres(&postgres);
        let onboarding =
            OnboardingService::new(uow.clone()).with_setup_token(config.setup_token.clone());

        info!(
            webhooks_enabled = webhook_verifier.is_some(),
            bootstrap_token_required = config.setup_token.is_some(),
            "application state initialised"
        );

        Ok(Self {
            agencies: AgencyService::new(uow.clone()),
            members: MemberService::new(uow.clone()),
            activity: ActivityService::new(uow.clone()),
            admin: AdminService::new(uow.clone()),
            webhooks: IdentityWebhookService::new(uow.clone()),
            onboarding,
            postgres: Arc::new(postgres),
            unit_of_work: Arc::new(uow),
            config: Arc::new(config),
            identity_verifier: Arc::new(identity_verifier),
            webhook_verifier,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn postgres(&self) -> &PostgresDatabase {
        &self.postgres
    }

    pub fn unit_of_work(&self) -> Arc<AppUnitOfWork> {
        Arc::clone(&self.unit_of_work)
    }
}

fn build_identity_verifier(config: &Config) -> anyhow::Result<IdentityVerifier> {
    let settings = TokenSettings {
        issuer: config.identity.issuer.clone(),
        authorized_parties: config.identity.authorized_parties.clone(),
        leeway_secs: config.identity.token_leeway_secs,
    };

    let verifier = match config.identity.token_key.as_ref() {
        Some(TokenKey::Rs256Pem(pem)) => IdentityVerifier::rs256(pem, settings)
            .context("failed to parse identity provider public key")?,
        Some(TokenKey::Hs256Secret(secret)) => {
            IdentityVerifier::hs256(secret.as_bytes(), settings)
                .context("invalid identity token secret")?
        }
        None => anyhow::bail!("no identity token verification key configured"),
    };
    Ok(verifier)
}
