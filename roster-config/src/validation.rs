use axum::http::{Method, header::HeaderName};
use thiserror::Error;

use crate::models::{Config, CorsConfig};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error(
        "no identity token key configured; set IDENTITY_JWT_PUBLIC_KEY(_FILE) or IDENTITY_JWT_SECRET"
    )]
    MissingTokenKey,
    #[error("IDENTITY_WEBHOOK_SECRET is required when DEV_MODE is false")]
    MissingWebhookSecret,
    #[error("CORS wildcard origins are not allowed when DEV_MODE is false")]
    DangerousCorsWildcard,
    #[error("invalid CORS configuration: {reason}")]
    InvalidCorsConfig { reason: String },
    #[error("IDENTITY_WEBHOOK_RETENTION_DAYS must be between 1 and 3650, got {days}")]
    WebhookRetentionOutOfRange { days: u32 },
}

/// Upper bound for webhook delivery retention, in days.
pub const WEBHOOK_RETENTION_MAX_DAYS: u32 = 3650;

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.identity.token_key.is_none() {
        return Err(ConfigGuardRailError::MissingTokenKey);
    }

    if !config.dev_mode {
        if config.identity.webhook_secret.is_none() {
            return Err(ConfigGuardRailError::MissingWebhookSecret);
        }
        if config.cors.is_wildcard_included() {
            return Err(ConfigGuardRailError::DangerousCorsWildcard);
        }
        if config.identity.uses_shared_secret() {
            warnings.push_with_hint(
                "Session tokens are verified with a shared HS256 secret outside DEV_MODE",
                "Set IDENTITY_JWT_PUBLIC_KEY_FILE to the identity provider's RS256 public key",
            );
        }
    } else if config.identity.webhook_secret.is_none() {
        warnings.push_with_hint(
            "IDENTITY_WEBHOOK_SECRET not set; identity webhooks will be rejected",
            "Copy the signing secret (whsec_...) from the identity provider's webhook settings",
        );
    }

    validate_cors(&config.cors)?;

    let retention = config.identity.webhook_retention_days;
    if !(1..=WEBHOOK_RETENTION_MAX_DAYS).contains(&retention) {
        return Err(ConfigGuardRailError::WebhookRetentionOutOfRange { days: retention });
    }

    if config.setup_token.is_none() {
        warnings.push_with_hint(
            "ROSTER_SETUP_TOKEN not set; any signed-in identity may bootstrap a super administrator while none is active",
            "Set ROSTER_SETUP_TOKEN to gate the bootstrap endpoint",
        );
    }

    if config.identity.issuer.is_none() {
        warnings.push(
            "IDENTITY_ISSUER not set; token issuer will not be checked",
        );
    }

    if config.cors.allow_credentials && config.cors.is_wildcard_included() {
        warnings.push(
            "CORS credentials allowed alongside wildcard origin; browsers will reject such configuration",
        );
    }

    Ok(warnings)
}

fn validate_cors(cors: &CorsConfig) -> Result<(), ConfigGuardRailError> {
    if cors.allowed_methods.is_empty() {
        return Err(ConfigGuardRailError::InvalidCorsConfig {
            reason: "CORS_ALLOWED_METHODS must include at least one HTTP method"
                .into(),
        });
    }

    for method in &cors.allowed_methods {
        Method::from_bytes(method.as_bytes()).map_err(|_| {
            ConfigGuardRailError::InvalidCorsConfig {
                reason: format!(
                    "invalid HTTP method `{method}` in CORS_ALLOWED_METHODS"
                ),
            }
        })?;
    }

    for header in &cors.allowed_headers {
        HeaderName::from_bytes(header.as_bytes()).map_err(|_| {
            ConfigGuardRailError::InvalidCorsConfig {
                reason: format!(
                    "invalid header name `{header}` in CORS_ALLOWED_HEADERS"
                ),
            }
        })?;
    }

    Ok(())
}
