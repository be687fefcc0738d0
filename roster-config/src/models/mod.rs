pub mod sources;

use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;
pub const DEFAULT_WEBHOOK_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_TOKEN_LEEWAY_SECS: u64 = 60;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub cors: CorsConfig,
    /// Secret the bootstrap endpoint requires, when set.
    pub setup_token: Option<String>,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

/// How session tokens from the identity provider are verified.
#[derive(Clone, PartialEq, Eq)]
pub enum TokenKey {
    /// Provider public key, PEM encoded.
    Rs256Pem(String),
    /// Shared secret. Meant for development and tests.
    Hs256Secret(String),
}

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKey::Rs256Pem(_) => f.write_str("Rs256Pem(..)"),
            TokenKey::Hs256Secret(_) => f.write_str("Hs256Secret(<redacted>)"),
        }
    }
}

#[derive(Clone)]
pub struct IdentityConfig {
    pub issuer: Option<String>,
    pub authorized_parties: Vec<String>,
    pub token_key: Option<TokenKey>,
    pub token_leeway_secs: u64,
    pub webhook_secret: Option<String>,
    pub webhook_tolerance_secs: u64,
    pub webhook_retention_days: u32,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("issuer", &self.issuer)
            .field("authorized_parties", &self.authorized_parties)
            .field("token_key", &self.token_key)
            .field("token_leeway_secs", &self.token_leeway_secs)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .field("webhook_retention_days", &self.webhook_retention_days)
            .finish()
    }
}

impl IdentityConfig {
    pub fn uses_shared_secret(&self) -> bool {
        matches!(self.token_key, Some(TokenKey::Hs256Secret(_)))
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins
            .iter()
            .any(|origin| origin.trim() == "*")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
