use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::{
    parse_bool_var, parse_csv_var, parse_var, path_var, string_var,
};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub identity: FileIdentityConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileIdentityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_parties: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_public_key_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_leeway_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_tolerance_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_retention_days: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<bool>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub database_url_file: Option<PathBuf>,
    pub database_host: Option<String>,
    pub database_port: Option<u16>,
    pub database_user: Option<String>,
    pub database_name: Option<String>,
    pub database_password: Option<String>,
    pub database_password_file: Option<PathBuf>,
    pub database_max_connections: Option<u32>,
    pub identity_issuer: Option<String>,
    pub identity_authorized_parties: Option<Vec<String>>,
    pub identity_jwt_public_key: Option<String>,
    pub identity_jwt_public_key_file: Option<PathBuf>,
    pub identity_jwt_secret: Option<String>,
    pub identity_token_leeway_secs: Option<u64>,
    pub identity_webhook_secret: Option<String>,
    pub identity_webhook_secret_file: Option<PathBuf>,
    pub identity_webhook_tolerance_secs: Option<u64>,
    pub identity_webhook_retention_days: Option<u32>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub cors_allowed_methods: Option<Vec<String>>,
    pub cors_allowed_headers: Option<Vec<String>>,
    pub cors_allow_credentials: Option<bool>,
    pub setup_token: Option<String>,
    pub dev_mode: Option<bool>,
    /// Variables that were set but could not be parsed.
    pub invalid_vars: Vec<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        let mut invalid = Vec::new();
        Self {
            config_path: path_var("ROSTER_CONFIG_PATH"),
            server_host: string_var("SERVER_HOST"),
            server_port: parse_var("SERVER_PORT", &mut invalid),
            database_url: string_var("DATABASE_URL"),
            database_url_file: path_var("DATABASE_URL_FILE"),
            database_host: string_var("DATABASE_HOST"),
            database_port: parse_var("DATABASE_PORT", &mut invalid),
            database_user: string_var("DATABASE_USER"),
            database_name: string_var("DATABASE_NAME"),
            database_password: string_var("DATABASE_PASSWORD"),
            database_password_file: path_var("DATABASE_PASSWORD_FILE"),
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                &mut invalid,
            ),

            identity_issuer: string_var("IDENTITY_ISSUER"),
            identity_authorized_parties: parse_csv_var("IDENTITY_AUTHORIZED_PARTIES"),
            identity_jwt_public_key: string_var("IDENTITY_JWT_PUBLIC_KEY"),
            identity_jwt_public_key_file: path_var("IDENTITY_JWT_PUBLIC_KEY_FILE"),
            identity_jwt_secret: string_var("IDENTITY_JWT_SECRET"),
            identity_token_leeway_secs: parse_var(
                "IDENTITY_TOKEN_LEEWAY_SECS",
                &mut invalid,
            ),
            identity_webhook_secret: string_var("IDENTITY_WEBHOOK_SECRET"),
            identity_webhook_secret_file: path_var("IDENTITY_WEBHOOK_SECRET_FILE"),
            identity_webhook_tolerance_secs: parse_var(
                "IDENTITY_WEBHOOK_TOLERANCE_SECS",
                &mut invalid,
            ),
            identity_webhook_retention_days: parse_var(
                "IDENTITY_WEBHOOK_RETENTION_DAYS",
                &mut invalid,
            ),

            cors_allowed_origins: parse_csv_var("CORS_ALLOWED_ORIGINS"),
            cors_allowed_methods: parse_csv_var("CORS_ALLOWED_METHODS"),
            cors_allowed_headers: parse_csv_var("CORS_ALLOWED_HEADERS"),
            cors_allow_credentials: parse_bool_var("CORS_ALLOW_CREDENTIALS", &mut invalid),

            setup_token: string_var("ROSTER_SETUP_TOKEN"),
            dev_mode: parse_bool_var("DEV_MODE", &mut invalid),
            invalid_vars: invalid,
        }
    }
}
