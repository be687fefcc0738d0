pub mod db_url;
pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    models::{
        Config, ConfigMetadata, CorsConfig, DEFAULT_MAX_CONNECTIONS,
        DEFAULT_TOKEN_LEEWAY_SECS, DEFAULT_WEBHOOK_RETENTION_DAYS,
        DEFAULT_WEBHOOK_TOLERANCE_SECS, DatabaseConfig, IdentityConfig, ServerConfig,
        TokenKey,
        sources::{EnvConfig, FileConfig, FileIdentityConfig},
    },
    util::unescape_pem,
    validation::{self, ConfigWarnings},
};
use error::ConfigLoadError;

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["roster.toml", "config/roster.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env`, read the process environment and compose the config.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let mut load = self.load_from(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose the config from an already gathered environment.
    pub fn load_from(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, warnings) = compose_config(file_config, env, config_path)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let contents = fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "loaded configuration file");

        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if file_config.is_none() {
        warnings.push_with_hint(
            "No roster.toml detected; falling back to environment variables",
            "Create roster.toml or set ROSTER_CONFIG_PATH to keep settings in one place",
        );
    }

    for name in &env.invalid_vars {
        warnings.push_with_hint(
            format!("{name} has a value that could not be parsed; it was ignored"),
            "Fix or unset the variable so the file value or default is used deliberately",
        );
    }

    let FileConfig {
        server: file_server,
        database: file_database,
        identity: file_identity,
        cors: file_cors,
        setup_token: file_setup_token,
        dev_mode: file_dev_mode,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| "0.0.0.0".to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(3000),
    };

    let database = DatabaseConfig {
        url: db_url::resolve_database_url(&env, &file_database)?,
        max_connections: env
            .database_max_connections
            .or(file_database.max_connections)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
    };

    let identity = compose_identity(&env, file_identity)?;

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .clone()
            .or(file_cors.allowed_origins)
            .unwrap_or_else(default_cors_origins),
        allowed_methods: env
            .cors_allowed_methods
            .clone()
            .or(file_cors.allowed_methods)
            .unwrap_or_else(default_cors_methods),
        allowed_headers: env
            .cors_allowed_headers
            .clone()
            .or(file_cors.allowed_headers)
            .unwrap_or_else(default_cors_headers),
        allow_credentials: env
            .cors_allow_credentials
            .or(file_cors.allow_credentials)
            .unwrap_or(false),
    };

    let config = Config {
        server,
        database,
        identity,
        cors,
        setup_token: env
            .setup_token
            .clone()
            .or(file_setup_token)
            .filter(|token| !token.trim().is_empty()),
        dev_mode: env.dev_mode.or(file_dev_mode).unwrap_or(false),
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    };

    warnings.extend(validation::apply_guard_rails(&config)?);
    Ok((config, warnings))
}

fn compose_identity(
    env: &EnvConfig,
    file: FileIdentityConfig,
) -> Result<IdentityConfig, ConfigLoadError> {
    let public_key = match (
        env.identity_jwt_public_key.as_deref(),
        env.identity_jwt_public_key_file
            .as_ref()
            .or(file.jwt_public_key_file.as_ref()),
    ) {
        (Some(inline), _) => Some(unescape_pem(inline)),
        (None, Some(path)) => read_secret_file(path)?,
        (None, None) => None,
    };
    let token_key = match public_key {
        Some(pem) => Some(TokenKey::Rs256Pem(pem)),
        None => env
            .identity_jwt_secret
            .clone()
            .or(file.jwt_secret)
            .filter(|secret| !secret.trim().is_empty())
            .map(TokenKey::Hs256Secret),
    };

    let webhook_secret = match env.identity_webhook_secret.clone() {
        Some(secret) => Some(secret),
        None => match env.identity_webhook_secret_file.as_ref() {
            Some(path) => read_secret_file(path)?,
            None => file.webhook_secret.filter(|secret| !secret.trim().is_empty()),
        },
    };

    Ok(IdentityConfig {
        issuer: env
            .identity_issuer
            .clone()
            .or(file.issuer)
            .filter(|issuer| !issuer.trim().is_empty()),
        authorized_parties: env
            .identity_authorized_parties
            .clone()
            .or(file.authorized_parties)
            .unwrap_or_default(),
        token_key,
        token_leeway_secs: env
            .identity_token_leeway_secs
            .or(file.token_leeway_secs)
            .unwrap_or(DEFAULT_TOKEN_LEEWAY_SECS),
        webhook_secret,
        webhook_tolerance_secs: env
            .identity_webhook_tolerance_secs
            .or(file.webhook_tolerance_secs)
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECS),
        webhook_retention_days: env
            .identity_webhook_retention_days
            .or(file.webhook_retention_days)
            .unwrap_or(DEFAULT_WEBHOOK_RETENTION_DAYS),
    })
}

/// Read a secret from disk. Empty files count as unset.
pub(crate) fn read_secret_file(path: &Path) -> Result<Option<String>, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::SecretFileIo {
            path: path.to_path_buf(),
            source,
        })?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn default_cors_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_cors_headers() -> Vec<String> {
    vec!["Authorization".to_string(), "Content-Type".to_string()]
}
