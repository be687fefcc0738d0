use url::Url;

use super::{error::ConfigLoadError, read_secret_file};
use crate::models::sources::{EnvConfig, FileDatabaseConfig};

const DEFAULT_POSTGRES_PORT: u16 = 5432;

/// Pick the PostgreSQL URL, in order: `DATABASE_URL`, `DATABASE_URL_FILE`,
/// the config file's `database.url`, then a URL composed from
/// `DATABASE_HOST`/`DATABASE_USER`/`DATABASE_NAME`. A password from the
/// environment or a password file fills in URLs that lack one.
pub fn resolve_database_url(
    env: &EnvConfig,
    file_database: &FileDatabaseConfig,
) -> Result<Option<String>, ConfigLoadError> {
    if let Some(url) = env.database_url.clone() {
        return Ok(Some(url));
    }

    if let Some(path) = env.database_url_file.as_ref()
        && let Some(url) = read_secret_file(path)?
    {
        return Ok(Some(url));
    }

    if let Some(stored) = file_database.url.as_deref() {
        let trimmed = stored.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let mut parsed = Url::parse(trimmed)
            .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
        if parsed.password().is_none()
            && let Some(password) = resolve_database_password(env, file_database)?
        {
            parsed
                .set_password(Some(&password))
                .map_err(|_| ConfigLoadError::InvalidDatabasePassword)?;
        }
        return Ok(Some(parsed.to_string()));
    }

    let (Some(host), Some(user), Some(name)) = (
        env.database_host.as_deref(),
        env.database_user.as_deref(),
        env.database_name.as_deref(),
    ) else {
        return Ok(None);
    };

    let port = env.database_port.unwrap_or(DEFAULT_POSTGRES_PORT);
    let mut url = Url::parse(&format!("postgresql://{host}:{port}/{name}"))
        .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
    url.set_username(user)
        .map_err(|_| ConfigLoadError::InvalidDatabaseUsername {
            username: user.to_string(),
        })?;
    if let Some(password) = resolve_database_password(env, file_database)? {
        url.set_password(Some(&password))
            .map_err(|_| ConfigLoadError::InvalidDatabasePassword)?;
    }
    Ok(Some(url.to_string()))
}

fn resolve_database_password(
    env: &EnvConfig,
    file_database: &FileDatabaseConfig,
) -> Result<Option<String>, ConfigLoadError> {
    if let Some(password) = env.database_password.clone() {
        return Ok(Some(password));
    }

    for path in [
        env.database_password_file.as_ref(),
        file_database.password_file.as_ref(),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(secret) = read_secret_file(path)? {
            return Ok(Some(secret));
        }
    }

    Ok(None)
}
