use std::fs;

use roster_config::{
    ConfigGuardRailError, ConfigLoadError, ConfigLoader, TokenKey,
    models::sources::EnvConfig,
};
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("roster.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn dev_env() -> EnvConfig {
    EnvConfig {
        dev_mode: Some(true),
        identity_jwt_secret: Some("dev-only-secret".into()),
        ..EnvConfig::default()
    }
}

#[test]
fn file_values_are_used_and_env_overrides_them() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        dev_mode = true

        [server]
        host = "127.0.0.1"
        port = 8080

        [database]
        url = "postgresql://roster@db/roster"
        max_connections = 4

        [identity]
        issuer = "https://identity.example.org"
        authorized_parties = ["https://app.example.org"]
        jwt_secret = "file-secret"
        webhook_retention_days = 7
        "#,
    );

    let env = EnvConfig {
        server_port: Some(9090),
        ..EnvConfig::default()
    };
    let load = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env)
        .unwrap();
    let config = load.config;

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9090);
    assert_eq!(
        config.database.url.as_deref(),
        Some("postgresql://roster@db/roster")
    );
    assert_eq!(config.database.max_connections, 4);
    assert_eq!(
        config.identity.issuer.as_deref(),
        Some("https://identity.example.org")
    );
    assert_eq!(
        config.identity.token_key,
        Some(TokenKey::Hs256Secret("file-secret".into()))
    );
    assert_eq!(config.identity.webhook_retention_days, 7);
    assert_eq!(config.identity.webhook_tolerance_secs, 300);
    assert_eq!(config.metadata.config_path.as_deref(), Some(path.as_path()));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = ConfigLoader::new()
        .with_config_path(dir.path().join("absent.toml"))
        .load_from(dev_env());
    assert!(matches!(result, Err(ConfigLoadError::MissingConfig { .. })));
}

#[test]
fn malformed_toml_reports_the_path() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server\nport = ");
    let result = ConfigLoader::new().with_config_path(&path).load_from(dev_env());
    match result {
        Err(ConfigLoadError::Parse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn public_key_file_takes_precedence_over_shared_secret() {
    let dir = TempDir::new().unwrap();
    let key_path = dir.path().join("identity.pem");
    fs::write(&key_path, "-----BEGIN PUBLIC KEY-----\nabc\n-----END PUBLIC KEY-----\n")
        .unwrap();
    let webhook_path = dir.path().join("webhook.secret");
    fs::write(&webhook_path, "whsec_c2VjcmV0\n").unwrap();
    let config_path = write_config(&dir, "");

    let env = EnvConfig {
        identity_jwt_public_key_file: Some(key_path),
        identity_jwt_secret: Some("ignored".into()),
        identity_webhook_secret_file: Some(webhook_path),
        setup_token: Some("setup".into()),
        identity_issuer: Some("https://identity.example.org".into()),
        ..EnvConfig::default()
    };
    let load = ConfigLoader::new()
        .with_config_path(&config_path)
        .load_from(env)
        .unwrap();

    assert!(matches!(
        load.config.identity.token_key,
        Some(TokenKey::Rs256Pem(ref pem)) if pem.ends_with("-----END PUBLIC KEY-----")
    ));
    assert_eq!(
        load.config.identity.webhook_secret.as_deref(),
        Some("whsec_c2VjcmV0")
    );
    assert!(!load.config.dev_mode);
    assert!(load.warnings.is_empty(), "{:?}", load.warnings);
}

#[test]
fn production_requires_token_key_and_webhook_secret() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let no_key = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(EnvConfig::default());
    assert!(matches!(
        no_key,
        Err(ConfigLoadError::GuardRail(ConfigGuardRailError::MissingTokenKey))
    ));

    let no_webhook = ConfigLoader::new().with_config_path(&path).load_from(EnvConfig {
        identity_jwt_secret: Some("shared".into()),
        ..EnvConfig::default()
    });
    assert!(matches!(
        no_webhook,
        Err(ConfigLoadError::GuardRail(
            ConfigGuardRailError::MissingWebhookSecret
        ))
    ));
}

#[test]
fn wildcard_cors_is_refused_outside_dev_mode() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    let env = EnvConfig {
        identity_jwt_secret: Some("shared".into()),
        identity_webhook_secret: Some("whsec_c2VjcmV0".into()),
        cors_allowed_origins: Some(vec!["*".into()]),
        ..EnvConfig::default()
    };

    let result = ConfigLoader::new().with_config_path(&path).load_from(env);
    assert!(matches!(
        result,
        Err(ConfigLoadError::GuardRail(
            ConfigGuardRailError::DangerousCorsWildcard
        ))
    ));
}

#[test]
fn shared_secret_outside_dev_mode_warns() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    let env = EnvConfig {
        identity_jwt_secret: Some("shared".into()),
        identity_webhook_secret: Some("whsec_c2VjcmV0".into()),
        ..EnvConfig::default()
    };

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env)
        .unwrap();
    assert!(
        load.warnings
            .iter()
            .any(|warning| warning.message.contains("HS256"))
    );
    assert!(
        load.warnings
            .iter()
            .any(|warning| warning.message.contains("ROSTER_SETUP_TOKEN"))
    );
}

#[test]
fn webhook_retention_is_bounded() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    for days in [0, 3651, u32::MAX] {
        let env = EnvConfig {
            identity_webhook_retention_days: Some(days),
            ..dev_env()
        };
        let result = ConfigLoader::new().with_config_path(&path).load_from(env);
        assert!(
            matches!(
                result,
                Err(ConfigLoadError::GuardRail(
                    ConfigGuardRailError::WebhookRetentionOutOfRange { days: d }
                )) if d == days
            ),
            "{days}: {result:?}"
        );
    }

    let env = EnvConfig {
        identity_webhook_retention_days: Some(3650),
        ..dev_env()
    };
    let load = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env)
        .unwrap();
    assert_eq!(load.config.identity.webhook_retention_days, 3650);
}

#[test]
fn unparsable_env_values_are_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    let env = EnvConfig {
        invalid_vars: vec![
            "SERVER_PORT".into(),
            "IDENTITY_WEBHOOK_RETENTION_DAYS".into(),
        ],
        ..dev_env()
    };

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env)
        .unwrap();
    assert_eq!(load.config.server.port, 3000);
    for name in ["SERVER_PORT", "IDENTITY_WEBHOOK_RETENTION_DAYS"] {
        assert!(
            load.warnings
                .iter()
                .any(|warning| warning.message.starts_with(name)),
            "{name} missing from {:?}",
            load.warnings
        );
    }
}
