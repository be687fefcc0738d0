//! # Roster Server
//!
//! Membership management API: agencies, their members, role-based access
//! and onboarding of identities issued by an external identity provider.
//!
//! Without a subcommand the binary serves HTTP. `roster-server db migrate`
//! applies migrations and `roster-server db check` verifies connectivity.

use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_config::{Config, ConfigLoad, ConfigLoader};
use roster_core::database::{PoolSettings, PostgresDatabase};
use roster_server::{AppState, create_app, infra::startup::spawn_background_tasks};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "roster-server")]
#[command(about = "Membership management API for agencies and their members")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to roster.toml (overrides ROSTER_CONFIG_PATH)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
    /// Verify the database is reachable and exit
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,roster_server=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_runtime_config(&cli.serve)?;

    match cli.command {
        Some(Command::Db(DbCommand::Migrate)) => {
            let db = connect(&config).await?;
            db.migrate().await.context("database migration failed")?;
            info!("Database migrations applied successfully");
            Ok(())
        }
        Some(Command::Db(DbCommand::Check)) => {
            let db = connect(&config).await?;
            db.ping().await.context("database check failed")?;
            info!("Database check passed");
            Ok(())
        }
        None => run_server(config).await,
    }
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config.clone() {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "configuration file loaded");
    }
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    Ok(config)
}

async fn connect(config: &Config) -> anyhow::Result<PostgresDatabase> {
    let Some(url) = config.database.url.as_deref() else {
        error!("DATABASE_URL or DATABASE_HOST/DATABASE_NAME must be provided");
        anyhow::bail!("No PostgreSQL connection configuration found");
    };

    let settings = PoolSettings {
        max_connections: config.database.max_connections,
        ..PoolSettings::default()
    };
    PostgresDatabase::connect(url, settings)
        .await
        .context("failed to connect to PostgreSQL")
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let db = connect(&config).await?;
    db.migrate().await.context("database migration failed")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    if config.dev_mode {
        warn!("DEV_MODE enabled: permissive CORS and relaxed configuration checks");
    }

    let state = AppState::new(db, config)?;
    let _purge = spawn_background_tasks(&state);
    let app = create_app(state);

    info!("Starting Roster server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Roster server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}
