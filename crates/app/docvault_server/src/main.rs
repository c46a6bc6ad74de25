//! Docvault API server binary.
//!
//! Reads configuration from flags or the environment (a `.env` file is
//! honoured), prepares the store, and serves the REST API until Ctrl-C.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use docvault_api::config::{ApiConfig, Environment};
use docvault_core::store::Stores;
use tracing::{info, warn};

/// Which store backs the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// PostgreSQL at `--database-url`.
    Postgres,
    /// Process memory; everything is lost on exit.
    Memory,
}

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "docvault_server", about = "Docvault REST API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/docvault"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Token signing secret.
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// `production` hides error detail; `development` includes it.
    #[arg(long, env = "APP_ENV", default_value = "production")]
    environment: String,

    /// Directory holding uploaded documents.
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Store backend.
    #[arg(long, value_enum, default_value_t = StoreKind::Postgres)]
    store: StoreKind,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,docvault_api=debug,docvault_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let jwt_secret = match args.secret_key.filter(|s| !s.is_empty()) {
        Some(secret) => secret,
        None => docvault_api::config::resolve_jwt_secret()?,
    };
    let environment: Environment = args.environment.parse()?;

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        database_url: args.database_url,
        jwt_secret,
        environment,
        upload_dir: args.upload_dir,
    };

    info!(bind_addr = %config.bind_addr, %environment, store = ?args.store, "starting docvault_server");

    let stores = match args.store {
        StoreKind::Postgres => {
            let pool = docvault_core::db::connect(&config.database_url, args.max_connections).await?;
            info!("running database migrations");
            docvault_api::migrate(&pool).await?;
            Stores::postgres(pool)
        }
        StoreKind::Memory => {
            warn!("using in-memory store; data will not survive a restart");
            Stores::memory()
        }
    };

    let state = docvault_api::AppState::new(config.clone(), stores);
    state.uploads.ensure().await?;
    info!(upload_dir = %state.uploads.root().display(), "upload directory ready");

    let app = docvault_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
