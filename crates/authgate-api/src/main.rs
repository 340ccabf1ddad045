//! authgate API Server
//!
//! Usage:
//!   authgate [--config <path>] [--migrate]

use authgate_api::{create_router, openapi::OPENAPI_JSON_PATH, state::AppState};
use authgate_core::{migrate::migrate, AppConfig, LogFormat, LoggingConfig, PgCredentialStore};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "authgate")]
#[command(about = "Authentication and user profile API server")]
#[command(version)]
struct Args {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long, env = "AUTHGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Run embedded database migrations before serving
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };

    init_tracing(&config.logging);
    config.validate()?;

    let store = PgCredentialStore::connect(&config.database).await?;
    if args.migrate {
        tracing::info!("Running database migrations");
        migrate(store.pool()).await?;
    }

    let addr = config.bind_address();
    let state = Arc::new(AppState::new(config, Arc::new(store)));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("authgate listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/docs/", addr);
    tracing::info!("OpenAPI spec at http://{}{}", addr, OPENAPI_JSON_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", logging.level)));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
