use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use quorum_core::AppState;
use quorum_models::user::CurrentUser;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quorum=info,tower_http=debug"));
    if args.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = config::Config::load(&args.config)?;

    match args.command.unwrap_or(cli::Command::Serve) {
        cli::Command::MintToken { user_id, email } => mint_token(&config, user_id, email),
        cli::Command::Serve => serve(config).await,
    }
}

fn mint_token(config: &config::Config, user_id: String, email: Option<String>) -> Result<()> {
    let user = CurrentUser { id: user_id, email };
    let token = quorum_core::auth::create_token(
        &user,
        &config.auth.jwt_secret,
        config.auth.jwt_expiry_seconds,
        Utc::now(),
    )?;
    println!("{token}");
    Ok(())
}

async fn serve(config: config::Config) -> Result<()> {
    ensure_data_dir(&config.database.url);

    let db = quorum_db::create_pool(&config.database.url, config.database.max_connections).await?;
    quorum_db::run_migrations(&db).await?;

    let state = AppState::new(db, config.app_config());
    spawn_invalidation_logger(&state);

    let app = quorum_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!("quorum listening on {}", config.server.bind_address);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for shutdown signal: {e}");
            return;
        }
        tracing::info!("shutting down");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

/// Create the parent directory of a file-backed SQLite database.
fn ensure_data_dir(database_url: &str) {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return;
    };
    let file = rest.split('?').next().unwrap_or_default();
    if file.is_empty() || file.starts_with(":memory:") {
        return;
    }
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("could not create data directory {}: {e}", parent.display());
        }
    }
}

fn spawn_invalidation_logger(state: &AppState) {
    let mut rx = state.invalidations.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(inv) => tracing::debug!(
                    path = %inv.path,
                    user_id = inv.user_id.as_deref().unwrap_or("*"),
                    "view invalidated"
                ),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("invalidation logger lagged by {n} events")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
