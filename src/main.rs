use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use waypost::auth::google::GoogleVerifier;
use waypost::auth::session;
use waypost::config::{Cli, Config};
use waypost::state::AppState;
use waypost::{app, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    if config.auth.google_client_id.is_empty() {
        tracing::warn!("No Google client id configured; logins will be rejected");
    }

    // Initialize database
    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    // Session signing key persists across restarts
    let session_secret = session::load_or_create_secret(&data_dir)?;

    let state = AppState {
        db: pool,
        verifier: Arc::new(GoogleVerifier::new(config.auth.google_client_id.clone())),
        session_secret: Arc::new(session_secret),
        config,
    };

    let addr: SocketAddr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    )
    .parse()?;
    let router = app(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
