mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use corkboard_api::countdown::Countdown;
use corkboard_api::middleware::SessionKeys;
use corkboard_api::{AppState, AppStateInner, router};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "corkboard_server=debug,corkboard_api=debug,corkboard_db=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = corkboard_db::Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        sessions: SessionKeys::new(&config.session_secret, config.session_ttl),
        countdown: config.countdown_target.map(Countdown::new),
    });

    let app = router::build(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Corkboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
