use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use coachcoin::config::{Cli, Config};
use coachcoin::db;
use coachcoin::routes;
use coachcoin::state::AppState;

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
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let db_path = config.db_path();
    tracing::info!("Database: {}", db_path.display());
    let pool = db::create_pool(&db_path, &config.database)?;
    db::run_migrations(&pool)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = routes::app(AppState::new(config, pool));

    // Start server
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("GraphQL playground at http://{}/graphql/playground", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
