use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use moodbinge_api::api::{create_router, AppState};
use moodbinge_api::catalog::CatalogStore;
use moodbinge_api::config::Config;
use moodbinge_api::services::providers::tmdb::TmdbClient;
use moodbinge_api::services::RecommenderService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Catalog load failure is fatal; everything else degrades gracefully
    let catalog = Arc::new(CatalogStore::load(&config.data_path)?);
    let tmdb = Arc::new(TmdbClient::new(&config)?);
    if !tmdb.is_configured() {
        tracing::warn!("TMDB_API_KEY not set, responses carry placeholder metadata");
    }

    let service = Arc::new(RecommenderService::new(catalog, tmdb, &config));
    let app = create_router(AppState::new(service));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
