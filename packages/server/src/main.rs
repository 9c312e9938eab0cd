use std::sync::Arc;
use std::time::Duration;

use tracing::{Level, info};

use server::banner::{BannerService, RevisionCache};
use server::config::AppConfig;
use server::state::AppState;
use server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database.url).await?;
    seed::ensure_indexes(&db).await?;

    // The one process-wide revision cache; injected into every request path.
    let cache = Arc::new(RevisionCache::new(Duration::from_secs(
        config.cache.ttl_secs,
    )));
    cache.spawn_sweeper(Duration::from_secs(config.cache.sweep_secs));

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        banners: BannerService::new(db.clone(), cache),
        db,
        config: Arc::new(config),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
