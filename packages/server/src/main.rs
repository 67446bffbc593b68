use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::filesystem::FilesystemMediaStore;
use tracing::{Level, info};

use server::config::AppConfig;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = server::database::init_db(&config.database.url, config.database.max_connections).await?;
    server::database::ensure_indexes(&db).await?;

    let storage = &config.storage;
    tokio::fs::create_dir_all(&storage.upload_dir).await?;
    let media = FilesystemMediaStore::new(
        storage.media_dir.clone(),
        storage.public_url.clone(),
        storage.max_upload_size,
    )
    .await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState {
        db,
        config,
        media: Arc::new(media),
    };
    let app = server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
