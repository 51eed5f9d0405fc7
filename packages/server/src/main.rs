use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use portal_server::config::AppConfig;
use portal_server::state::AppState;
use portal_server::{build_router, build_storage, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected and schema synced");

    seed::seed_roles(&db).await.context("Failed to seed roles")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;
    if let Some(admin) = &config.auth.bootstrap_admin {
        seed::ensure_bootstrap_admin(&db, admin)
            .await
            .context("Failed to create bootstrap admin")?;
    }

    let storage = build_storage(&config.storage)
        .await
        .context("Failed to initialize object storage")?;
    info!(backend = ?config.storage.backend, "Object storage ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config: Arc::new(config),
        storage,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
