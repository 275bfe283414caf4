use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use artifact::{FilesystemProjectStore, GithubTagSource, VersionResolver};
use tracing::{Level, info};

use server::config::AppConfig;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let tags = GithubTagSource::new(
        &config.upstream.github_api_url,
        Duration::from_secs(config.upstream.timeout_secs),
        config.upstream.token.clone(),
    )
    .context("Failed to build GitHub client")?;
    let versions = VersionResolver::new(Arc::new(tags));

    let store = FilesystemProjectStore::new(config.storage.projects_dir.clone(), versions)
        .await
        .with_context(|| {
            format!(
                "Failed to open projects directory {}",
                config.storage.projects_dir.display()
            )
        })?;
    info!(root = %store.root().display(), "Project store ready");

    if config.auth.admin_token.is_none() {
        info!("No admin token configured; project management endpoints are disabled");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;

    let app = server::build_router(AppState::new(config, Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
