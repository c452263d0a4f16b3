// BCC Dashboard - Web Server

use anyhow::{Context, Result};
use bcc_dashboard::routes::{self, AppState};
use bcc_dashboard::{logging, AppConfig, Page, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let store = RecordStore::open(&config).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    tracing::info!(
        database = %config.database_path.display(),
        media = %store.blobs().upload_dir().display(),
        "storage ready"
    );

    let bind_addr = config.bind_addr.clone();
    let upload_path = config.path_for(Page::Upload).unwrap_or(Page::Upload.default_path()).to_string();

    let state = AppState::new(store, config);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    tracing::info!(addr = %bind_addr, upload = %upload_path, "server listening");
    println!("🚀 Server running on http://{}", bind_addr);

    axum::serve(listener, app)
        .await
        .context("Server terminated")?;

    Ok(())
}
