//! Elidune Catalog - startup check of the durable catalog
//!
//! Loads every dataset, verifies the catalog invariants and reports what the
//! catalog holds. Indices rebuilt during the load are written back.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use elidune_catalog::{
    config::AppConfig,
    repository::{FileStore, Repository},
    SharedCatalog,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_directive().into());

    if config.json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Elidune Catalog v{}", env!("CARGO_PKG_VERSION"));

    let store = FileStore::open(&config.storage.data_dir, config.storage.pretty).await?;
    tracing::info!("Using datasets in {}", store.root().display());

    let shared = SharedCatalog::load(Repository::new(Arc::new(store))).await?;
    let mut catalog = shared.lock().await;
    if !catalog.is_trusted() {
        tracing::info!("Writing rebuilt indices back");
        catalog.persist_all().await?;
    }
    catalog.verify()?;

    let stats = catalog.stats();
    tracing::info!(
        "Catalog ok: {} books, {} copies ({} available), {} outstanding loans",
        stats.books,
        stats.copies,
        stats.available,
        stats.loans
    );

    Ok(())
}
