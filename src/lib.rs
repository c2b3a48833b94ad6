//! Book catalog service
//!
//! Wires the document store, the module registry and the HTTP server together.

use anyhow::Context;
use biblio_db::SharedStore;
use biblio_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub mod modules;

pub use modules::*;

/// Registry holding the `db` core module and the catalog modules.
pub fn build_registry(store: SharedStore) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store);
    registry
}

/// Open the store, boot every module, serve until a shutdown signal, then stop.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.redacted_uri(),
        "biblio-app bootstrap starting"
    );

    let store = biblio_db::connect(&settings.database)
        .await
        .context("failed to open document store")?;
    let registry = build_registry(store);
    let ctx = InitCtx {
        settings: &settings,
    };

    if let Err(e) = registry.boot(&ctx).await {
        if let Err(stop_err) = registry.shutdown().await {
            tracing::warn!(error = %format!("{:#}", stop_err), "cleanup after failed boot");
        }
        return Err(e.context("biblio-app bootstrap failed"));
    }

    tracing::info!("biblio-app bootstrap complete");

    let served = biblio_http::start_server(
        &registry,
        &settings.server,
        biblio_http::shutdown::signal(),
    )
    .await;

    registry
        .shutdown()
        .await
        .context("failed to stop modules")?;
    served
}
