use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use biblio_kernel::{InitCtx, Module};

use crate::SharedStore;

/// Core module owning the store handle: verifies it on init, closes it on stop.
pub struct DbModule {
    store: SharedStore,
}

impl DbModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn into_module(self) -> Arc<dyn Module> {
        Arc::new(self)
    }
}

#[async_trait]
impl Module for DbModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.store
            .ping()
            .await
            .with_context(|| format!("{} store is not reachable", self.store.backend()))?;
        tracing::info!(
            module = self.name(),
            backend = self.store.backend(),
            "document store connected"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.store
            .close()
            .await
            .context("failed to close document store")?;
        tracing::info!(module = self.name(), "document store closed");
        Ok(())
    }
}
