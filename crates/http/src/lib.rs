//! HTTP server facade for the catalog: Axum router, middleware stack, JSON envelopes.

use std::future::Future;

use anyhow::Context;
use axum::{extract::Request, http::HeaderValue, routing::get, Router};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::{Timestamp, Uuid};

use biblio_kernel::{settings::ServerSettings, ModuleRegistry};

pub mod error;
pub mod extract;
pub mod response;
pub mod router;
pub mod shutdown;

use router::RouterBuilder;

/// Start the HTTP server and serve until `shutdown` resolves
pub async fn start_server<F>(
    registry: &ModuleRegistry,
    settings: &ServerSettings,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(registry);

    let listener = tokio::net::TcpListener::bind(settings.bind_address())
        .await
        .with_context(|| format!("failed to bind to {}", settings.bind_address()))?;

    tracing::info!("HTTP server listening on http://{}", settings.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry) -> Router {
    let mut router_builder = RouterBuilder::new()
        .with_index(registry)
        .route("/healthz", get(health_check));

    for module in registry.modules() {
        let Some(module_router) = module.routes() else {
            continue;
        };
        let mount_path = module.mount_path();

        tracing::info!(
            module = module.name(),
            "mounting module routes under {}",
            mount_path
        );
        router_builder = router_builder.mount_module(&mount_path, module_router);
    }

    router_builder
        .with_openapi(registry)
        .with_fallback()
        .with_catch_panic()
        .with_cors()
        .with_tracing()
        .with_request_id()
        .build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Request ID generator for tracing
#[derive(Clone)]
pub(crate) struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}
