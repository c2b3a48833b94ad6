//! Router builder for the catalog HTTP server

use axum::{
    http::{header, HeaderName, Method},
    routing::{get, MethodRouter},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use biblio_kernel::ModuleRegistry;

use crate::error::{handle_panic, route_not_found};
use crate::MakeRequestUuid;

const INDEX_MESSAGE: &str = "API REST Bibliothèque";

/// Builder for constructing the main HTTP router
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Add a route; methods it does not serve fall through to "route not found"
    pub fn route(mut self, path: &str, route: MethodRouter) -> Self {
        self.router = self.router.route(path, route.fallback(route_not_found));
        self
    }

    /// Nest a module's router under `mount_path`
    pub fn mount_module(mut self, mount_path: &str, module_router: Router) -> Self {
        self.router = self.router.nest(mount_path, module_router);
        self
    }

    /// Serve the endpoint map of every registered module at `/`
    pub fn with_index(self, registry: &ModuleRegistry) -> Self {
        let index = index_document(registry);
        self.route("/", get(move || async move { Json(index.clone()) }))
    }

    /// JSON 404 for unmatched paths
    pub fn with_fallback(mut self) -> Self {
        self.router = self.router.fallback(route_not_found);
        self
    }

    /// Turn handler panics into a JSON 500
    pub fn with_catch_panic(mut self) -> Self {
        self.router = self.router.layer(CatchPanicLayer::custom(handle_panic));
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware: any origin, the catalog's methods and headers
    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::ORIGIN,
                    HeaderName::from_static("x-requested-with"),
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                ]),
        );
        self
    }

    /// Add request ID middleware, echoing the id on the response
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    /// Serve the OpenAPI document merged from every module at `/docs/openapi.json`
    pub fn with_openapi(self, registry: &ModuleRegistry) -> Self {
        let openapi_spec = openapi_document(registry);
        self.route(
            "/docs/openapi.json",
            get(move || async move { Json(openapi_spec.clone()) }),
        )
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn index_document(registry: &ModuleRegistry) -> serde_json::Value {
    let mut endpoints = serde_json::Map::new();
    for module in registry.modules() {
        let mount_path = module.mount_path();
        for endpoint in module.endpoints() {
            endpoints.insert(
                format!("{} {}{}", endpoint.method, mount_path, endpoint.path),
                serde_json::Value::String(endpoint.description.to_string()),
            );
        }
    }

    serde_json::json!({
        "message": INDEX_MESSAGE,
        "endpoints": endpoints,
    })
}

fn openapi_document(registry: &ModuleRegistry) -> serde_json::Value {
    let mut openapi_spec = serde_json::json!({
        "openapi": "3.0.0",
        "info": {
            "title": INDEX_MESSAGE,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": {},
        "components": {
            "schemas": {}
        }
    });

    openapi_spec["components"]["schemas"]["ErrorResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "success": { "type": "boolean", "enum": [false] },
            "message": { "type": "string" },
            "error": { "type": "string" },
            "details": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "field": { "type": "string" },
                        "error": { "type": "string" }
                    }
                }
            }
        },
        "required": ["success", "message"]
    });

    openapi_spec["paths"]["/healthz"] = serde_json::json!({
        "get": {
            "summary": "Health check",
            "responses": {
                "200": {
                    "description": "OK",
                    "content": { "text/plain": { "schema": { "type": "string" } } }
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(module_spec) = module.openapi() else {
            continue;
        };

        if let Some(paths) = module_spec.get("paths").and_then(|p| p.as_object()) {
            for (path, path_item) in paths {
                let prefixed_path = format!("{}{}", module.mount_path(), path);
                openapi_spec["paths"][prefixed_path] = path_item.clone();
            }
        }

        if let Some(schemas) = module_spec
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.as_object())
        {
            for (schema_name, schema_def) in schemas {
                openapi_spec["components"]["schemas"][schema_name] = schema_def.clone();
            }
        }
    }

    openapi_spec
}
