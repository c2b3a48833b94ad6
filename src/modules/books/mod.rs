pub mod models;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use biblio_db::SharedStore;
use biblio_kernel::{Endpoint, InitCtx, Module};

/// Book catalog: CRUD over the `livres` collection
pub struct BooksModule {
    store: SharedStore,
}

impl BooksModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    fn mount_path(&self) -> String {
        "/books".to_string()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = self.store.backend(),
            collection = %ctx.settings.database.collection,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Option<Router> {
        Some(routes::router(self.store.clone()))
    }

    fn endpoints(&self) -> Vec<Endpoint> {
        vec![
            Endpoint {
                method: "POST",
                path: "",
                description: "Ajouter un livre",
            },
            Endpoint {
                method: "GET",
                path: "",
                description: "Lister tous les livres",
            },
            Endpoint {
                method: "GET",
                path: "/{id}",
                description: "Récupérer un livre par ID",
            },
            Endpoint {
                method: "PUT",
                path: "/{id}",
                description: "Modifier un livre",
            },
            Endpoint {
                method: "DELETE",
                path: "/{id}",
                description: "Supprimer un livre",
            },
        ]
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let book_envelope = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/BookEnvelope" }
                    }
                }
            })
        };
        let id_param = serde_json::json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string", "pattern": "^[0-9a-fA-F]{24}$" }
        }]);

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Ajouter un livre",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateLivre" }
                                }
                            }
                        },
                        "responses": {
                            "201": book_envelope("Livre ajouté"),
                            "400": error("Champ manquant ou invalide")
                        }
                    },
                    "get": {
                        "summary": "Lister tous les livres",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Livres, du plus récent au plus ancien",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookList" }
                                    }
                                }
                            },
                            "500": error("Erreur du stockage")
                        }
                    }
                },
                "/{id}": {
                    "parameters": id_param,
                    "get": {
                        "summary": "Récupérer un livre par ID",
                        "tags": ["Books"],
                        "responses": {
                            "200": book_envelope("Livre"),
                            "400": error("ID invalide"),
                            "404": error("Livre non trouvé"),
                            "500": error("Erreur du stockage")
                        }
                    },
                    "put": {
                        "summary": "Modifier un livre",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateLivre" }
                                }
                            }
                        },
                        "responses": {
                            "200": book_envelope("Livre modifié"),
                            "400": error("ID ou champ invalide"),
                            "404": error("Livre non trouvé"),
                            "500": error("Erreur du stockage")
                        }
                    },
                    "delete": {
                        "summary": "Supprimer un livre",
                        "tags": ["Books"],
                        "responses": {
                            "200": book_envelope("Dernier état du livre supprimé"),
                            "400": error("ID invalide"),
                            "404": error("Livre non trouvé"),
                            "500": error("Erreur du stockage")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Livre": {
                        "type": "object",
                        "properties": {
                            "_id": { "type": "string" },
                            "titre": { "type": "string" },
                            "auteur": { "type": "string" },
                            "date_publication": { "type": "string", "format": "date-time" },
                            "genre": { "type": "string" },
                            "disponible": { "type": "boolean" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": [
                            "_id", "titre", "auteur", "date_publication",
                            "genre", "disponible", "createdAt", "updatedAt"
                        ]
                    },
                    "CreateLivre": {
                        "type": "object",
                        "properties": {
                            "titre": { "type": "string" },
                            "auteur": { "type": "string" },
                            "date_publication": { "type": "string", "description": "YYYY-MM-DD or RFC 3339" },
                            "genre": { "type": "string" },
                            "disponible": { "type": "boolean", "default": true }
                        },
                        "required": ["titre", "auteur", "date_publication", "genre"]
                    },
                    "UpdateLivre": {
                        "type": "object",
                        "description": "Only the fields present are applied",
                        "properties": {
                            "titre": { "type": "string" },
                            "auteur": { "type": "string" },
                            "date_publication": { "type": "string" },
                            "genre": { "type": "string" },
                            "disponible": { "type": "boolean" }
                        }
                    },
                    "BookEnvelope": {
                        "type": "object",
                        "properties": {
                            "success": { "type": "boolean" },
                            "message": { "type": "string" },
                            "data": { "$ref": "#/components/schemas/Livre" }
                        },
                        "required": ["success", "data"]
                    },
                    "BookList": {
                        "type": "object",
                        "properties": {
                            "success": { "type": "boolean" },
                            "count": { "type": "integer" },
                            "data": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Livre" }
                            }
                        },
                        "required": ["success", "count", "data"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(store: SharedStore) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
