pub mod entity;
pub mod handlers;
pub mod models;
pub mod store;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use bookstore_kernel::{InitCtx, Migration, Module};
use sea_orm::Schema;
use serde_json::json;

use handlers::SharedStore;

/// Books module: CRUD over the `books` table under `/book/`
pub struct BooksModule {
    store: SharedStore,
}

impl BooksModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

/// Router for the book endpoints, bound to `store`
pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route(
            "/book/",
            get(handlers::list_books).post(handlers::create_book),
        )
        .route(
            "/book/{book_id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .with_state(store)
}

/// `CREATE TABLE IF NOT EXISTS books`, derived from the entity definition
pub fn books_table_migration(schema: &Schema) -> Migration {
    let mut table = schema.create_table_from_entity(entity::Entity);
    table.if_not_exists();
    Migration {
        id: "001_create_books",
        table,
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self, schema: &Schema) -> Vec<Migration> {
        vec![books_table_migration(schema)]
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

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn request_body(schema: &str) -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let book_id = json!({
        "name": "book_id",
        "in": "path",
        "required": true,
        "description": "Positive integer identifier of the book",
        "schema": { "type": "integer", "format": "int32", "minimum": 1 }
    });

    json!({
        "paths": {
            "/book/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "Every book that has not been deleted",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": request_body("NewBook"),
                    "responses": {
                        "201": book_response("Created book with its assigned id"),
                        "400": error_response("Malformed request body or over-long field"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/book/{book_id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [book_id.clone()],
                    "responses": {
                        "200": book_response("The book"),
                        "400": error_response("Invalid book id"),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                },
                "put": {
                    "summary": "Update a book",
                    "description": "Fields that are absent or empty are left unchanged.",
                    "tags": ["Books"],
                    "parameters": [book_id.clone()],
                    "requestBody": request_body("BookChanges"),
                    "responses": {
                        "200": book_response("The updated book"),
                        "400": error_response("Invalid book id or request body"),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [book_id],
                    "responses": {
                        "200": book_response("The book as it was before deletion"),
                        "400": error_response("Invalid book id"),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int32" },
                        "name": { "type": "string", "maxLength": 100 },
                        "author": { "type": "string", "maxLength": 100 },
                        "publication": { "type": "string", "maxLength": 100 },
                        "created_at": { "type": "string", "format": "date-time" },
                        "updated_at": { "type": "string", "format": "date-time" },
                        "deleted_at": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "name", "author", "publication", "created_at", "updated_at"]
                },
                "NewBook": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "maxLength": 100 },
                        "author": { "type": "string", "maxLength": 100 },
                        "publication": { "type": "string", "maxLength": 100 }
                    }
                },
                "BookChanges": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "maxLength": 100 },
                        "author": { "type": "string", "maxLength": 100 },
                        "publication": { "type": "string", "maxLength": 100 }
                    }
                }
            }
        }
    })
}

/// Create a new instance of the books module over `store`
pub fn create_module(store: SharedStore) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
