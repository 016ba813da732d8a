pub mod entity;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use sea_orm::DatabaseConnection;

pub use error::BookError;
pub use models::Book;
pub use repository::{BookRepository, InMemoryBookRepository, SeaOrmBookRepository};
pub use service::BookService;

pub const MODULE_NAME: &str = "book";

/// Book catalogue module: CRUD over the `book` table
pub struct BookModule<R: BookRepository> {
    service: Arc<BookService<R>>,
}

impl<R: BookRepository> BookModule<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            service: Arc::new(BookService::new(repo)),
        }
    }

    pub fn service(&self) -> Arc<BookService<R>> {
        Arc::clone(&self.service)
    }
}

#[async_trait]
impl<R: BookRepository> Module for BookModule<R> {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "book module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi())
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module stopped");
        Ok(())
    }
}

/// Schema owned by the book module
pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS book (
                id     INTEGER PRIMARY KEY AUTOINCREMENT,
                title  TEXT    NOT NULL CHECK (title <> ''),
                rating REAL    NOT NULL,
                price  INTEGER NOT NULL
            );
            "#,
    }]
}

fn error_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn id_parameter() -> serde_json::Value {
    serde_json::json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn book_body() -> serde_json::Value {
    serde_json::json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookInput" }
            }
        }
    })
}

fn openapi() -> serde_json::Value {
    serde_json::json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "Every stored book",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("Storage failure")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_body(),
                    "responses": {
                        "201": book_response("Created book with its assigned id"),
                        "400": error_response("Malformed request"),
                        "422": error_response("Validation error"),
                        "500": error_response("Storage failure")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": book_response("The book"),
                        "400": error_response("Malformed id"),
                        "404": error_response("No book with this id")
                    }
                },
                "put": {
                    "summary": "Update title, rating and price of a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": book_body(),
                    "responses": {
                        "200": book_response("The updated book"),
                        "400": error_response("Malformed request"),
                        "404": error_response("No book with this id"),
                        "422": error_response("Validation error")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": {
                            "description": "Deleted",
                            "content": {
                                "text/plain": {
                                    "schema": { "type": "string", "example": "ok" }
                                }
                            }
                        },
                        "500": error_response("Storage failure, including a missing target")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Book module health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {
                                "text/plain": {
                                    "schema": { "type": "string" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "integer",
                            "format": "int64",
                            "description": "Storage-assigned identifier"
                        },
                        "title": { "type": "string", "description": "Title of the book" },
                        "rating": { "type": "number", "format": "double", "description": "Reader rating" },
                        "price": { "type": "integer", "format": "int32", "description": "Price" }
                    },
                    "required": ["id", "title", "rating", "price"]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "description": "Title of the book" },
                        "rating": { "type": "number", "format": "double", "description": "Reader rating" },
                        "price": { "type": "integer", "format": "int32", "description": "Price" }
                    },
                    "required": ["title", "rating", "price"]
                }
            }
        }
    })
}

/// Create the book module backed by the given database
pub fn create_module(db: DatabaseConnection) -> Arc<dyn Module> {
    Arc::new(BookModule::new(Arc::new(SeaOrmBookRepository::new(db))))
}
