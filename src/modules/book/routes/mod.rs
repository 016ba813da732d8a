//! HTTP handlers for the book module.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::AppError;

use super::models::Book;
use super::repository::BookRepository;
use super::service::BookService;

type SharedService<R> = State<Arc<BookService<R>>>;

/// Routes mounted under the module's base path.
pub fn router<R: BookRepository>(service: Arc<BookService<R>>) -> Router {
    Router::new()
        .route("/", get(list_books::<R>).post(create_book::<R>))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book::<R>)
                .put(update_book::<R>)
                .delete(delete_book::<R>),
        )
        .with_state(service)
}

async fn health_check() -> &'static str {
    "book module is healthy"
}

async fn create_book<R: BookRepository>(
    State(service): SharedService<R>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(book) = payload?;
    let created = service.create(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_books<R: BookRepository>(
    State(service): SharedService<R>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(service.get_all().await?))
}

async fn get_book<R: BookRepository>(
    State(service): SharedService<R>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    Ok(Json(service.get_one(id).await?))
}

async fn update_book<R: BookRepository>(
    State(service): SharedService<R>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    Ok(Json(service.update(id, patch).await?))
}

async fn delete_book<R: BookRepository>(
    State(service): SharedService<R>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<&'static str, AppError> {
    let Path(id) = id?;
    Ok(service.delete(id).await?)
}
