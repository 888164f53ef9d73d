//! HTTP handlers for `/book/`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use bookstore_http::{AppError, JsonBody};

use super::models::{Book, BookChanges, NewBook};
use super::store::BookStore;

/// State shared by every book handler
pub type SharedStore = Arc<dyn BookStore>;

/// Parse a `{bookId}` path segment. Only positive integers name a book.
///
/// Positive ids beyond the key range are well formed but can never have been
/// assigned, so they are reported as missing rather than malformed.
pub fn parse_book_id(raw: &str) -> Result<i32, AppError> {
    let invalid = || {
        AppError::validation(
            vec![json!({"field": "bookId", "error": "must be a positive integer"})],
            format!("invalid book id '{raw}'"),
        )
    };

    let id = raw.parse::<i64>().map_err(|_| invalid())?;
    if id <= 0 {
        return Err(invalid());
    }
    i32::try_from(id).map_err(|_| AppError::not_found(format!("book {id} not found")))
}

pub async fn list_books(State(store): State<SharedStore>) -> Result<Json<Vec<Book>>, AppError> {
    let books = store.all().await?;
    Ok(Json(books))
}

pub async fn get_book(
    State(store): State<SharedStore>,
    Path(book_id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = parse_book_id(&book_id)?;
    let book = store.by_id(id).await?;
    Ok(Json(book))
}

pub async fn create_book(
    State(store): State<SharedStore>,
    JsonBody(payload): JsonBody<NewBook>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = store.create(payload).await?;
    tracing::info!(book_id = book.id, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

/// Partial update: fetch, merge the supplied non-empty fields, save.
pub async fn update_book(
    State(store): State<SharedStore>,
    Path(book_id): Path<String>,
    JsonBody(changes): JsonBody<BookChanges>,
) -> Result<Json<Book>, AppError> {
    let id = parse_book_id(&book_id)?;
    let mut book = store.by_id(id).await?;

    if !changes.apply_to(&mut book) {
        tracing::debug!(book_id = id, "update carries no changes");
    }

    let saved = store.save(&book).await?;
    tracing::info!(book_id = id, "book updated");
    Ok(Json(saved))
}

pub async fn delete_book(
    State(store): State<SharedStore>,
    Path(book_id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = parse_book_id(&book_id)?;
    let book = store.delete(id).await?;
    tracing::info!(book_id = id, "book deleted");
    Ok(Json(book))
}
