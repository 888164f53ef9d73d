//! Persistence operations for books.

use async_trait::async_trait;
use bookstore_http::AppError;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr,
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde_json::json;
use thiserror::Error;

use super::entity::{ActiveModel, Column, Entity};
use super::models::{Book, NewBook};

/// Longest value, in characters, accepted for name, author and publication.
/// Matches the `varchar(100)` columns; SQLite does not enforce it itself.
pub const MAX_TEXT_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("book {0} not found")]
    NotFound(i32),

    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::not_found(format!("book {id} not found")),
            StoreError::TooLong { field, max } => AppError::validation(
                vec![json!({"field": field, "error": format!("must be at most {max} characters")})],
                format!("{field} exceeds {max} characters"),
            ),
            StoreError::Database(e) => {
                AppError::Internal(anyhow::Error::new(e).context("book store operation failed"))
            }
        }
    }
}

/// Book persistence seen by the request handlers.
///
/// Soft-deleted rows are invisible to every operation.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book; the store assigns the id and timestamps.
    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Every live book, in id order.
    async fn all(&self) -> Result<Vec<Book>, StoreError>;

    async fn by_id(&self, id: i32) -> Result<Book, StoreError>;

    /// Write name, author and publication of `book` back to its row.
    async fn save(&self, book: &Book) -> Result<Book, StoreError>;

    /// Soft-delete the book and return its state before deletion.
    async fn delete(&self, id: i32) -> Result<Book, StoreError>;
}

fn check_lengths(name: &str, author: &str, publication: &str) -> Result<(), StoreError> {
    for (field, value) in [("name", name), ("author", author), ("publication", publication)] {
        if value.chars().count() > MAX_TEXT_LEN {
            return Err(StoreError::TooLong {
                field,
                max: MAX_TEXT_LEN,
            });
        }
    }
    Ok(())
}

/// [`BookStore`] backed by a SeaORM connection pool.
#[derive(Clone)]
pub struct SeaOrmBookStore {
    db: DatabaseConnection,
}

impl SeaOrmBookStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookStore for SeaOrmBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        check_lengths(&book.name, &book.author, &book.publication)?;
        let now = Utc::now();
        let row = ActiveModel {
            id: NotSet,
            name: Set(book.name),
            author: Set(book.author),
            publication: Set(book.publication),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let created = row.insert(&self.db).await?;
        tracing::debug!(book_id = created.id, "book created");
        Ok(created)
    }

    async fn all(&self) -> Result<Vec<Book>, StoreError> {
        let books = Entity::find()
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(books)
    }

    async fn by_id(&self, id: i32) -> Result<Book, StoreError> {
        Entity::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn save(&self, book: &Book) -> Result<Book, StoreError> {
        check_lengths(&book.name, &book.author, &book.publication)?;
        let now = Utc::now();
        // Conditional on the row still being live, so a concurrent delete
        // cannot be undone by a stale update.
        let result = Entity::update_many()
            .col_expr(Column::Name, Expr::value(book.name.clone()))
            .col_expr(Column::Author, Expr::value(book.author.clone()))
            .col_expr(Column::Publication, Expr::value(book.publication.clone()))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(book.id))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(book.id));
        }

        tracing::debug!(book_id = book.id, "book saved");
        Ok(Book {
            updated_at: now,
            ..book.clone()
        })
    }

    async fn delete(&self, id: i32) -> Result<Book, StoreError> {
        let book = self.by_id(id).await?;

        let result = Entity::update_many()
            .col_expr(Column::DeletedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        // Someone else deleted it between the read and the write
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }

        tracing::debug!(book_id = id, "book deleted");
        Ok(book)
    }
}
