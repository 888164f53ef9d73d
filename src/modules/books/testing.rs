//! Test fixtures shared by the books module tests.

use std::sync::Arc;

use async_trait::async_trait;
use bookstore_kernel::settings::DatabaseSettings;
use sea_orm::DbErr;
use tempfile::TempDir;

use super::models::{Book, NewBook};
use super::store::{BookStore, SeaOrmBookStore, StoreError};

/// Store over a fresh SQLite file with the books table created.
///
/// The directory must outlive the store.
pub async fn sqlite_store() -> (TempDir, Arc<SeaOrmBookStore>) {
    let dir = tempfile::tempdir().unwrap();
    let settings = DatabaseSettings::with_url(format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("books.db").display()
    ));
    let db = bookstore_db::connect(&settings).await.unwrap();

    let schema = bookstore_db::schema_for(&db);
    let migrations = vec![("books".to_string(), super::books_table_migration(&schema))];
    bookstore_db::auto_migrate(&db, &migrations).await.unwrap();

    (dir, Arc::new(SeaOrmBookStore::new(db)))
}

/// Store whose every call fails the way a lost connection does.
pub struct FailingStore;

impl FailingStore {
    fn failure() -> StoreError {
        StoreError::Database(DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "connection refused".to_string(),
        )))
    }
}

#[async_trait]
impl BookStore for FailingStore {
    async fn create(&self, _book: NewBook) -> Result<Book, StoreError> {
        Err(Self::failure())
    }

    async fn all(&self) -> Result<Vec<Book>, StoreError> {
        Err(Self::failure())
    }

    async fn by_id(&self, _id: i32) -> Result<Book, StoreError> {
        Err(Self::failure())
    }

    async fn save(&self, _book: &Book) -> Result<Book, StoreError> {
        Err(Self::failure())
    }

    async fn delete(&self, _id: i32) -> Result<Book, StoreError> {
        Err(Self::failure())
    }
}
