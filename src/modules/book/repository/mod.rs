//! Storage collaborator for books.
//!
//! The service talks to storage only through these two traits, so the same
//! logic runs against SQL and against the in-memory fake.

pub mod memory;
pub mod seaorm;

use async_trait::async_trait;
use thiserror::Error;

use super::models::Book;

pub use memory::InMemoryBookRepository;
pub use seaorm::SeaOrmBookRepository;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(String),
    #[error("no book with id {0} to delete")]
    DeleteTargetMissing(i64),
}

impl From<sea_orm::DbErr> for StorageError {
    fn from(err: sea_orm::DbErr) -> Self {
        StorageError::Db(err.to_string())
    }
}

/// Shared handle to book storage.
#[async_trait]
pub trait BookRepository: Send + Sync + 'static {
    type Transaction: BookTransaction;

    /// Open a unit of work. Writes made through it become visible to other
    /// callers only after [`BookTransaction::commit`].
    async fn begin(&self) -> Result<Self::Transaction, StorageError>;

    /// Every stored book, in storage order. Runs outside any transaction.
    async fn find_all(&self) -> Result<Vec<Book>, StorageError>;
}

/// A single unit of work against book storage.
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait BookTransaction: Send + Sync {
    /// Insert when `book.id` is `None`, otherwise overwrite the non-id
    /// columns of the existing row. Returns the stored row.
    async fn save(&mut self, book: Book) -> Result<Book, StorageError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StorageError>;

    /// Fails with [`StorageError::DeleteTargetMissing`] when no row matches.
    async fn delete_by_id(&mut self, id: i64) -> Result<(), StorageError>;

    async fn commit(self) -> Result<(), StorageError>;

    async fn rollback(self) -> Result<(), StorageError>;
}
