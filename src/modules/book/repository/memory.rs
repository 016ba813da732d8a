use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{BookRepository, BookTransaction, StorageError};
use crate::modules::book::models::Book;

#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<i64, Book>,
    last_id: i64,
}

/// In-process book storage.
///
/// A transaction holds the table lock for its whole lifetime and works on a
/// private copy that is published only on commit, so transactions are
/// serialised and an uncommitted one leaves no trace.
#[derive(Clone, Default)]
pub struct InMemoryBookRepository {
    table: Arc<Mutex<Table>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` and `delete_by_id` fail with a storage error.
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }
}

pub struct InMemoryBookTransaction {
    guard: OwnedMutexGuard<Table>,
    staged: Table,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryBookTransaction {
    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Db("write rejected by in-memory store".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    type Transaction = InMemoryBookTransaction;

    async fn begin(&self) -> Result<Self::Transaction, StorageError> {
        let guard = Arc::clone(&self.table).lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryBookTransaction {
            guard,
            staged,
            fail_writes: Arc::clone(&self.fail_writes),
        })
    }

    async fn find_all(&self) -> Result<Vec<Book>, StorageError> {
        let table = self.table.lock().await;
        Ok(table.rows.values().cloned().collect())
    }
}

#[async_trait]
impl BookTransaction for InMemoryBookTransaction {
    async fn save(&mut self, mut book: Book) -> Result<Book, StorageError> {
        self.check_writable()?;

        let id = match book.id {
            Some(id) if self.staged.rows.contains_key(&id) => id,
            Some(id) => return Err(StorageError::Db(format!("no book with id {} to update", id))),
            None => {
                self.staged.last_id += 1;
                self.staged.last_id
            }
        };

        book.id = Some(id);
        self.staged.rows.insert(id, book.clone());
        Ok(book)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StorageError> {
        Ok(self.staged.rows.get(&id).cloned())
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<(), StorageError> {
        self.check_writable()?;

        match self.staged.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StorageError::DeleteTargetMissing(id)),
        }
    }

    async fn commit(mut self) -> Result<(), StorageError> {
        *self.guard = self.staged;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        Ok(())
    }
}
