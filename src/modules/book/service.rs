use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::error::BookError;
use super::models::Book;
use super::repository::{BookRepository, BookTransaction};

/// Token returned by a successful delete.
pub const DELETE_OK: &str = "ok";

/// Application service for the book catalogue.
///
/// Every multi-step operation runs in one transaction that is committed on
/// the success path only. Returning early with `?` drops the transaction,
/// which rolls it back.
pub struct BookService<R: BookRepository> {
    repo: Arc<R>,
}

impl<R: BookRepository> BookService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Persist a new book. Any caller-supplied id is ignored.
    #[instrument(skip(self, book), fields(title = %book.title))]
    pub async fn create(&self, book: Book) -> Result<Book, BookError> {
        validate(&book)?;

        let mut txn = self.repo.begin().await?;
        let created = txn.save(Book { id: None, ..book }).await?;
        txn.commit().await?;

        info!(id = ?created.id, "book created");
        Ok(created)
    }

    /// Fetch one book.
    ///
    /// Runs in a transaction so it observes a consistent row, but it does not
    /// stop rows inserted concurrently from showing up in later reads.
    #[instrument(skip(self))]
    pub async fn get_one(&self, id: i64) -> Result<Book, BookError> {
        let txn = self.repo.begin().await?;
        let book = txn.find_by_id(id).await?.ok_or(BookError::NotFound(id))?;
        txn.commit().await?;
        Ok(book)
    }

    /// Every book in storage order.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Book>, BookError> {
        let books = self.repo.find_all().await?;
        debug!(count = books.len(), "books listed");
        Ok(books)
    }

    /// Load, patch and write back a book in one transaction.
    ///
    /// Only title, rating and price change. The write-back happens exactly
    /// once, and the returned value is the row as written.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i64, patch: Book) -> Result<Book, BookError> {
        validate(&patch)?;

        let mut txn = self.repo.begin().await?;
        let mut book = txn.find_by_id(id).await?.ok_or(BookError::NotFound(id))?;
        book.apply(patch);
        let updated = txn.save(book).await?;
        txn.commit().await?;

        info!("book updated");
        Ok(updated)
    }

    /// Remove a book. A missing target is reported by storage as-is.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<&'static str, BookError> {
        let mut txn = self.repo.begin().await?;
        txn.delete_by_id(id).await?;
        txn.commit().await?;

        info!("book deleted");
        Ok(DELETE_OK)
    }
}

fn validate(book: &Book) -> Result<(), BookError> {
    if book.title.trim().is_empty() {
        return Err(BookError::Validation {
            field: "title",
            message: "must not be blank",
        });
    }
    if !book.rating.is_finite() {
        return Err(BookError::Validation {
            field: "rating",
            message: "must be a finite number",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::book::repository::{InMemoryBookRepository, StorageError};

    fn service() -> (BookService<InMemoryBookRepository>, InMemoryBookRepository) {
        let repo = InMemoryBookRepository::new();
        (BookService::new(Arc::new(repo.clone())), repo)
    }

    async fn seed(service: &BookService<InMemoryBookRepository>) -> Vec<Book> {
        let mut created = Vec::new();
        for book in [
            Book::new("Do it Android", 9.0, 14000),
            Book::new("Do it React", 8.0, 15000),
            Book::new("Do it Spring", 8.5, 13000),
        ] {
            created.push(service.create(book).await.unwrap());
        }
        created
    }

    #[tokio::test]
    async fn create_assigns_fresh_id_and_keeps_fields() {
        let (service, _) = service();
        let input = Book {
            id: Some(500),
            ..Book::new("Do it Android", 9.0, 14000)
        };

        let created = service.create(input).await.unwrap();

        assert_eq!(created.id, Some(1));
        assert_eq!(created.title, "Do it Android");
        assert_eq!(created.rating, 9.0);
        assert_eq!(created.price, 14000);

        let second = service.create(Book::new("Do it React", 8.0, 15000)).await.unwrap();
        assert_ne!(second.id, created.id);
    }

    #[tokio::test]
    async fn get_one_of_unknown_id_is_not_found() {
        let (service, _) = service();
        let err = service.get_one(1).await.unwrap_err();
        assert!(matches!(err, BookError::NotFound(1)));
    }

    #[tokio::test]
    async fn get_all_returns_every_book() {
        let (service, _) = service();
        let created = seed(&service).await;

        let all = service.get_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all, created);
    }

    #[tokio::test]
    async fn update_changes_fields_but_not_id() {
        let (service, _) = service();
        seed(&service).await;

        let patch = Book {
            id: Some(3),
            ..Book::new("Do it Flutter", 9.5, 20000)
        };
        let updated = service.update(1, patch).await.unwrap();

        assert_eq!(updated.id, Some(1));
        assert_eq!(updated.title, "Do it Flutter");
        assert_eq!(updated.rating, 9.5);
        assert_eq!(updated.price, 20000);
        assert_eq!(service.get_one(1).await.unwrap(), updated);
        assert_eq!(service.get_one(3).await.unwrap().title, "Do it Spring");
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let (service, _) = service();
        let err = service
            .update(9, Book::new("Do it Flutter", 9.5, 20000))
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::NotFound(9)));
        assert!(service.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_write_back_leaves_row_untouched() {
        let (service, repo) = service();
        let original = seed(&service).await.remove(0);

        repo.fail_writes(true);
        let err = service
            .update(1, Book::new("Do it Flutter", 9.5, 20000))
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::Storage(StorageError::Db(_))));

        repo.fail_writes(false);
        assert_eq!(service.get_one(1).await.unwrap(), original);
    }

    #[tokio::test]
    async fn delete_removes_book_and_returns_ok() {
        let (service, _) = service();
        seed(&service).await;

        assert_eq!(service.delete(1).await.unwrap(), "ok");
        assert!(matches!(service.get_one(1).await, Err(BookError::NotFound(1))));
        assert_eq!(service.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_propagates_storage_failure() {
        let (service, _) = service();
        let err = service.delete(1).await.unwrap_err();
        assert!(matches!(
            err,
            BookError::Storage(StorageError::DeleteTargetMissing(1))
        ));
    }

    #[tokio::test]
    async fn blank_title_is_rejected_before_storage() {
        let (service, repo) = service();
        repo.fail_writes(true);

        let err = service.create(Book::new("   ", 1.0, 1)).await.unwrap_err();
        assert!(matches!(err, BookError::Validation { field: "title", .. }));

        let err = service
            .create(Book::new("Do it Rust", f64::NAN, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::Validation { field: "rating", .. }));
    }
}
