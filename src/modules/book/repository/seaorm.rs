use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Unchanged, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryOrder, Set, TransactionTrait,
};

use super::{BookRepository, BookTransaction, StorageError};
use crate::modules::book::{entity, models::Book};

/// SeaORM-backed repository implementation.
#[derive(Clone)]
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Wraps a SeaORM transaction, which rolls back when dropped uncommitted.
pub struct SeaOrmBookTransaction {
    txn: DatabaseTransaction,
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    type Transaction = SeaOrmBookTransaction;

    async fn begin(&self) -> Result<Self::Transaction, StorageError> {
        let txn = self.db.begin().await?;
        Ok(SeaOrmBookTransaction { txn })
    }

    async fn find_all(&self) -> Result<Vec<Book>, StorageError> {
        let rows = entity::Entity::find()
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }
}

#[async_trait]
impl BookTransaction for SeaOrmBookTransaction {
    async fn save(&mut self, book: Book) -> Result<Book, StorageError> {
        let am = entity::ActiveModel {
            id: match book.id {
                Some(id) => Unchanged(id),
                None => NotSet,
            },
            title: Set(book.title),
            rating: Set(book.rating),
            price: Set(book.price),
        };

        let stored = match book.id {
            Some(_) => am.update(&self.txn).await?,
            None => am.insert(&self.txn).await?,
        };
        Ok(stored.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StorageError> {
        let row = entity::Entity::find_by_id(id).one(&self.txn).await?;
        Ok(row.map(Book::from))
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<(), StorageError> {
        let res = entity::Entity::delete_by_id(id).exec(&self.txn).await?;
        if res.rows_affected == 0 {
            return Err(StorageError::DeleteTargetMissing(id));
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        self.txn.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::book;
    use bookshelf_kernel::settings::DatabaseSettings;

    async fn repository() -> SeaOrmBookRepository {
        let db = bookshelf_db::connect(&DatabaseSettings::in_memory())
            .await
            .unwrap();
        let migrations: Vec<_> = book::migrations()
            .into_iter()
            .map(|m| (book::MODULE_NAME.to_string(), m))
            .collect();
        bookshelf_db::run_migrations(&db, &migrations).await.unwrap();
        SeaOrmBookRepository::new(db)
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let repo = repository().await;
        let mut txn = repo.begin().await.unwrap();
        let first = txn.save(Book::new("Do it Android", 9.0, 14000)).await.unwrap();
        let second = txn.save(Book::new("Do it React", 8.0, 15000)).await.unwrap();
        txn.commit().await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(repo.find_all().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let repo = repository().await;
        {
            let mut txn = repo.begin().await.unwrap();
            txn.save(Book::new("Do it Spring", 8.5, 13000)).await.unwrap();
        }
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn explicit_rollback_discards_update() {
        let repo = repository().await;
        let mut txn = repo.begin().await.unwrap();
        let stored = txn.save(Book::new("Do it Android", 9.0, 14000)).await.unwrap();
        txn.commit().await.unwrap();

        let mut txn = repo.begin().await.unwrap();
        let mut changed = stored.clone();
        changed.title = "Do it Flutter".to_string();
        txn.save(changed).await.unwrap();
        txn.rollback().await.unwrap();

        assert_eq!(repo.find_all().await.unwrap(), vec![stored]);
    }

    #[tokio::test]
    async fn delete_missing_row_fails() {
        let repo = repository().await;
        let mut txn = repo.begin().await.unwrap();
        let err = txn.delete_by_id(42).await.unwrap_err();
        assert!(matches!(err, StorageError::DeleteTargetMissing(42)));
    }

    #[tokio::test]
    async fn update_of_missing_row_fails() {
        let repo = repository().await;
        let mut txn = repo.begin().await.unwrap();
        let ghost = Book {
            id: Some(7),
            ..Book::new("ghost", 1.0, 1)
        };
        assert!(matches!(txn.save(ghost).await, Err(StorageError::Db(_))));
    }
}
