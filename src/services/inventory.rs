//! Inventory ledger: the available-copy count of each book

use crate::{
    error::{AppError, AppResult, Entity},
    repository::Repository,
};

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
}

impl InventoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Take one copy of a book off the shelf.
    ///
    /// The check and the decrement happen in one store operation, so callers
    /// racing for the last copy get exactly one success.
    pub async fn take_copy(&self, book_id: &str) -> AppResult<()> {
        if self.repository.books.decrement_copies(book_id).await? {
            Ok(())
        } else {
            Err(AppError::NoCopiesAvailable(book_id.to_string()))
        }
    }

    /// Put one copy back. There is no upper bound against an original stock count.
    pub async fn restore_copy(&self, book_id: &str) -> AppResult<()> {
        if self.repository.books.increment_copies(book_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found(Entity::Book, book_id))
        }
    }
}
