//! Book catalog service

use crate::{
    error::{AppError, AppResult, Entity},
    models::book::{Book, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        self.repository
            .books
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Book, id))
    }

    /// Add a title to the catalog; the id is chosen by the caller
    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        let book = self.repository.books.create(&Book::from(data)).await?;
        tracing::info!(book_id = %book.id, copies = book.copies, "Book added to catalog");
        Ok(book)
    }

    pub async fn update_book(&self, id: &str, data: UpdateBook) -> AppResult<Book> {
        self.repository
            .books
            .update(id, &data)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Book, id))
    }

    /// Remove a title. Books with loans or holds on record cannot be removed.
    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        if !self.repository.books.delete(id).await? {
            return Err(AppError::not_found(Entity::Book, id));
        }
        tracing::info!(book_id = %id, "Book removed from catalog");
        Ok(())
    }
}
