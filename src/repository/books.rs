//! Books repository: catalog records and the copy counter

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{constraint_conflict, copy_overflow};
use crate::{
    error::AppResult,
    models::book::{Book, UpdateBook},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Book>>;
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Book>>;
    async fn create(&self, book: &Book) -> AppResult<Book>;
    async fn update(&self, id: &str, data: &UpdateBook) -> AppResult<Option<Book>>;
    /// Returns false when no such book exists
    async fn delete(&self, id: &str) -> AppResult<bool>;
    /// Take one copy off the shelf if at least one is left.
    /// Returns false, without writing, when the count is already zero or the book is gone.
    async fn decrement_copies(&self, id: &str) -> AppResult<bool>;
    /// Put one copy back. Returns false when no such book exists.
    async fn increment_copies(&self, id: &str) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
    async fn total_copies(&self) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn create(&self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, genre, copies, image_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.copies)
        .bind(&book.image_path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| constraint_conflict(e, format!("Book {} already exists", book.id)))
    }

    async fn update(&self, id: &str, data: &UpdateBook) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, author = $3, genre = $4, copies = $5,
                image_path = COALESCE($6, image_path)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.genre)
        .bind(data.copies)
        .bind(&data.image_path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                constraint_conflict(e, format!("Book {} is referenced by loans or reservations", id))
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn decrement_copies(&self, id: &str) -> AppResult<bool> {
        // Check and decrement in one statement so the count never drops below zero
        let result = sqlx::query("UPDATE books SET copies = copies - 1 WHERE id = $1 AND copies > 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn increment_copies(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE books SET copies = copies + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| copy_overflow(e, id))?;
        Ok(result.rows_affected() == 1)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn total_copies(&self) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(copies), 0)::bigint FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
