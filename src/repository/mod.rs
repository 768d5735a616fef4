//! Repository layer for database operations
//!
//! One trait per entity; the PostgreSQL implementations live next to their
//! trait, `memory` implements all of them over an in-process store.

pub mod books;
pub mod memory;
pub mod notifications;
pub mod reservations;
pub mod students;
pub mod transactions;

use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

pub use books::BooksRepository;
pub use notifications::NotificationsRepository;
pub use reservations::ReservationsRepository;
pub use students::StudentsRepository;
pub use transactions::TransactionsRepository;

use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};

/// Data access handles shared by all services
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BooksRepository>,
    pub students: Arc<dyn StudentsRepository>,
    pub transactions: Arc<dyn TransactionsRepository>,
    pub reservations: Arc<dyn ReservationsRepository>,
    pub notifications: Arc<dyn NotificationsRepository>,
}

impl Repository {
    /// Create a repository backed by the given PostgreSQL pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            students: Arc::new(students::PgStudentsRepository::new(pool.clone())),
            transactions: Arc::new(transactions::PgTransactionsRepository::new(pool.clone())),
            reservations: Arc::new(reservations::PgReservationsRepository::new(pool.clone())),
            notifications: Arc::new(notifications::PgNotificationsRepository::new(pool)),
        }
    }

    /// Create a repository over a fresh in-process store
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::new();
        Self {
            books: Arc::new(store.clone()),
            students: Arc::new(store.clone()),
            transactions: Arc::new(store.clone()),
            reservations: Arc::new(store.clone()),
            notifications: Arc::new(store),
        }
    }

    /// Open the store named by the configuration, running migrations for PostgreSQL
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        if config.is_in_memory() {
            tracing::warn!("Using the in-memory store, records are lost on shutdown");
            return Ok(Self::in_memory());
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;

        tracing::info!("Database migrations completed");

        Ok(Self::new(pool))
    }
}

/// Map unique and foreign-key violations to a conflict, anything else to a database error
pub(crate) fn constraint_conflict(err: sqlx::Error, message: String) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
            return AppError::Conflict(message);
        }
    }
    AppError::Database(err)
}

/// Raised when returning a copy would push the count past what an `INTEGER` holds
pub(crate) fn copy_limit(book_id: &str) -> AppError {
    AppError::Conflict(format!("Book {} has reached the copy limit", book_id))
}

/// Map an out-of-range copy count to a conflict, anything else to a database error
pub(crate) fn copy_overflow(err: sqlx::Error, book_id: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        // numeric_value_out_of_range
        if db_err.code().as_deref() == Some("22003") {
            return copy_limit(book_id);
        }
    }
    AppError::Database(err)
}
