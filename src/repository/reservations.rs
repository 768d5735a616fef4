//! Reservations repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::constraint_conflict;
use crate::{
    error::{AppError, AppResult},
    models::reservation::{NewReservation, Reservation, ReservationDetails},
};

const DETAILS_SELECT: &str = r#"
    SELECT r.id, r.book_id, b.title AS book_title, r.student_id, s.name AS student_name,
           r.reservation_date
    FROM reservations r
    JOIN books b ON b.id = r.book_id
    JOIN students s ON s.id = r.student_id
"#;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationsRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<ReservationDetails>>;
    /// Holds on one book, oldest first
    async fn list_by_book(&self, book_id: &str) -> AppResult<Vec<ReservationDetails>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Reservation>>;
    async fn create(&self, data: &NewReservation) -> AppResult<ReservationDetails>;
    /// Returns false when no such reservation exists
    async fn delete(&self, id: i32) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgReservationsRepository {
    pool: Pool<Postgres>,
}

impl PgReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn get_details(&self, id: i32) -> AppResult<Option<ReservationDetails>> {
        let query = format!("{} WHERE r.id = $1", DETAILS_SELECT);
        let row = sqlx::query_as::<_, ReservationDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl ReservationsRepository for PgReservationsRepository {
    async fn list(&self) -> AppResult<Vec<ReservationDetails>> {
        let query = format!("{} ORDER BY r.id", DETAILS_SELECT);
        let rows = sqlx::query_as::<_, ReservationDetails>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_by_book(&self, book_id: &str) -> AppResult<Vec<ReservationDetails>> {
        let query = format!(
            "{} WHERE r.book_id = $1 ORDER BY r.reservation_date, r.id",
            DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, ReservationDetails>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Reservation>> {
        let row = sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create(&self, data: &NewReservation) -> AppResult<ReservationDetails> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO reservations (book_id, student_id, reservation_date)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&data.book_id)
        .bind(&data.student_id)
        .bind(data.reservation_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| constraint_conflict(e, "Book or student no longer exists".to_string()))?;

        self.get_details(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Reservation {} missing after insert", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
