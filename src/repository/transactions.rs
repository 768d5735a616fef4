//! Loan transactions repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use super::constraint_conflict;
use crate::{
    error::AppResult,
    models::transaction::{NewTransaction, TransactionDetails},
};

/// Flattened loan columns; pair with `DETAILS_JOINS` over a row source aliased `t`
const DETAILS_COLUMNS: &str = r#"
    SELECT t.id, t.book_id, b.title AS book_title, t.student_id, s.name AS student_name,
           t.issue_date, t.due_date, t.return_date, t.fine_paid
"#;

const DETAILS_JOINS: &str = r#"
    JOIN books b ON b.id = t.book_id
    JOIN students s ON s.id = t.student_id
"#;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionsRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<TransactionDetails>>;
    async fn list_by_student(&self, student_id: &str) -> AppResult<Vec<TransactionDetails>>;
    /// Open loans whose due date is before `now`, oldest due first
    async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<TransactionDetails>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Option<TransactionDetails>>;
    async fn create(&self, data: &NewTransaction) -> AppResult<TransactionDetails>;
    /// Close an open loan. Returns None when the loan does not exist or already
    /// has a return date; the existing fine is kept when `fine` is None.
    async fn mark_returned(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
        fine: Option<Decimal>,
    ) -> AppResult<Option<TransactionDetails>>;
    async fn count_open(&self) -> AppResult<i64>;
    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgTransactionsRepository {
    pool: Pool<Postgres>,
}

impl PgTransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionsRepository for PgTransactionsRepository {
    async fn list(&self) -> AppResult<Vec<TransactionDetails>> {
        let query = format!("{} FROM transactions t {} ORDER BY t.id", DETAILS_COLUMNS, DETAILS_JOINS);
        let rows = sqlx::query_as::<_, TransactionDetails>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_by_student(&self, student_id: &str) -> AppResult<Vec<TransactionDetails>> {
        let query = format!(
            "{} FROM transactions t {} WHERE t.student_id = $1 ORDER BY t.issue_date DESC, t.id DESC",
            DETAILS_COLUMNS, DETAILS_JOINS
        );
        let rows = sqlx::query_as::<_, TransactionDetails>(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<TransactionDetails>> {
        let query = format!(
            "{} FROM transactions t {} WHERE t.return_date IS NULL AND t.due_date < $1 ORDER BY t.due_date, t.id",
            DETAILS_COLUMNS, DETAILS_JOINS
        );
        let rows = sqlx::query_as::<_, TransactionDetails>(&query)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<TransactionDetails>> {
        let query = format!("{} FROM transactions t {} WHERE t.id = $1", DETAILS_COLUMNS, DETAILS_JOINS);
        let row = sqlx::query_as::<_, TransactionDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create(&self, data: &NewTransaction) -> AppResult<TransactionDetails> {
        let query = format!(
            r#"
            WITH t AS (
                INSERT INTO transactions (book_id, student_id, issue_date, due_date)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            {} FROM t {}
            "#,
            DETAILS_COLUMNS, DETAILS_JOINS
        );
        sqlx::query_as::<_, TransactionDetails>(&query)
            .bind(&data.book_id)
            .bind(&data.student_id)
            .bind(data.issue_date)
            .bind(data.due_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| constraint_conflict(e, "Book or student no longer exists".to_string()))
    }

    async fn mark_returned(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
        fine: Option<Decimal>,
    ) -> AppResult<Option<TransactionDetails>> {
        let query = format!(
            r#"
            WITH t AS (
                UPDATE transactions
                SET return_date = $2, fine_paid = COALESCE($3, fine_paid)
                WHERE id = $1 AND return_date IS NULL
                RETURNING *
            )
            {} FROM t {}
            "#,
            DETAILS_COLUMNS, DETAILS_JOINS
        );
        let row = sqlx::query_as::<_, TransactionDetails>(&query)
            .bind(id)
            .bind(returned_at)
            .bind(fine)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn count_open(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE return_date IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE return_date IS NULL AND due_date < $1",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
