//! Notifications repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::notification::{NewNotification, Notification, NotificationType},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationsRepository: Send + Sync {
    async fn create(&self, data: &NewNotification) -> AppResult<Notification>;
    /// Newest first
    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Notification>>;
    /// Unread only, newest first
    async fn list_unread_by_user(&self, user_id: &str) -> AppResult<Vec<Notification>>;
    async fn count_unread_by_user(&self, user_id: &str) -> AppResult<i64>;
    async fn mark_read(&self, id: i32) -> AppResult<Option<Notification>>;
    /// Flip every unread notification of the user in one step; returns how many changed
    async fn mark_all_read(&self, user_id: &str) -> AppResult<u64>;
    async fn delete(&self, id: i32) -> AppResult<bool>;
    async fn delete_by_user(&self, user_id: &str) -> AppResult<u64>;
    async fn exists_for_transaction(&self, transaction_id: i32, kind: NotificationType) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgNotificationsRepository {
    pool: Pool<Postgres>,
}

impl PgNotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationsRepository for PgNotificationsRepository {
    async fn create(&self, data: &NewNotification) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, message, type, is_read, created_at,
                                       related_book_id, related_transaction_id)
            VALUES ($1, $2, $3, FALSE, NOW(), $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.user_id)
        .bind(&data.message)
        .bind(data.kind.as_str())
        .bind(&data.related_book_id)
        .bind(data.related_transaction_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_unread_by_user(&self, user_id: &str) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_unread_by_user(&self, user_id: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_read(&self, id: i32) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_user(&self, user_id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn exists_for_transaction(&self, transaction_id: i32, kind: NotificationType) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM notifications WHERE related_transaction_id = $1 AND type = $2)",
        )
        .bind(transaction_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
