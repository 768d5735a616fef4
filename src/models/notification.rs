//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

/// Event a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    BookIssued,
    BookReturned,
    BookOverdue,
    ReservationReady,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::BookIssued => "BOOK_ISSUED",
            NotificationType::BookReturned => "BOOK_RETURNED",
            NotificationType::BookOverdue => "BOOK_OVERDUE",
            NotificationType::ReservationReady => "RESERVATION_READY",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOOK_ISSUED" => Ok(NotificationType::BookIssued),
            "BOOK_RETURNED" => Ok(NotificationType::BookReturned),
            "BOOK_OVERDUE" => Ok(NotificationType::BookOverdue),
            "RESERVATION_READY" => Ok(NotificationType::ReservationReady),
            other => Err(format!("unknown notification type: {}", other)),
        }
    }
}

impl TryFrom<String> for NotificationType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// User-facing event record
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i32,
    /// Student (or librarian) id the notification is addressed to
    pub user_id: String,
    pub message: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub kind: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub related_book_id: Option<String>,
    pub related_transaction_id: Option<i32>,
}

/// Notification to append
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub related_book_id: Option<String>,
    pub related_transaction_id: Option<i32>,
}

/// Unread counter response
#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCount {
    pub count: i64,
}
