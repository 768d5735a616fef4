//! Reservation (hold) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Stored hold record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Reservation {
    pub id: i32,
    pub book_id: String,
    pub student_id: String,
    pub reservation_date: DateTime<Utc>,
}

/// Hold with the book title and student name inlined
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetails {
    pub id: i32,
    pub book_id: String,
    pub book_title: String,
    pub student_id: String,
    pub student_name: String,
    pub reservation_date: DateTime<Utc>,
}

/// Place hold request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservation {
    #[validate(length(min = 1, message = "bookId is required"))]
    pub book_id: String,
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub book_id: String,
    pub student_id: String,
    pub reservation_date: DateTime<Utc>,
}
