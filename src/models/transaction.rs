//! Loan transaction model and related types

use chrono::{DateTime, Utc};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Stored loan record
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i32,
    pub book_id: String,
    pub student_id: String,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub fine_paid: Option<Decimal>,
}

/// Loan with the book title and student name inlined
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub id: i32,
    pub book_id: String,
    pub book_title: String,
    pub student_id: String,
    pub student_name: String,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub fine_paid: Option<Decimal>,
}

impl TransactionDetails {
    pub fn is_returned(&self) -> bool {
        self.return_date.is_some()
    }
}

/// Values for a loan about to be recorded
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub book_id: String,
    pub student_id: String,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Issue book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueBook {
    #[validate(length(min = 1, message = "bookId is required"))]
    pub book_id: String,
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
}

/// Return book request
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnBook {
    /// Fine collected at the desk; only numeric values are recorded
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub fine_paid: Option<serde_json::Value>,
    /// Reservation to remove now that a copy is back
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[schema(value_type = Option<i32>)]
    pub reservation_id_to_fulfill: Option<i32>,
}

impl ReturnBook {
    /// The submitted fine, when it is a JSON number. Numbers a decimal cannot hold are rejected.
    pub fn fine(&self) -> AppResult<Option<Decimal>> {
        let Some(amount) = self.fine_paid.as_ref().and_then(serde_json::Value::as_f64) else {
            return Ok(None);
        };
        Decimal::from_f64(amount)
            .map(|fine| Some(fine.normalize()))
            .ok_or_else(|| AppError::BadRequest(format!("finePaid {} is out of range", amount)))
    }
}

/// Advisory overdue fine for a loan
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FineQuote {
    pub transaction_id: i32,
    pub days_overdue: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub fine_per_day: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
}
