//! Circulation endpoints: issue, return, fines and overdue notices

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::transaction::{FineQuote, IssueBook, ReturnBook, TransactionDetails},
};

use super::ValidatedJson;

/// Result of an overdue sweep
#[derive(Serialize, ToSchema)]
pub struct OverdueNoticesResponse {
    /// Notices appended by this sweep
    pub dispatched: u64,
}

/// List all loan transactions
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    responses(
        (status = 200, description = "All transactions", body = Vec<TransactionDetails>)
    )
)]
pub async fn list_transactions(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    let loans = state.services.circulation.list().await?;
    Ok(Json(loans))
}

/// Get a transaction by id
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction details", body = TransactionDetails),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn get_transaction(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<TransactionDetails>> {
    let loan = state.services.circulation.get(id).await?;
    Ok(Json(loan))
}

/// List a student's transactions
#[utoipa::path(
    get,
    path = "/transactions/student/{student_id}",
    tag = "transactions",
    params(
        ("student_id" = String, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "The student's transactions", body = Vec<TransactionDetails>),
        (status = 404, description = "Student not found")
    )
)]
pub async fn list_student_transactions(
    State(state): State<crate::AppState>,
    Path(student_id): Path<String>,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    let loans = state.services.circulation.list_for_student(&student_id).await?;
    Ok(Json(loans))
}

/// Issue a book to a student
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transactions",
    request_body = IssueBook,
    responses(
        (status = 200, description = "Book issued", body = TransactionDetails),
        (status = 400, description = "No copies available or invalid input"),
        (status = 404, description = "Book or student not found")
    )
)]
pub async fn issue_book(
    State(state): State<crate::AppState>,
    ValidatedJson(data): ValidatedJson<IssueBook>,
) -> AppResult<Json<TransactionDetails>> {
    let loan = state.services.circulation.issue_book(data).await?;
    Ok(Json(loan))
}

/// Return a book, optionally recording a fine and fulfilling a reservation
#[utoipa::path(
    put,
    path = "/transactions/{id}",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    request_body = ReturnBook,
    responses(
        (status = 200, description = "Book returned", body = TransactionDetails),
        (status = 400, description = "Already returned or invalid input"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    ValidatedJson(data): ValidatedJson<ReturnBook>,
) -> AppResult<Json<TransactionDetails>> {
    let loan = state.services.circulation.return_book(id, data).await?;
    Ok(Json(loan))
}

/// Quote the overdue fine of a transaction
#[utoipa::path(
    get,
    path = "/transactions/{id}/fine",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Fine quote", body = FineQuote),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn get_fine_quote(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<FineQuote>> {
    let quote = state.services.circulation.fine_quote(id).await?;
    Ok(Json(quote))
}

/// Notify borrowers of overdue books not yet reported
#[utoipa::path(
    post,
    path = "/transactions/overdue-notices",
    tag = "transactions",
    responses(
        (status = 200, description = "Notices dispatched", body = OverdueNoticesResponse)
    )
)]
pub async fn dispatch_overdue_notices(
    State(state): State<crate::AppState>,
) -> AppResult<Json<OverdueNoticesResponse>> {
    let dispatched = state.services.circulation.dispatch_overdue_notices().await?;
    Ok(Json(OverdueNoticesResponse { dispatched }))
}
