//! Reservation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::reservation::{CreateReservation, ReservationDetails},
};

use super::ValidatedJson;

/// List all reservations
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    responses(
        (status = 200, description = "All reservations", body = Vec<ReservationDetails>)
    )
)]
pub async fn list_reservations(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.list().await?;
    Ok(Json(reservations))
}

/// Reservations waiting on a book, oldest first
#[utoipa::path(
    get,
    path = "/reservations/book/{book_id}",
    tag = "reservations",
    params(
        ("book_id" = String, Path, description = "Book ID (ISBN)")
    ),
    responses(
        (status = 200, description = "Reservation queue", body = Vec<ReservationDetails>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_book_reservations(
    State(state): State<crate::AppState>,
    Path(book_id): Path<String>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let queue = state.services.reservations.queue_for_book(&book_id).await?;
    Ok(Json(queue))
}

/// Place a reservation
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    request_body = CreateReservation,
    responses(
        (status = 200, description = "Reservation created", body = ReservationDetails),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book or student not found")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    ValidatedJson(data): ValidatedJson<CreateReservation>,
) -> AppResult<Json<ReservationDetails>> {
    let reservation = state.services.reservations.create(data).await?;
    Ok(Json(reservation))
}

/// Cancel a reservation
#[utoipa::path(
    delete,
    path = "/reservations/{id}",
    tag = "reservations",
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 204, description = "Reservation deleted"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn delete_reservation(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.reservations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
