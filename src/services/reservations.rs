//! Reservation (hold) management service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult, Entity},
    models::reservation::{CreateReservation, NewReservation, ReservationDetails},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationService {
    repository: Repository,
}

impl ReservationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<ReservationDetails>> {
        self.repository.reservations.list().await
    }

    /// Holds on one book, oldest first
    pub async fn queue_for_book(&self, book_id: &str) -> AppResult<Vec<ReservationDetails>> {
        if self.repository.books.get_by_id(book_id).await?.is_none() {
            return Err(AppError::not_found(Entity::Book, book_id));
        }
        self.repository.reservations.list_by_book(book_id).await
    }

    /// Place a hold. The same student may hold the same book more than once.
    pub async fn create(&self, data: CreateReservation) -> AppResult<ReservationDetails> {
        if self.repository.books.get_by_id(&data.book_id).await?.is_none() {
            return Err(AppError::not_found(Entity::Book, &data.book_id));
        }
        if self.repository.students.get_by_id(&data.student_id).await?.is_none() {
            return Err(AppError::not_found(Entity::Student, &data.student_id));
        }

        let reservation = self
            .repository
            .reservations
            .create(&NewReservation {
                book_id: data.book_id,
                student_id: data.student_id,
                reservation_date: Utc::now(),
            })
            .await?;

        tracing::info!(
            reservation_id = reservation.id,
            book_id = %reservation.book_id,
            student_id = %reservation.student_id,
            "Reservation placed"
        );
        Ok(reservation)
    }

    /// Cancel a hold
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if !self.repository.reservations.delete(id).await? {
            return Err(AppError::not_found(Entity::Reservation, id));
        }
        tracing::info!(reservation_id = id, "Reservation cancelled");
        Ok(())
    }

    /// Remove the hold satisfied by a returned copy of `book_id`.
    ///
    /// Returns whether a reservation was removed; a missing one is not an error.
    pub async fn fulfill(&self, id: i32, book_id: &str) -> AppResult<bool> {
        let Some(reservation) = self.repository.reservations.get_by_id(id).await? else {
            tracing::debug!(reservation_id = id, "Reservation to fulfill no longer exists");
            return Ok(false);
        };

        if reservation.book_id != book_id {
            tracing::warn!(
                reservation_id = id,
                reserved_book = %reservation.book_id,
                returned_book = %book_id,
                "Fulfilling a reservation for a different book"
            );
        }

        let removed = self.repository.reservations.delete(id).await?;
        if removed {
            tracing::info!(
                reservation_id = id,
                student_id = %reservation.student_id,
                "Reservation fulfilled"
            );
        }
        Ok(removed)
    }
}
