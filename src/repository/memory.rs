//! In-process store implementing every repository trait.
//!
//! Selected with `database.url = "memory://"`. All records live behind one
//! lock, so each trait method is atomic with respect to the others, the same
//! guarantee the single-statement PostgreSQL queries give.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{
    copy_limit, BooksRepository, NotificationsRepository, ReservationsRepository, StudentsRepository,
    TransactionsRepository,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, UpdateBook},
        notification::{NewNotification, Notification, NotificationType},
        reservation::{NewReservation, Reservation, ReservationDetails},
        student::Student,
        transaction::{NewTransaction, Transaction, TransactionDetails},
    },
};

#[derive(Default)]
struct State {
    books: BTreeMap<String, Book>,
    students: BTreeMap<String, Student>,
    transactions: BTreeMap<i32, Transaction>,
    reservations: BTreeMap<i32, Reservation>,
    notifications: BTreeMap<i32, Notification>,
    last_transaction_id: i32,
    last_reservation_id: i32,
    last_notification_id: i32,
}

impl State {
    /// Mirrors the inner join of the SQL backend: loans with a dangling reference are skipped
    fn transaction_details(&self, t: &Transaction) -> Option<TransactionDetails> {
        let book = self.books.get(&t.book_id)?;
        let student = self.students.get(&t.student_id)?;
        Some(TransactionDetails {
            id: t.id,
            book_id: book.id.clone(),
            book_title: book.title.clone(),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            issue_date: t.issue_date,
            due_date: t.due_date,
            return_date: t.return_date,
            fine_paid: t.fine_paid,
        })
    }

    fn reservation_details(&self, r: &Reservation) -> Option<ReservationDetails> {
        let book = self.books.get(&r.book_id)?;
        let student = self.students.get(&r.student_id)?;
        Some(ReservationDetails {
            id: r.id,
            book_id: book.id.clone(),
            book_title: book.title.clone(),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            reservation_date: r.reservation_date,
        })
    }

    fn book_is_referenced(&self, book_id: &str) -> bool {
        self.transactions.values().any(|t| t.book_id == book_id)
            || self.reservations.values().any(|r| r.book_id == book_id)
    }

    fn student_is_referenced(&self, student_id: &str) -> bool {
        self.transactions.values().any(|t| t.student_id == student_id)
            || self.reservations.values().any(|r| r.student_id == student_id)
    }

    fn email_taken(&self, email: &str, except_id: Option<&str>) -> bool {
        self.students
            .values()
            .any(|s| s.email.eq_ignore_ascii_case(email) && Some(s.id.as_str()) != except_id)
    }

    fn require_book_and_student(&self, book_id: &str, student_id: &str) -> AppResult<()> {
        if self.books.contains_key(book_id) && self.students.contains_key(student_id) {
            Ok(())
        } else {
            Err(AppError::Conflict("Book or student no longer exists".to_string()))
        }
    }

    /// Newest first, ties broken by id like the SQL ordering
    fn sorted_newest_first(mut rows: Vec<Notification>) -> Vec<Notification> {
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows
    }
}

/// Shared handle; clones see the same records
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BooksRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let state = self.state.read().await;
        Ok(state.books.values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<Book>> {
        let state = self.state.read().await;
        Ok(state.books.get(id).cloned())
    }

    async fn create(&self, book: &Book) -> AppResult<Book> {
        let mut state = self.state.write().await;
        if state.books.contains_key(&book.id) {
            return Err(AppError::Conflict(format!("Book {} already exists", book.id)));
        }
        state.books.insert(book.id.clone(), book.clone());
        Ok(book.clone())
    }

    async fn update(&self, id: &str, data: &UpdateBook) -> AppResult<Option<Book>> {
        let mut state = self.state.write().await;
        let Some(book) = state.books.get_mut(id) else {
            return Ok(None);
        };
        book.title = data.title.clone();
        book.author = data.author.clone();
        book.genre = data.genre.clone();
        book.copies = data.copies;
        if let Some(ref image_path) = data.image_path {
            book.image_path = Some(image_path.clone());
        }
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.books.contains_key(id) {
            return Ok(false);
        }
        if state.book_is_referenced(id) {
            return Err(AppError::Conflict(format!(
                "Book {} is referenced by loans or reservations",
                id
            )));
        }
        state.books.remove(id);
        Ok(true)
    }

    async fn decrement_copies(&self, id: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.books.get_mut(id) {
            Some(book) if book.copies > 0 => {
                book.copies -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_copies(&self, id: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.books.get_mut(id) {
            Some(book) => {
                book.copies = book
                    .copies
                    .checked_add(1)
                    .ok_or_else(|| copy_limit(id))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.books.len() as i64)
    }

    async fn total_copies(&self) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.books.values().map(|b| b.copies as i64).sum())
    }
}

#[async_trait]
impl StudentsRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Student>> {
        let state = self.state.read().await;
        Ok(state.students.values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<Student>> {
        let state = self.state.read().await;
        Ok(state.students.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Student>> {
        let state = self.state.read().await;
        Ok(state
            .students
            .values()
            .find(|s| s.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, student: &Student) -> AppResult<Student> {
        let mut state = self.state.write().await;
        if state.students.contains_key(&student.id) || state.email_taken(&student.email, None) {
            return Err(AppError::Conflict(format!(
                "Student {} or email {} already exists",
                student.id, student.email
            )));
        }
        state.students.insert(student.id.clone(), student.clone());
        Ok(student.clone())
    }

    async fn update(&self, student: &Student) -> AppResult<Option<Student>> {
        let mut state = self.state.write().await;
        if !state.students.contains_key(&student.id) {
            return Ok(None);
        }
        if state.email_taken(&student.email, Some(student.id.as_str())) {
            return Err(AppError::Conflict(format!(
                "Email {} already in use",
                student.email
            )));
        }
        state.students.insert(student.id.clone(), student.clone());
        Ok(Some(student.clone()))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.students.contains_key(id) {
            return Ok(false);
        }
        if state.student_is_referenced(id) {
            return Err(AppError::Conflict(format!(
                "Student {} is referenced by loans or reservations",
                id
            )));
        }
        state.students.remove(id);
        Ok(true)
    }

    async fn count(&self) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.students.len() as i64)
    }
}

#[async_trait]
impl TransactionsRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<TransactionDetails>> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .values()
            .filter_map(|t| state.transaction_details(t))
            .collect())
    }

    async fn list_by_student(&self, student_id: &str) -> AppResult<Vec<TransactionDetails>> {
        let state = self.state.read().await;
        let mut rows: Vec<TransactionDetails> = state
            .transactions
            .values()
            .filter(|t| t.student_id == student_id)
            .filter_map(|t| state.transaction_details(t))
            .collect();
        rows.sort_by(|a, b| (b.issue_date, b.id).cmp(&(a.issue_date, a.id)));
        Ok(rows)
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<TransactionDetails>> {
        let state = self.state.read().await;
        let mut rows: Vec<TransactionDetails> = state
            .transactions
            .values()
            .filter(|t| t.return_date.is_none() && t.due_date < now)
            .filter_map(|t| state.transaction_details(t))
            .collect();
        rows.sort_by(|a, b| (a.due_date, a.id).cmp(&(b.due_date, b.id)));
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<TransactionDetails>> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .get(&id)
            .and_then(|t| state.transaction_details(t)))
    }

    async fn create(&self, data: &NewTransaction) -> AppResult<TransactionDetails> {
        let mut state = self.state.write().await;
        state.require_book_and_student(&data.book_id, &data.student_id)?;

        state.last_transaction_id += 1;
        let transaction = Transaction {
            id: state.last_transaction_id,
            book_id: data.book_id.clone(),
            student_id: data.student_id.clone(),
            issue_date: data.issue_date,
            due_date: data.due_date,
            return_date: None,
            fine_paid: None,
        };
        let details = state
            .transaction_details(&transaction)
            .ok_or_else(|| AppError::Internal("loan references vanished".to_string()))?;
        state.transactions.insert(transaction.id, transaction);
        Ok(details)
    }

    async fn mark_returned(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
        fine: Option<Decimal>,
    ) -> AppResult<Option<TransactionDetails>> {
        let mut state = self.state.write().await;
        let Some(transaction) = state.transactions.get_mut(&id) else {
            return Ok(None);
        };
        if transaction.return_date.is_some() {
            return Ok(None);
        }
        transaction.return_date = Some(returned_at);
        if fine.is_some() {
            transaction.fine_paid = fine;
        }
        let transaction = transaction.clone();
        Ok(state.transaction_details(&transaction))
    }

    async fn count_open(&self) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .values()
            .filter(|t| t.return_date.is_none())
            .count() as i64)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .values()
            .filter(|t| t.return_date.is_none() && t.due_date < now)
            .count() as i64)
    }
}

#[async_trait]
impl ReservationsRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<ReservationDetails>> {
        let state = self.state.read().await;
        Ok(state
            .reservations
            .values()
            .filter_map(|r| state.reservation_details(r))
            .collect())
    }

    async fn list_by_book(&self, book_id: &str) -> AppResult<Vec<ReservationDetails>> {
        let state = self.state.read().await;
        let mut rows: Vec<ReservationDetails> = state
            .reservations
            .values()
            .filter(|r| r.book_id == book_id)
            .filter_map(|r| state.reservation_details(r))
            .collect();
        rows.sort_by(|a, b| (a.reservation_date, a.id).cmp(&(b.reservation_date, b.id)));
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Reservation>> {
        let state = self.state.read().await;
        Ok(state.reservations.get(&id).cloned())
    }

    async fn create(&self, data: &NewReservation) -> AppResult<ReservationDetails> {
        let mut state = self.state.write().await;
        state.require_book_and_student(&data.book_id, &data.student_id)?;

        state.last_reservation_id += 1;
        let reservation = Reservation {
            id: state.last_reservation_id,
            book_id: data.book_id.clone(),
            student_id: data.student_id.clone(),
            reservation_date: data.reservation_date,
        };
        let details = state
            .reservation_details(&reservation)
            .ok_or_else(|| AppError::Internal("reservation references vanished".to_string()))?;
        state.reservations.insert(reservation.id, reservation);
        Ok(details)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.reservations.remove(&id).is_some())
    }

    async fn count(&self) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.reservations.len() as i64)
    }
}

#[async_trait]
impl NotificationsRepository for MemoryStore {
    async fn create(&self, data: &NewNotification) -> AppResult<Notification> {
        let mut state = self.state.write().await;
        state.last_notification_id += 1;
        let notification = Notification {
            id: state.last_notification_id,
            user_id: data.user_id.clone(),
            message: data.message.clone(),
            kind: data.kind,
            is_read: false,
            created_at: Utc::now(),
            related_book_id: data.related_book_id.clone(),
            related_transaction_id: data.related_transaction_id,
        };
        state.notifications.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Notification>> {
        let state = self.state.read().await;
        let rows = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        Ok(State::sorted_newest_first(rows))
    }

    async fn list_unread_by_user(&self, user_id: &str) -> AppResult<Vec<Notification>> {
        let state = self.state.read().await;
        let rows = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .cloned()
            .collect();
        Ok(State::sorted_newest_first(rows))
    }

    async fn count_unread_by_user(&self, user_id: &str) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, id: i32) -> AppResult<Option<Notification>> {
        let mut state = self.state.write().await;
        Ok(state.notifications.get_mut(&id).map(|n| {
            n.is_read = true;
            n.clone()
        }))
    }

    async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut changed = 0;
        for notification in state.notifications.values_mut() {
            if notification.user_id == user_id && !notification.is_read {
                notification.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.notifications.remove(&id).is_some())
    }

    async fn delete_by_user(&self, user_id: &str) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let before = state.notifications.len();
        state.notifications.retain(|_, n| n.user_id != user_id);
        Ok((before - state.notifications.len()) as u64)
    }

    async fn exists_for_transaction(
        &self,
        transaction_id: i32,
        kind: NotificationType,
    ) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .values()
            .any(|n| n.related_transaction_id == Some(transaction_id) && n.kind == kind))
    }
}
