//! Circulation engine: issuing and returning books
//!
//! Issue and return keep three records in step: the book's copy count, the
//! loan transaction and the borrower's notifications. The copy count and the
//! loan close are each a single conditional store operation; the engine
//! sequences them and compensates when a later write fails.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult, Entity},
    models::transaction::{FineQuote, IssueBook, NewTransaction, ReturnBook, TransactionDetails},
    repository::Repository,
    services::{
        inventory::InventoryService, notifications::NotificationService,
        reservations::ReservationService,
    },
};

/// Calendar days a book may be kept
pub const LOAN_PERIOD_DAYS: i64 = 15;

/// Advisory fine per overdue day (0.50)
pub const FINE_PER_DAY: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    inventory: InventoryService,
    reservations: ReservationService,
    notifications: NotificationService,
}

impl CirculationService {
    pub fn new(
        repository: Repository,
        inventory: InventoryService,
        reservations: ReservationService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            repository,
            inventory,
            reservations,
            notifications,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<TransactionDetails>> {
        self.repository.transactions.list().await
    }

    pub async fn list_for_student(&self, student_id: &str) -> AppResult<Vec<TransactionDetails>> {
        if self.repository.students.get_by_id(student_id).await?.is_none() {
            return Err(AppError::not_found(Entity::Student, student_id));
        }
        self.repository.transactions.list_by_student(student_id).await
    }

    pub async fn get(&self, id: i32) -> AppResult<TransactionDetails> {
        self.repository
            .transactions
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Transaction, id))
    }

    /// Lend one copy of a book to a student
    pub async fn issue_book(&self, data: IssueBook) -> AppResult<TransactionDetails> {
        let book = self
            .repository
            .books
            .get_by_id(&data.book_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Book, &data.book_id))?;
        let student = self
            .repository
            .students
            .get_by_id(&data.student_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Student, &data.student_id))?;

        if book.copies <= 0 {
            return Err(AppError::NoCopiesAvailable(book.id));
        }
        // A concurrent issue may still take the last copy between the read and here
        self.inventory.take_copy(&book.id).await?;

        let issue_date = Utc::now();
        let new_loan = NewTransaction {
            book_id: book.id.clone(),
            student_id: student.id.clone(),
            issue_date,
            due_date: issue_date + Duration::days(LOAN_PERIOD_DAYS),
        };

        let loan = match self.repository.transactions.create(&new_loan).await {
            Ok(loan) => loan,
            Err(err) => {
                tracing::warn!(book_id = %book.id, "Recording the loan failed, restoring the copy: {}", err);
                if let Err(restore_err) = self.inventory.restore_copy(&book.id).await {
                    tracing::error!(
                        book_id = %book.id,
                        "Could not restore the copy after a failed issue: {}",
                        restore_err
                    );
                }
                return Err(err);
            }
        };

        tracing::info!(
            transaction_id = loan.id,
            book_id = %loan.book_id,
            student_id = %loan.student_id,
            due_date = %loan.due_date,
            "Book issued"
        );

        if let Err(err) = self.notifications.book_issued(&loan).await {
            tracing::warn!(transaction_id = loan.id, "Issue notification not recorded: {}", err);
        }

        Ok(loan)
    }

    /// Close a loan and put the copy back on the shelf
    pub async fn return_book(&self, id: i32, data: ReturnBook) -> AppResult<TransactionDetails> {
        let loan = self.get(id).await?;
        if loan.is_returned() {
            return Err(AppError::AlreadyReturned(id));
        }

        let fine = data.fine()?;
        if fine.is_none() && data.fine_paid.is_some() {
            tracing::warn!(transaction_id = id, "Ignoring non-numeric finePaid");
        }

        // Only one caller can close the loan; a lost race reads as already returned
        let returned = self
            .repository
            .transactions
            .mark_returned(id, Utc::now(), fine)
            .await?
            .ok_or(AppError::AlreadyReturned(id))?;

        if let Err(err) = self.inventory.restore_copy(&returned.book_id).await {
            tracing::error!(
                transaction_id = id,
                book_id = %returned.book_id,
                "Loan closed but the copy was not restored: {}",
                err
            );
            return Err(AppError::Internal(format!(
                "copy of book {} not restored after closing transaction {}",
                returned.book_id, id
            )));
        }

        if let Some(reservation_id) = data.reservation_id_to_fulfill {
            if let Err(err) = self
                .reservations
                .fulfill(reservation_id, &returned.book_id)
                .await
            {
                tracing::warn!(
                    transaction_id = id,
                    reservation_id,
                    "Reservation not fulfilled after return: {}",
                    err
                );
            }
        }

        tracing::info!(
            transaction_id = id,
            book_id = %returned.book_id,
            student_id = %returned.student_id,
            fine_paid = ?returned.fine_paid,
            "Book returned"
        );

        if let Err(err) = self.notifications.book_returned(&returned).await {
            tracing::warn!(transaction_id = id, "Return notification not recorded: {}", err);
        }

        Ok(returned)
    }

    /// Fine the loan would incur at the flat daily rate
    pub async fn fine_quote(&self, id: i32) -> AppResult<FineQuote> {
        let loan = self.get(id).await?;
        Ok(quote_fine(&loan, Utc::now()))
    }

    /// Notify every borrower holding an overdue book who has not been told yet.
    ///
    /// Returns the number of notices appended.
    pub async fn dispatch_overdue_notices(&self) -> AppResult<u64> {
        let overdue = self.repository.transactions.list_overdue(Utc::now()).await?;

        let mut dispatched: u64 = 0;
        for loan in &overdue {
            if self.notifications.has_overdue_notice(loan.id).await? {
                continue;
            }
            self.notifications.book_overdue(loan).await?;
            dispatched += 1;
        }

        tracing::info!(overdue = overdue.len(), dispatched, "Overdue notices dispatched");
        Ok(dispatched)
    }
}

/// Whole calendar days past due, counted up to the return date for closed loans
fn quote_fine(loan: &TransactionDetails, now: DateTime<Utc>) -> FineQuote {
    let end = loan.return_date.unwrap_or(now);
    let days_overdue = (end.date_naive() - loan.due_date.date_naive())
        .num_days()
        .max(0);

    FineQuote {
        transaction_id: loan.id,
        days_overdue,
        fine_per_day: FINE_PER_DAY,
        amount: FINE_PER_DAY * Decimal::from(days_overdue),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::{
        models::{
            book::{Book, UpdateBook},
            notification::NotificationType, reservation::CreateReservation,
            student::Student,
        },
        repository::{
            notifications::MockNotificationsRepository,
            reservations::MockReservationsRepository, transactions::MockTransactionsRepository,
        },
    };

    fn engine(repository: Repository) -> CirculationService {
        CirculationService::new(
            repository.clone(),
            InventoryService::new(repository.clone()),
            ReservationService::new(repository.clone()),
            NotificationService::new(repository),
        )
    }

    async fn seed(repository: &Repository, copies: i32) {
        repository
            .books
            .create(&Book {
                id: "978-0441172719".into(),
                title: "Dune".into(),
                author: Some("Frank Herbert".into()),
                genre: Some("Science fiction".into()),
                copies,
                image_path: None,
            })
            .await
            .unwrap();
        for (id, name, email) in [
            ("S001", "Grace", "grace@school.edu"),
            ("S002", "Alan", "alan@school.edu"),
        ] {
            repository
                .students
                .create(&Student {
                    id: id.into(),
                    name: name.into(),
                    email: email.into(),
                    contact: None,
                    password_hash: None,
                })
                .await
                .unwrap();
        }
    }

    fn issue(student: &str) -> IssueBook {
        IssueBook {
            book_id: "978-0441172719".into(),
            student_id: student.into(),
        }
    }

    async fn copies(repository: &Repository) -> i32 {
        repository
            .books
            .get_by_id("978-0441172719")
            .await
            .unwrap()
            .unwrap()
            .copies
    }

    #[tokio::test]
    async fn test_single_copy_lifecycle() {
        let repository = Repository::in_memory();
        seed(&repository, 1).await;
        let circulation = engine(repository.clone());

        let loan = circulation.issue_book(issue("S001")).await.unwrap();
        assert_eq!(copies(&repository).await, 0);
        assert_eq!(loan.book_title, "Dune");
        assert_eq!(loan.student_name, "Grace");
        assert_eq!(loan.due_date - loan.issue_date, Duration::days(15));
        assert!(loan.return_date.is_none());
        assert!(loan.fine_paid.is_none());

        let err = circulation.issue_book(issue("S002")).await.unwrap_err();
        assert!(matches!(err, AppError::NoCopiesAvailable(_)));
        assert_eq!(copies(&repository).await, 0);
        assert_eq!(circulation.list().await.unwrap().len(), 1);

        let returned = circulation
            .return_book(loan.id, ReturnBook::default())
            .await
            .unwrap();
        assert!(returned.return_date.is_some());
        assert_eq!(copies(&repository).await, 1);

        let notices = repository.notifications.list_by_user("S001").await.unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].kind, NotificationType::BookReturned);
        assert_eq!(notices[0].message, "Book returned: \"Dune\"");
        assert_eq!(notices[1].kind, NotificationType::BookIssued);
        assert_eq!(
            notices[1].message,
            format!("Book issued: \"Dune\". Due date: {}", loan.due_date.date_naive())
        );
        assert_eq!(notices[1].related_transaction_id, Some(loan.id));
        assert!(repository.notifications.list_by_user("S002").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_return_with_fine_fulfills_only_named_reservation() {
        let repository = Repository::in_memory();
        seed(&repository, 1).await;
        let circulation = engine(repository.clone());
        let holds = ReservationService::new(repository.clone());

        let loan = circulation.issue_book(issue("S001")).await.unwrap();
        let first = holds
            .create(CreateReservation {
                book_id: "978-0441172719".into(),
                student_id: "S002".into(),
            })
            .await
            .unwrap();
        let second = holds
            .create(CreateReservation {
                book_id: "978-0441172719".into(),
                student_id: "S001".into(),
            })
            .await
            .unwrap();

        let returned = circulation
            .return_book(
                loan.id,
                ReturnBook {
                    fine_paid: Some(json!(2.5)),
                    reservation_id_to_fulfill: Some(first.id),
                },
            )
            .await
            .unwrap();

        assert_eq!(returned.fine_paid, Some(Decimal::new(25, 1)));
        assert_eq!(copies(&repository).await, 1);

        let remaining = holds.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.id);

        // Fulfillment is silent: the reserving student gets nothing
        assert!(repository.notifications.list_by_user("S002").await.unwrap().is_empty());
        let latest = &repository.notifications.list_by_user("S001").await.unwrap()[0];
        assert!(latest.message.contains("Fine paid: $2.5"));
    }

    #[tokio::test]
    async fn test_double_return_changes_nothing() {
        let repository = Repository::in_memory();
        seed(&repository, 2).await;
        let circulation = engine(repository.clone());

        let loan = circulation.issue_book(issue("S001")).await.unwrap();
        circulation
            .return_book(loan.id, ReturnBook::default())
            .await
            .unwrap();
        assert_eq!(copies(&repository).await, 2);

        let err = circulation
            .return_book(loan.id, ReturnBook::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyReturned(id) if id == loan.id));
        assert_eq!(copies(&repository).await, 2);
        assert_eq!(repository.notifications.list_by_user("S001").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_issue_unknown_book_or_student() {
        let repository = Repository::in_memory();
        seed(&repository, 1).await;
        let circulation = engine(repository.clone());

        let err = circulation
            .issue_book(IssueBook {
                book_id: "missing".into(),
                student_id: "S001".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: Entity::Book, .. }));

        let err = circulation.issue_book(issue("S999")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: Entity::Student, .. }));
        assert_eq!(copies(&repository).await, 1);
    }

    #[tokio::test]
    async fn test_return_unknown_transaction() {
        let circulation = engine(Repository::in_memory());
        let err = circulation
            .return_book(41, ReturnBook::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: Entity::Transaction, .. }));
    }

    #[tokio::test]
    async fn test_negative_fine_is_recorded_as_sent() {
        // The fine sign is not validated; refunds and typos alike are stored.
        let repository = Repository::in_memory();
        seed(&repository, 1).await;
        let circulation = engine(repository.clone());

        let loan = circulation.issue_book(issue("S001")).await.unwrap();
        let returned = circulation
            .return_book(
                loan.id,
                ReturnBook {
                    fine_paid: Some(json!(-3)),
                    reservation_id_to_fulfill: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(returned.fine_paid, Some(Decimal::from(-3)));

        let latest = &repository.notifications.list_by_user("S001").await.unwrap()[0];
        assert_eq!(latest.message, "Book returned: \"Dune\"");
    }

    #[tokio::test]
    async fn test_non_numeric_fine_is_ignored() {
        let repository = Repository::in_memory();
        seed(&repository, 1).await;
        let circulation = engine(repository.clone());

        let loan = circulation.issue_book(issue("S001")).await.unwrap();
        let returned = circulation
            .return_book(
                loan.id,
                ReturnBook {
                    fine_paid: Some(json!("five")),
                    reservation_id_to_fulfill: None,
                },
            )
            .await
            .unwrap();
        assert!(returned.fine_paid.is_none());
        assert!(returned.return_date.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_issues_never_oversell() {
        const COPIES: i32 = 3;
        const BORROWERS: usize = 12;

        let repository = Repository::in_memory();
        seed(&repository, COPIES).await;
        let circulation = engine(repository.clone());

        let mut handles = Vec::with_capacity(BORROWERS);
        for i in 0..BORROWERS {
            let circulation = circulation.clone();
            let student = if i % 2 == 0 { "S001" } else { "S002" };
            handles.push(tokio::spawn(async move {
                circulation.issue_book(issue(student)).await
            }));
        }

        let mut issued = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => issued += 1,
                Err(AppError::NoCopiesAvailable(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(issued, COPIES);
        assert_eq!(copies(&repository).await, 0);
        assert_eq!(circulation.list().await.unwrap().len(), COPIES as usize);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_returns_restore_once() {
        let repository = Repository::in_memory();
        seed(&repository, 1).await;
        let circulation = engine(repository.clone());
        let loan = circulation.issue_book(issue("S001")).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let circulation = circulation.clone();
                tokio::spawn(async move {
                    circulation.return_book(loan.id, ReturnBook::default()).await
                })
            })
            .collect();

        let mut closed = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                closed += 1;
            }
        }

        assert_eq!(closed, 1);
        assert_eq!(copies(&repository).await, 1);
    }

    #[tokio::test]
    async fn test_failed_loan_write_restores_copy() {
        let mut repository = Repository::in_memory();
        seed(&repository, 1).await;

        let mut transactions = MockTransactionsRepository::new();
        transactions
            .expect_create()
            .times(1)
            .returning(|_| Err(AppError::Internal("disk full".to_string())));
        repository.transactions = Arc::new(transactions);

        let circulation = engine(repository.clone());
        let err = circulation.issue_book(issue("S001")).await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(copies(&repository).await, 1);
        assert!(repository.notifications.list_by_user("S001").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_issue() {
        let mut repository = Repository::in_memory();
        seed(&repository, 1).await;

        let mut notifications = MockNotificationsRepository::new();
        notifications
            .expect_create()
            .returning(|_| Err(AppError::Internal("notification table locked".to_string())));
        repository.notifications = Arc::new(notifications);

        let circulation = engine(repository.clone());
        let loan = circulation.issue_book(issue("S001")).await.unwrap();

        assert_eq!(copies(&repository).await, 0);
        assert_eq!(circulation.get(loan.id).await.unwrap().id, loan.id);
    }

    #[tokio::test]
    async fn test_failed_fulfillment_does_not_fail_return() {
        let mut repository = Repository::in_memory();
        seed(&repository, 1).await;

        let mut reservations = MockReservationsRepository::new();
        reservations
            .expect_get_by_id()
            .times(1)
            .returning(|_| Err(AppError::Internal("reservations offline".to_string())));
        repository.reservations = Arc::new(reservations);

        let circulation = engine(repository.clone());
        let loan = circulation.issue_book(issue("S001")).await.unwrap();
        let returned = circulation
            .return_book(
                loan.id,
                ReturnBook {
                    fine_paid: None,
                    reservation_id_to_fulfill: Some(9),
                },
            )
            .await
            .unwrap();

        assert!(returned.is_returned());
        assert_eq!(copies(&repository).await, 1);
        let latest = &repository.notifications.list_by_user("S001").await.unwrap()[0];
        assert_eq!(latest.kind, NotificationType::BookReturned);
    }

    #[tokio::test]
    async fn test_out_of_range_fine_leaves_loan_open() {
        let repository = Repository::in_memory();
        seed(&repository, 1).await;
        let circulation = engine(repository.clone());

        let loan = circulation.issue_book(issue("S001")).await.unwrap();
        let err = circulation
            .return_book(
                loan.id,
                ReturnBook {
                    fine_paid: Some(json!(1e30)),
                    reservation_id_to_fulfill: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(!circulation.get(loan.id).await.unwrap().is_returned());
        assert_eq!(copies(&repository).await, 0);
    }

    #[tokio::test]
    async fn test_return_at_copy_limit_fails_cleanly() {
        let repository = Repository::in_memory();
        seed(&repository, 1).await;
        let circulation = engine(repository.clone());

        let loan = circulation.issue_book(issue("S001")).await.unwrap();
        repository
            .books
            .update(
                "978-0441172719",
                &UpdateBook {
                    title: "Dune".into(),
                    author: None,
                    genre: None,
                    copies: i32::MAX,
                    image_path: None,
                },
            )
            .await
            .unwrap();

        let err = circulation
            .return_book(loan.id, ReturnBook::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(copies(&repository).await, i32::MAX);
    }

    #[tokio::test]
    async fn test_overdue_notices_are_sent_once() {
        let repository = Repository::in_memory();
        seed(&repository, 2).await;
        let circulation = engine(repository.clone());

        let issued_at = Utc::now() - Duration::days(20);
        let late = repository
            .transactions
            .create(&NewTransaction {
                book_id: "978-0441172719".into(),
                student_id: "S001".into(),
                issue_date: issued_at,
                due_date: issued_at + Duration::days(LOAN_PERIOD_DAYS),
            })
            .await
            .unwrap();
        circulation.issue_book(issue("S002")).await.unwrap();

        assert_eq!(circulation.dispatch_overdue_notices().await.unwrap(), 1);
        assert_eq!(circulation.dispatch_overdue_notices().await.unwrap(), 0);

        let notices = repository.notifications.list_by_user("S001").await.unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NotificationType::BookOverdue);
        assert_eq!(notices[0].related_transaction_id, Some(late.id));
        assert_eq!(
            notices[0].message,
            format!("Book overdue: \"Dune\". Was due on {}", late.due_date.date_naive())
        );
    }

    #[tokio::test]
    async fn test_student_loans() {
        let repository = Repository::in_memory();
        seed(&repository, 2).await;
        let circulation = engine(repository);

        circulation.issue_book(issue("S001")).await.unwrap();
        circulation.issue_book(issue("S002")).await.unwrap();

        let loans = circulation.list_for_student("S002").await.unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].student_id, "S002");
        assert!(matches!(
            circulation.list_for_student("S404").await,
            Err(AppError::NotFound { entity: Entity::Student, .. })
        ));
    }

    fn loan_due(due: DateTime<Utc>, returned: Option<DateTime<Utc>>) -> TransactionDetails {
        TransactionDetails {
            id: 3,
            book_id: "978-0441172719".into(),
            book_title: "Dune".into(),
            student_id: "S001".into(),
            student_name: "Grace".into(),
            issue_date: due - Duration::days(LOAN_PERIOD_DAYS),
            due_date: due,
            return_date: returned,
            fine_paid: None,
        }
    }

    #[test]
    fn test_fine_quote() {
        let due = Utc.with_ymd_and_hms(2024, 3, 16, 9, 0, 0).unwrap();

        let quote = quote_fine(&loan_due(due, None), Utc.with_ymd_and_hms(2024, 3, 20, 8, 0, 0).unwrap());
        assert_eq!(quote.days_overdue, 4);
        assert_eq!(quote.amount, Decimal::new(200, 2));

        let quote = quote_fine(&loan_due(due, None), Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap());
        assert_eq!(quote.days_overdue, 0);
        assert!(quote.amount.is_zero());

        // Closed loans stop accruing at the return date
        let returned = Utc.with_ymd_and_hms(2024, 3, 18, 12, 0, 0).unwrap();
        let quote = quote_fine(
            &loan_due(due, Some(returned)),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        );
        assert_eq!(quote.days_overdue, 2);
        assert_eq!(quote.amount, Decimal::new(100, 2));
    }
}
