//! Notification dispatcher

use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult, Entity},
    models::{
        notification::{NewNotification, Notification, NotificationType},
        transaction::TransactionDetails,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct NotificationService {
    repository: Repository,
}

impl NotificationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Notification>> {
        self.repository.notifications.list_by_user(user_id).await
    }

    pub async fn list_unread_for_user(&self, user_id: &str) -> AppResult<Vec<Notification>> {
        self.repository.notifications.list_unread_by_user(user_id).await
    }

    pub async fn count_unread(&self, user_id: &str) -> AppResult<i64> {
        self.repository.notifications.count_unread_by_user(user_id).await
    }

    pub async fn mark_read(&self, id: i32) -> AppResult<Notification> {
        self.repository
            .notifications
            .mark_read(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Notification, id))
    }

    /// Bulk flip; calling it again changes nothing
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        let changed = self.repository.notifications.mark_all_read(user_id).await?;
        tracing::debug!(user_id, changed, "Marked notifications read");
        Ok(changed)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if !self.repository.notifications.delete(id).await? {
            return Err(AppError::not_found(Entity::Notification, id));
        }
        Ok(())
    }

    /// Remove every notification of the user, succeeding when there were none
    pub async fn clear_for_user(&self, user_id: &str) -> AppResult<u64> {
        let removed = self.repository.notifications.delete_by_user(user_id).await?;
        tracing::debug!(user_id, removed, "Cleared notifications");
        Ok(removed)
    }

    /// Append a notification directly (administration and testing)
    pub async fn create(&self, data: &NewNotification) -> AppResult<Notification> {
        self.repository.notifications.create(data).await
    }

    pub async fn book_issued(&self, loan: &TransactionDetails) -> AppResult<Notification> {
        self.emit(loan, NotificationType::BookIssued, issued_message(loan))
            .await
    }

    pub async fn book_returned(&self, loan: &TransactionDetails) -> AppResult<Notification> {
        self.emit(loan, NotificationType::BookReturned, returned_message(loan))
            .await
    }

    pub async fn book_overdue(&self, loan: &TransactionDetails) -> AppResult<Notification> {
        self.emit(loan, NotificationType::BookOverdue, overdue_message(loan))
            .await
    }

    pub async fn has_overdue_notice(&self, transaction_id: i32) -> AppResult<bool> {
        self.repository
            .notifications
            .exists_for_transaction(transaction_id, NotificationType::BookOverdue)
            .await
    }

    async fn emit(
        &self,
        loan: &TransactionDetails,
        kind: NotificationType,
        message: String,
    ) -> AppResult<Notification> {
        let notification = NewNotification {
            user_id: loan.student_id.clone(),
            message,
            kind,
            related_book_id: Some(loan.book_id.clone()),
            related_transaction_id: Some(loan.id),
        };
        self.repository.notifications.create(&notification).await
    }
}

fn issued_message(loan: &TransactionDetails) -> String {
    format!(
        "Book issued: \"{}\". Due date: {}",
        loan.book_title,
        loan.due_date.date_naive()
    )
}

fn returned_message(loan: &TransactionDetails) -> String {
    let mut message = format!("Book returned: \"{}\"", loan.book_title);
    if let Some(fine) = loan.fine_paid.filter(|fine| fine.is_sign_positive() && !fine.is_zero()) {
        message.push_str(&format!(". Fine paid: ${}", fine_amount(fine)));
    }
    message
}

/// Shortest decimal form, keeping one fractional digit for whole amounts (`3.0`, `2.5`)
fn fine_amount(fine: Decimal) -> String {
    let fine = fine.normalize();
    if fine.scale() == 0 {
        format!("{}.0", fine)
    } else {
        fine.to_string()
    }
}

fn overdue_message(loan: &TransactionDetails) -> String {
    format!(
        "Book overdue: \"{}\". Was due on {}",
        loan.book_title,
        loan.due_date.date_naive()
    )
}
