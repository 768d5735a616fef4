//! Dashboard counters

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, repository::Repository};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_books: i64,
    pub available_copies: i64,
    pub total_students: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub reservations: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_stats(&self) -> AppResult<LibraryStats> {
        let now = Utc::now();
        Ok(LibraryStats {
            total_books: self.repository.books.count().await?,
            available_copies: self.repository.books.total_copies().await?,
            total_students: self.repository.students.count().await?,
            active_loans: self.repository.transactions.count_open().await?,
            overdue_loans: self.repository.transactions.count_overdue(now).await?,
            reservations: self.repository.reservations.count().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::Book;

    #[tokio::test]
    async fn test_counts_follow_store() {
        let repository = Repository::in_memory();
        for (id, copies) in [("B1", 2), ("B2", 3)] {
            repository
                .books
                .create(&Book {
                    id: id.into(),
                    title: id.into(),
                    author: None,
                    genre: None,
                    copies,
                    image_path: None,
                })
                .await
                .unwrap();
        }

        let stats = StatsService::new(repository).get_stats().await.unwrap();
        assert_eq!(stats.total_books, 2);
        assert_eq!(stats.available_copies, 5);
        assert_eq!(stats.total_students, 0);
        assert_eq!(stats.active_loans, 0);
        assert_eq!(stats.reservations, 0);
    }
}
