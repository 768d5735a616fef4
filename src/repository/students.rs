//! Students repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::constraint_conflict;
use crate::{error::AppResult, models::student::Student};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentsRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Student>>;
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Student>>;
    /// Case-insensitive lookup used by login
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Student>>;
    async fn create(&self, student: &Student) -> AppResult<Student>;
    /// Replace every field of the student with the same id
    async fn update(&self, student: &Student) -> AppResult<Option<Student>>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgStudentsRepository {
    pool: Pool<Postgres>,
}

impl PgStudentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentsRepository for PgStudentsRepository {
    async fn list(&self) -> AppResult<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>("SELECT * FROM students ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(students)
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Student>> {
        let student =
            sqlx::query_as::<_, Student>("SELECT * FROM students WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(student)
    }

    async fn create(&self, student: &Student) -> AppResult<Student> {
        sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (id, name, email, contact, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&student.id)
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.contact)
        .bind(&student.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_conflict(
                e,
                format!("Student {} or email {} already exists", student.id, student.email),
            )
        })
    }

    async fn update(&self, student: &Student) -> AppResult<Option<Student>> {
        sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET name = $2, email = $3, contact = $4, password_hash = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(&student.id)
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.contact)
        .bind(&student.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| constraint_conflict(e, format!("Email {} already in use", student.email)))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                constraint_conflict(
                    e,
                    format!("Student {} is referenced by loans or reservations", id),
                )
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
