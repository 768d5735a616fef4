//! Student registry service

use crate::{
    error::{AppError, AppResult, Entity},
    models::student::{CreateStudent, Student, UpdateStudent},
    repository::Repository,
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct StudentService {
    repository: Repository,
}

impl StudentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_students(&self) -> AppResult<Vec<Student>> {
        self.repository.students.list().await
    }

    pub async fn get_student(&self, id: &str) -> AppResult<Student> {
        self.repository
            .students
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Student, id))
    }

    /// Register a student. Without a password the student cannot log in.
    pub async fn create_student(&self, data: CreateStudent) -> AppResult<Student> {
        let password_hash = data.password.as_deref().map(hash_password).transpose()?;
        let student = Student {
            id: data.id,
            name: data.name,
            email: data.email.trim().to_string(),
            contact: data.contact,
            password_hash,
        };

        let student = self.repository.students.create(&student).await?;
        tracing::info!(student_id = %student.id, "Student registered");
        Ok(student)
    }

    pub async fn update_student(&self, id: &str, data: UpdateStudent) -> AppResult<Student> {
        let current = self.get_student(id).await?;
        let password_hash = match data.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => current.password_hash,
        };

        self.repository
            .students
            .update(&Student {
                id: current.id,
                name: data.name,
                email: data.email.trim().to_string(),
                contact: data.contact,
                password_hash,
            })
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Student, id))
    }

    /// Remove a student. Students with loans or holds on record cannot be removed.
    pub async fn delete_student(&self, id: &str) -> AppResult<()> {
        if !self.repository.students.delete(id).await? {
            return Err(AppError::not_found(Entity::Student, id));
        }
        tracing::info!(student_id = %id, "Student removed");
        Ok(())
    }
}
