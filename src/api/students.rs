//! Student endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::student::{CreateStudent, Student, UpdateStudent},
};

use super::ValidatedJson;

/// List all students
#[utoipa::path(
    get,
    path = "/students",
    tag = "students",
    responses(
        (status = 200, description = "All students", body = Vec<Student>)
    )
)]
pub async fn list_students(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Student>>> {
    let students = state.services.students.list_students().await?;
    Ok(Json(students))
}

/// Get a student by id
#[utoipa::path(
    get,
    path = "/students/{id}",
    tag = "students",
    params(
        ("id" = String, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student details", body = Student),
        (status = 404, description = "Student not found")
    )
)]
pub async fn get_student(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Student>> {
    let student = state.services.students.get_student(&id).await?;
    Ok(Json(student))
}

/// Register a student
#[utoipa::path(
    post,
    path = "/students",
    tag = "students",
    request_body = CreateStudent,
    responses(
        (status = 200, description = "Student created", body = Student),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Id or email already registered")
    )
)]
pub async fn create_student(
    State(state): State<crate::AppState>,
    ValidatedJson(data): ValidatedJson<CreateStudent>,
) -> AppResult<Json<Student>> {
    let student = state.services.students.create_student(data).await?;
    Ok(Json(student))
}

/// Update a student
#[utoipa::path(
    put,
    path = "/students/{id}",
    tag = "students",
    params(
        ("id" = String, Path, description = "Student ID")
    ),
    request_body = UpdateStudent,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_student(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    ValidatedJson(data): ValidatedJson<UpdateStudent>,
) -> AppResult<Json<Student>> {
    let student = state.services.students.update_student(&id, data).await?;
    Ok(Json(student))
}

/// Delete a student
#[utoipa::path(
    delete,
    path = "/students/{id}",
    tag = "students",
    params(
        ("id" = String, Path, description = "Student ID")
    ),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Student has loans or reservations on record")
    )
)]
pub async fn delete_student(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.students.delete_student(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
