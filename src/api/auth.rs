//! Authentication endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::auth::{LoginRequest, LoginResponse},
};

use super::ValidatedJson;

/// Log in as the librarian or a student
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let identity = state
        .services
        .auth
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(identity))
}
