//! Login request and resolved identity

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Caller role resolved at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Librarian,
    Student,
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Authenticated caller
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}
