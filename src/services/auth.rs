//! Authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::auth::{LoginResponse, Role},
    repository::Repository,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    librarian_password_hash: String,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> AppResult<Self> {
        let librarian_password_hash = match (&config.librarian_password_hash, &config.librarian_password) {
            (Some(hash), _) => {
                PasswordHash::new(hash)
                    .map_err(|_| AppError::Internal("Invalid librarian password hash".to_string()))?;
                hash.clone()
            }
            (None, Some(password)) => hash_password(password)?,
            (None, None) => {
                return Err(AppError::Internal(
                    "auth.librarian_password or auth.librarian_password_hash must be set".to_string(),
                ))
            }
        };

        Ok(Self {
            repository,
            config,
            librarian_password_hash,
        })
    }

    /// Resolve the caller for an email/password pair
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let email = email.trim();

        if email.eq_ignore_ascii_case(&self.config.librarian_email) {
            if !verify_password(&self.librarian_password_hash, password)? {
                tracing::info!("Rejected librarian login");
                return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
            }
            return Ok(LoginResponse {
                id: self.config.librarian_id.clone(),
                name: self.config.librarian_name.clone(),
                email: self.config.librarian_email.clone(),
                role: Role::Librarian,
            });
        }

        let student = self
            .repository
            .students
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        let password_valid = match student.password_hash {
            Some(ref hash) => verify_password(hash, password)?,
            None => false,
        };
        if !password_valid {
            tracing::info!(student_id = %student.id, "Rejected student login");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        Ok(LoginResponse {
            id: student.id,
            name: student.name,
            email: student.email,
            role: Role::Student,
        })
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::student::Student;

    fn config() -> AuthConfig {
        AuthConfig {
            librarian_password: Some("admin123".to_string()),
            ..AuthConfig::default()
        }
    }

    #[tokio::test]
    async fn test_librarian_login() {
        let auth = AuthService::new(Repository::in_memory(), config()).unwrap();

        let identity = auth.login("Librarian@Library.com", "admin123").await.unwrap();
        assert_eq!(identity.role, Role::Librarian);
        assert_eq!(identity.id, "L001");

        let err = auth.login("librarian@library.com", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_student_login_requires_matching_password() {
        let repository = Repository::in_memory();
        repository
            .students
            .create(&Student {
                id: "S001".into(),
                name: "Grace".into(),
                email: "grace@example.com".into(),
                contact: None,
                password_hash: Some(hash_password("secret").unwrap()),
            })
            .await
            .unwrap();
        repository
            .students
            .create(&Student {
                id: "S002".into(),
                name: "Alan".into(),
                email: "alan@example.com".into(),
                contact: None,
                password_hash: None,
            })
            .await
            .unwrap();
        let auth = AuthService::new(repository, config()).unwrap();

        let identity = auth.login("grace@example.com", "secret").await.unwrap();
        assert_eq!(identity.role, Role::Student);
        assert_eq!(identity.name, "Grace");

        assert!(auth.login("grace@example.com", "wrong").await.is_err());
        assert!(auth.login("alan@example.com", "anything").await.is_err());
        assert!(auth.login("nobody@example.com", "secret").await.is_err());
    }

    #[test]
    fn test_missing_librarian_credential_is_rejected() {
        let result = AuthService::new(Repository::in_memory(), AuthConfig::default());
        assert!(result.is_err());
    }
}
