//! Book (catalog title) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Catalog title with its count of copies currently on the shelf
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// ISBN or other catalog identifier
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    /// Copies available for issue, never negative
    pub copies: i32,
    /// Filename of the uploaded cover image
    pub image_path: Option<String>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Book id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 100000, message = "Copies must be between 0 and 100000"))]
    pub copies: i32,
    pub image_path: Option<String>,
}

impl From<CreateBook> for Book {
    fn from(data: CreateBook) -> Self {
        Self {
            id: data.id,
            title: data.title,
            author: data.author,
            genre: data.genre,
            copies: data.copies,
            image_path: data.image_path,
        }
    }
}

/// Update book request. The image is only replaced when `imagePath` is sent.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    #[validate(range(min = 0, max = 100000, message = "Copies must be between 0 and 100000"))]
    pub copies: i32,
    pub image_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_are_bounded() {
        let update = |copies| UpdateBook {
            title: "Dune".into(),
            author: None,
            genre: None,
            copies,
            image_path: None,
        };

        assert!(update(0).validate().is_ok());
        assert!(update(100000).validate().is_ok());
        assert!(update(-1).validate().is_err());
        assert!(update(i32::MAX).validate().is_err());
    }
}
