//! Book cover image storage on the local filesystem

use std::path::PathBuf;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::UploadConfig,
    error::{AppError, AppResult, Entity},
};

/// Public URL prefix the stored images are served under
pub const BOOK_IMAGE_URL_PREFIX: &str = "/api/uploads/books/";

const ACCEPTED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Result of a successful upload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredImage {
    pub message: String,
    pub filename: String,
    pub url: String,
}

#[derive(Clone)]
pub struct UploadService {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            max_bytes: config.max_bytes,
        }
    }

    /// Store an uploaded JPEG or PNG under a fresh UUID name
    pub async fn store_book_image(
        &self,
        original_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> AppResult<StoredImage> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Please select a file to upload".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "File exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        let content_type = content_type
            .map(|ct| ct.to_ascii_lowercase())
            .filter(|ct| ACCEPTED_CONTENT_TYPES.contains(&ct.as_str()))
            .ok_or_else(|| {
                AppError::BadRequest("Only JPG, JPEG, and PNG images are allowed".to_string())
            })?;

        let extension = original_name
            .and_then(image_extension)
            .unwrap_or(if content_type == "image/png" { ".png" } else { ".jpg" });
        let filename = format!("{}{}", Uuid::new_v4(), extension);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        tracing::info!(filename = %filename, size = bytes.len(), "Book image stored");

        Ok(StoredImage {
            message: "File uploaded successfully".to_string(),
            url: format!("{}{}", BOOK_IMAGE_URL_PREFIX, filename),
            filename,
        })
    }

    /// Read a stored image with the content type its extension implies
    pub async fn read_book_image(&self, filename: &str) -> AppResult<(Vec<u8>, &'static str)> {
        let path = self.resolve(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok((bytes, content_type_for(filename))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(Entity::File, filename))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_book_image(&self, filename: &str) -> AppResult<()> {
        let path = self.resolve(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(filename = %filename, "Book image deleted");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(Entity::File, filename))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Path of a stored file; names that could leave the upload directory are rejected
    fn resolve(&self, filename: &str) -> AppResult<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(AppError::BadRequest(format!("Invalid filename: {}", filename)));
        }
        Ok(self.dir.join(filename))
    }
}

/// Lowercased extension (with the dot) when it is one we store
fn image_extension(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" => Some(".jpg"),
        "jpeg" => Some(".jpeg"),
        "png" => Some(".png"),
        _ => None,
    }
}

fn content_type_for(filename: &str) -> &'static str {
    match image_extension(filename) {
        Some(".png") => "image/png",
        Some(_) => "image/jpeg",
        None => "application/octet-stream",
    }
}
