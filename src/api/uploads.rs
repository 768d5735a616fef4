//! Book image upload endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Multipart;

use crate::{
    error::{AppError, AppResult},
    services::uploads::StoredImage,
};

/// Upload a book cover image (multipart field `file`)
#[utoipa::path(
    post,
    path = "/upload/book-image",
    tag = "uploads",
    request_body(content = String, content_type = "multipart/form-data", description = "JPEG or PNG in the `file` field"),
    responses(
        (status = 200, description = "Image stored", body = StoredImage),
        (status = 400, description = "Missing file or unsupported type")
    )
)]
pub async fn upload_book_image(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<StoredImage>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let stored = state
            .services
            .uploads
            .store_book_image(file_name.as_deref(), content_type.as_deref(), &bytes)
            .await?;
        return Ok(Json(stored));
    }

    Err(AppError::BadRequest("Please select a file to upload".to_string()))
}

/// Serve a stored book image
#[utoipa::path(
    get,
    path = "/uploads/books/{filename}",
    tag = "uploads",
    params(
        ("filename" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 400, description = "Invalid filename"),
        (status = 404, description = "File not found")
    )
)]
pub async fn serve_book_image(
    State(state): State<crate::AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let (bytes, content_type) = state.services.uploads.read_book_image(&filename).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Delete a stored book image
#[utoipa::path(
    delete,
    path = "/uploads/books/{filename}",
    tag = "uploads",
    params(
        ("filename" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 400, description = "Invalid filename"),
        (status = 404, description = "File not found")
    )
)]
pub async fn delete_book_image(
    State(state): State<crate::AppState>,
    Path(filename): Path<String>,
) -> AppResult<StatusCode> {
    state.services.uploads.delete_book_image(&filename).await?;
    Ok(StatusCode::NO_CONTENT)
}
