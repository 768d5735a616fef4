//! Notification endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::notification::{NewNotification, Notification, UnreadCount},
};

use super::ValidatedJson;

/// List a user's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications/user/{user_id}",
    tag = "notifications",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Notifications", body = Vec<Notification>)
    )
)]
pub async fn list_user_notifications(
    State(state): State<crate::AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state.services.notifications.list_for_user(&user_id).await?;
    Ok(Json(notifications))
}

/// List a user's unread notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications/user/{user_id}/unread",
    tag = "notifications",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Unread notifications", body = Vec<Notification>)
    )
)]
pub async fn list_unread_notifications(
    State(state): State<crate::AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state
        .services
        .notifications
        .list_unread_for_user(&user_id)
        .await?;
    Ok(Json(notifications))
}

/// Count a user's unread notifications
#[utoipa::path(
    get,
    path = "/notifications/user/{user_id}/unread/count",
    tag = "notifications",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Unread count", body = UnreadCount)
    )
)]
pub async fn count_unread_notifications(
    State(state): State<crate::AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UnreadCount>> {
    let count = state.services.notifications.count_unread(&user_id).await?;
    Ok(Json(UnreadCount { count }))
}

/// Mark one notification read
#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    tag = "notifications",
    params(
        ("id" = i32, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification updated", body = Notification),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn mark_read(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Notification>> {
    let notification = state.services.notifications.mark_read(id).await?;
    Ok(Json(notification))
}

/// Mark all of a user's notifications read
#[utoipa::path(
    put,
    path = "/notifications/user/{user_id}/read-all",
    tag = "notifications",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "All notifications read")
    )
)]
pub async fn mark_all_read(
    State(state): State<crate::AppState>,
    Path(user_id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.notifications.mark_all_read(&user_id).await?;
    Ok(StatusCode::OK)
}

/// Delete one notification
#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    tag = "notifications",
    params(
        ("id" = i32, Path, description = "Notification ID")
    ),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn delete_notification(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.notifications.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete all of a user's notifications
#[utoipa::path(
    delete,
    path = "/notifications/user/{user_id}/clear",
    tag = "notifications",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "Notifications cleared")
    )
)]
pub async fn clear_notifications(
    State(state): State<crate::AppState>,
    Path(user_id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.notifications.clear_for_user(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Append a notification directly
#[utoipa::path(
    post,
    path = "/notifications",
    tag = "notifications",
    request_body = NewNotification,
    responses(
        (status = 200, description = "Notification created", body = Notification),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_notification(
    State(state): State<crate::AppState>,
    ValidatedJson(data): ValidatedJson<NewNotification>,
) -> AppResult<Json<Notification>> {
    let notification = state.services.notifications.create(&data).await?;
    Ok(Json(notification))
}
