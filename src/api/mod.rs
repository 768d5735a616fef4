//! HTTP handlers and router for the library REST API

pub mod auth;
pub mod books;
pub mod health;
pub mod notifications;
pub mod openapi;
pub mod reservations;
pub mod stats;
pub mod students;
pub mod transactions;
pub mod uploads;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, DefaultBodyLimit, FromRequest, Request},
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use validator::Validate;

use crate::{config::CorsConfig, error::AppError, AppState};

/// JSON body that has passed its `validator` rules.
///
/// Malformed bodies (bad JSON, wrong types, missing fields) are reported as
/// `400 Bad Request` in the common error format.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Build the application router with all routes under `/api`
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.uploads.max_bytes + 64 * 1024;
    let cors = cors_layer(&state.config.cors);

    let api = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Students
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/students/:id",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        // Circulation
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::issue_book),
        )
        .route(
            "/transactions/overdue-notices",
            post(transactions::dispatch_overdue_notices),
        )
        .route(
            "/transactions/student/:student_id",
            get(transactions::list_student_transactions),
        )
        .route(
            "/transactions/:id",
            get(transactions::get_transaction).put(transactions::return_book),
        )
        .route("/transactions/:id/fine", get(transactions::get_fine_quote))
        // Reservations
        .route(
            "/reservations",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route(
            "/reservations/book/:book_id",
            get(reservations::list_book_reservations),
        )
        .route("/reservations/:id", delete(reservations::delete_reservation))
        // Notifications
        .route("/notifications", post(notifications::create_notification))
        .route(
            "/notifications/user/:user_id",
            get(notifications::list_user_notifications),
        )
        .route(
            "/notifications/user/:user_id/unread",
            get(notifications::list_unread_notifications),
        )
        .route(
            "/notifications/user/:user_id/unread/count",
            get(notifications::count_unread_notifications),
        )
        .route(
            "/notifications/user/:user_id/read-all",
            put(notifications::mark_all_read),
        )
        .route(
            "/notifications/user/:user_id/clear",
            delete(notifications::clear_notifications),
        )
        .route("/notifications/:id/read", put(notifications::mark_read))
        .route("/notifications/:id", delete(notifications::delete_notification))
        // Uploads
        .route("/upload/book-image", post(uploads::upload_book_image))
        .route(
            "/uploads/books/:filename",
            get(uploads::serve_book_image).delete(uploads::delete_book_image),
        )
        // Statistics
        .route("/stats", get(stats::get_stats))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// CORS from configuration; a `*` entry allows any origin
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
