//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    auth, books, health, notifications, reservations, stats, students, transactions, uploads,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "1.0.0",
        description = "Library circulation REST API: catalog, students, loans, reservations and notifications"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Students
        students::list_students,
        students::get_student,
        students::create_student,
        students::update_student,
        students::delete_student,
        // Transactions
        transactions::list_transactions,
        transactions::get_transaction,
        transactions::list_student_transactions,
        transactions::issue_book,
        transactions::return_book,
        transactions::get_fine_quote,
        transactions::dispatch_overdue_notices,
        // Reservations
        reservations::list_reservations,
        reservations::list_book_reservations,
        reservations::create_reservation,
        reservations::delete_reservation,
        // Notifications
        notifications::list_user_notifications,
        notifications::list_unread_notifications,
        notifications::count_unread_notifications,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        notifications::clear_notifications,
        notifications::create_notification,
        // Uploads
        uploads::upload_book_image,
        uploads::serve_book_image,
        uploads::delete_book_image,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            health::HealthResponse,
            // Auth
            crate::models::auth::LoginRequest,
            crate::models::auth::LoginResponse,
            crate::models::auth::Role,
            // Catalog
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::student::Student,
            crate::models::student::CreateStudent,
            crate::models::student::UpdateStudent,
            // Circulation
            crate::models::transaction::TransactionDetails,
            crate::models::transaction::IssueBook,
            crate::models::transaction::ReturnBook,
            crate::models::transaction::FineQuote,
            transactions::OverdueNoticesResponse,
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::CreateReservation,
            // Notifications
            crate::models::notification::Notification,
            crate::models::notification::NotificationType,
            crate::models::notification::NewNotification,
            crate::models::notification::UnreadCount,
            // Uploads & stats
            crate::services::uploads::StoredImage,
            crate::services::stats::LibraryStats,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication"),
        (name = "books", description = "Book catalog"),
        (name = "students", description = "Student registry"),
        (name = "transactions", description = "Issuing and returning books"),
        (name = "reservations", description = "Holds on books"),
        (name = "notifications", description = "User notifications"),
        (name = "uploads", description = "Book cover images"),
        (name = "stats", description = "Library statistics")
    )
)]
pub struct ApiDoc;

/// Create OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
