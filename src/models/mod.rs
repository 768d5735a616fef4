//! Data models for the library server

pub mod auth;
pub mod book;
pub mod notification;
pub mod reservation;
pub mod student;
pub mod transaction;

// Re-export commonly used types
pub use book::Book;
pub use notification::{Notification, NotificationType};
pub use reservation::{Reservation, ReservationDetails};
pub use student::Student;
pub use transaction::{Transaction, TransactionDetails};
