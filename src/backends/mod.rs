//! Backend clients subsystem.
//!
//! # Data Flow
//! ```text
//! orchestrator
//!     → LibraryApi / RatingApi / ReservationApi (capability traits)
//!     → library.rs / rating.rs / reservation.rs (reqwest clients)
//!     → http.rs (breaker guard + response classification)
//!     → backend service
//!
//! rating update failure:
//!     → rating.rs defers the correction to the RetryQueue
//! ```
//!
//! # Design Decisions
//! - The orchestrator only sees the traits; clients are swappable with fakes
//! - Every failure is classified here (see `ServiceError`) and propagated as is
//! - Circuit-open is its own error so read use cases can degrade to empty data

use async_trait::async_trait;

use crate::domain::{Book, Library, Page, Rating, Reservation, ReservationStatus, ReservedBook};

pub mod error;
pub mod http;
pub mod library;
pub mod rating;
pub mod reservation;

pub use error::ServiceError;
pub use http::{build_client, HttpBackend};
pub use library::LibraryClient;
pub use rating::{RatingChange, RatingClient};
pub use reservation::ReservationClient;

/// Catalog capabilities.
#[async_trait]
pub trait LibraryApi: Send + Sync {
    /// `size == 0` means no limit.
    async fn list_libraries(
        &self,
        city: &str,
        page: u64,
        size: u64,
    ) -> Result<Page<Library>, ServiceError>;

    async fn list_libraries_by_ids(&self, ids: &[String]) -> Result<Page<Library>, ServiceError>;

    /// `size == 0` means no limit. `show_all` includes books with no copies left.
    async fn list_books(
        &self,
        library_id: &str,
        show_all: bool,
        page: u64,
        size: u64,
    ) -> Result<Page<Book>, ServiceError>;

    async fn list_books_by_ids(&self, ids: &[String]) -> Result<Page<Book>, ServiceError>;

    /// Take a copy out of the library (decrements availability).
    async fn obtain_book(&self, library_id: &str, book_id: &str)
        -> Result<ReservedBook, ServiceError>;

    /// Hand a copy back; returns the book with its recorded condition.
    async fn return_book(&self, library_id: &str, book_id: &str) -> Result<Book, ServiceError>;
}

/// Rating capabilities.
#[async_trait]
pub trait RatingApi: Send + Sync {
    async fn get_user_rating(&self, username: &str) -> Result<Rating, ServiceError>;

    /// Apply a signed star delta. Implementations may defer the write; an `Ok`
    /// means "accepted", not necessarily "applied".
    async fn update_user_rating(&self, username: &str, diff: i64) -> Result<(), ServiceError>;
}

/// Reservation capabilities.
#[async_trait]
pub trait ReservationApi: Send + Sync {
    /// `status == None` returns every reservation of the user.
    async fn get_user_reservations(
        &self,
        username: &str,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<Reservation>, ServiceError>;

    /// Persist a new reservation and return its id.
    async fn add_reservation(&self, reservation: &Reservation) -> Result<String, ServiceError>;

    async fn set_reservation_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> Result<(), ServiceError>;
}
