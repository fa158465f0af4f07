//! Read models and records exchanged with the backends.
//!
//! The gateway owns none of these: catalog entities belong to the library
//! service, ratings to the rating service, reservations to the reservation
//! service. They are fetched fresh per request and never cached.

pub mod library;
pub mod rating;
pub mod reservation;

pub use library::{Book, Library, Page, ReservedBook};
pub use rating::Rating;
pub use reservation::{BorrowedBook, Reservation, ReservationStatus, UserReservation};
