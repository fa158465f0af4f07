//! The lending use cases composed over the three backends.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::backends::{LibraryApi, RatingApi, ReservationApi, ServiceError};
use crate::domain::rating::{BONUS, PENALTY};
use crate::domain::{
    Book, BorrowedBook, Library, Page, Rating, Reservation, ReservationStatus, UserReservation,
};
use crate::observability::metrics;
use crate::orchestrator::{OrchestratorError, OrchestratorResult};

/// What happened to a returned book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnSummary {
    pub status: ReservationStatus,
    /// Caller-reported condition equals the library's record.
    pub condition_matched: bool,
    /// Sum of the rating adjustments requested (penalties and bonus).
    pub rating_change: i64,
}

/// Entry point for the API layer.
#[derive(Clone)]
pub struct Orchestrator {
    library: Arc<dyn LibraryApi>,
    rating: Arc<dyn RatingApi>,
    reservation: Arc<dyn ReservationApi>,
}

impl Orchestrator {
    pub fn new(
        library: Arc<dyn LibraryApi>,
        rating: Arc<dyn RatingApi>,
        reservation: Arc<dyn ReservationApi>,
    ) -> Self {
        Self {
            library,
            rating,
            reservation,
        }
    }

    /// Libraries in a city. An open circuit yields an empty page.
    pub async fn list_libraries(
        &self,
        city: &str,
        page: u64,
        size: u64,
    ) -> OrchestratorResult<Page<Library>> {
        let result = degrade(self.library.list_libraries(city, page, size).await);
        finish("list_libraries", result.map_err(|e| {
            tracing::warn!(city = %city, error = %e, "Failed to get list of libraries");
            e
        }))
    }

    /// Books of a library. An open circuit yields an empty page.
    pub async fn list_books(
        &self,
        library_id: &str,
        show_all: bool,
        page: u64,
        size: u64,
    ) -> OrchestratorResult<Page<Book>> {
        let result = degrade(
            self.library
                .list_books(library_id, show_all, page, size)
                .await,
        );
        finish("list_books", result.map_err(|e| {
            tracing::warn!(library_id = %library_id, error = %e, "Failed to get list of library books");
            e
        }))
    }

    /// The user's stars. An open circuit yields an empty rating.
    pub async fn get_user_rating(&self, username: &str) -> OrchestratorResult<Rating> {
        let result = degrade(self.rating.get_user_rating(username).await).map_err(|e| {
            tracing::warn!(username = %username, error = %e, "Failed to get user rating");
            OrchestratorError::from(e)
        });
        finish("get_user_rating", result)
    }

    /// Every reservation of the user joined with its book and library.
    ///
    /// An open circuit on the reservation service yields an empty list. Books
    /// and libraries are then fetched concurrently; if either lookup fails the
    /// whole call fails and the other lookup is dropped.
    pub async fn get_user_reservations(
        &self,
        username: &str,
    ) -> OrchestratorResult<Vec<UserReservation>> {
        let result = self.user_reservations(username).await;
        finish("get_user_reservations", result)
    }

    async fn user_reservations(&self, username: &str) -> OrchestratorResult<Vec<UserReservation>> {
        let reservations = degrade(
            self.reservation
                .get_user_reservations(username, None)
                .await,
        )
        .map_err(|e| {
            tracing::warn!(username = %username, error = %e, "Failed to get list of user reservations");
            e
        })?;

        if reservations.is_empty() {
            return Ok(Vec::new());
        }

        let book_ids = unique_ids(reservations.iter().map(|r| r.book_id.as_str()));
        let library_ids = unique_ids(reservations.iter().map(|r| r.library_id.as_str()));

        let (books, libraries) = tokio::try_join!(
            self.library.list_books_by_ids(&book_ids),
            self.library.list_libraries_by_ids(&library_ids),
        )
        .map_err(|e| {
            tracing::warn!(username = %username, error = %e, "Failed to get list of user books");
            e
        })?;

        // Linear scans: reservations per user are few. Index by id if that changes.
        Ok(reservations
            .into_iter()
            .map(|r| UserReservation {
                book: books
                    .find(|b| b.id == r.book_id)
                    .cloned()
                    .unwrap_or_default(),
                library: libraries
                    .find(|l| l.id == r.library_id)
                    .cloned()
                    .unwrap_or_default(),
                id: r.id,
                username: r.username,
                status: r.status,
                start: r.start,
                end: r.end,
            })
            .collect())
    }

    /// Borrow a book, enforcing the loans-per-star limit.
    ///
    /// The reservation is recorded before the book is taken from the library.
    /// If taking the book then fails, the reservation is left in place for an
    /// operator to reconcile; there is no compensating rollback.
    pub async fn take_book(
        &self,
        username: &str,
        library_id: &str,
        book_id: &str,
        end: DateTime<Utc>,
    ) -> OrchestratorResult<BorrowedBook> {
        let result = self.borrow(username, library_id, book_id, end).await;
        finish("take_book", result)
    }

    async fn borrow(
        &self,
        username: &str,
        library_id: &str,
        book_id: &str,
        end: DateTime<Utc>,
    ) -> OrchestratorResult<BorrowedBook> {
        let active = self
            .reservation
            .get_user_reservations(username, Some(ReservationStatus::Rented))
            .await
            .map_err(|e| {
                tracing::warn!(username = %username, error = %e, "Failed to get reservations");
                e
            })?;

        let rating = self.rating.get_user_rating(username).await.map_err(|e| {
            tracing::warn!(username = %username, error = %e, "Failed to get rating");
            e
        })?;

        if !rating.allows_another(active.len()) {
            tracing::warn!(
                username = %username,
                active = active.len(),
                stars = rating.stars,
                "Insufficient rating"
            );
            return Err(OrchestratorError::InsufficientRating {
                active: active.len(),
                stars: rating.stars,
            });
        }

        let mut reservation = Reservation {
            id: String::new(),
            username: username.to_string(),
            status: ReservationStatus::Rented,
            start: Utc::now(),
            end,
            library_id: library_id.to_string(),
            book_id: book_id.to_string(),
        };

        reservation.id = self
            .reservation
            .add_reservation(&reservation)
            .await
            .map_err(|e| {
                tracing::warn!(username = %username, error = %e, "Failed to add reservation");
                e
            })?;

        let reserved = self
            .library
            .obtain_book(library_id, book_id)
            .await
            .map_err(|e| {
                tracing::error!(
                    username = %username,
                    reservation_id = %reservation.id,
                    error = %e,
                    "Failed to obtain book; reservation left without a book"
                );
                e
            })?;

        tracing::info!(
            username = %username,
            reservation_id = %reservation.id,
            book_id = %book_id,
            "Book taken"
        );

        Ok(BorrowedBook {
            reservation,
            reserved,
            rating,
        })
    }

    /// Close a rented reservation and settle the rating.
    ///
    /// A late return is `EXPIRED` and costs a penalty. A condition mismatch
    /// costs another penalty. Only an on-time return in the recorded condition
    /// earns the bonus. Rating writes are fire-and-forget.
    pub async fn return_book(
        &self,
        username: &str,
        reservation_id: &str,
        condition: &str,
        date: DateTime<Utc>,
    ) -> OrchestratorResult<ReturnSummary> {
        let result = self
            .close_reservation(username, reservation_id, condition, date)
            .await;
        finish("return_book", result)
    }

    async fn close_reservation(
        &self,
        username: &str,
        reservation_id: &str,
        condition: &str,
        date: DateTime<Utc>,
    ) -> OrchestratorResult<ReturnSummary> {
        let rented = self
            .reservation
            .get_user_reservations(username, Some(ReservationStatus::Rented))
            .await
            .map_err(|e| {
                tracing::warn!(username = %username, error = %e, "Failed to get reservations");
                e
            })?;

        let reservation = rented
            .into_iter()
            .find(|r| r.id == reservation_id)
            .ok_or_else(|| OrchestratorError::NotFound {
                reservation_id: reservation_id.to_string(),
            })?;

        let status = ReservationStatus::on_return(date, reservation.end);
        let mut rating_change = 0;

        if status == ReservationStatus::Expired {
            tracing::warn!(username = %username, reservation_id = %reservation_id, "Reservation is expired");
            rating_change += self.adjust_rating(username, PENALTY).await;
        }

        self.reservation
            .set_reservation_status(reservation_id, status)
            .await
            .map_err(|e| {
                tracing::warn!(reservation_id = %reservation_id, error = %e, "Failed to change reservation status");
                e
            })?;

        let book = self
            .library
            .return_book(&reservation.library_id, &reservation.book_id)
            .await
            .map_err(|e| {
                tracing::warn!(reservation_id = %reservation_id, error = %e, "Failed to return book to library");
                e
            })?;

        let condition_matched = book.condition == condition;
        if !condition_matched {
            tracing::warn!(
                username = %username,
                expected = %book.condition,
                actual = %condition,
                "Book in wrong condition"
            );
            rating_change += self.adjust_rating(username, PENALTY).await;
        }

        if status == ReservationStatus::Returned && condition_matched {
            rating_change += self.adjust_rating(username, BONUS).await;
        }

        Ok(ReturnSummary {
            status,
            condition_matched,
            rating_change,
        })
    }

    /// Request a rating change; failures are logged, never propagated.
    async fn adjust_rating(&self, username: &str, diff: i64) -> i64 {
        if let Err(e) = self.rating.update_user_rating(username, diff).await {
            tracing::warn!(username = %username, diff, error = %e, "Failed to update user rating");
        }
        diff
    }
}

/// Pure reads answer with an empty value while the circuit is open. Reads
/// that gate a write never go through here.
fn degrade<T: Default>(result: Result<T, ServiceError>) -> Result<T, ServiceError> {
    match result {
        Err(e) if e.is_circuit_open() => {
            tracing::debug!(error = %e, "Serving degraded empty result");
            Ok(T::default())
        }
        other => other,
    }
}

fn finish<T, E>(use_case: &'static str, result: Result<T, E>) -> OrchestratorResult<T>
where
    E: Into<OrchestratorError>,
{
    let result = result.map_err(Into::into);
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    metrics::record_use_case(use_case, outcome);
    result
}

fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}
