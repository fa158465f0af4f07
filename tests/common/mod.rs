//! Shared fakes for integration tests.
//!
//! In-memory stand-ins for the three backends. Each records the calls it
//! receives and can be told to fail a specific operation.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use library_gateway::backends::{LibraryApi, RatingApi, ReservationApi, ServiceError};
use library_gateway::domain::{
    Book, Library, Page, Rating, Reservation, ReservationStatus, ReservedBook,
};
use library_gateway::Orchestrator;

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
}

pub fn unavailable(service: &'static str) -> ServiceError {
    ServiceError::Unavailable {
        service,
        reason: "connection refused".into(),
    }
}

pub fn book(id: &str, condition: &str) -> Book {
    Book {
        id: id.into(),
        name: format!("Book {id}"),
        author: "Author".into(),
        genre: "Fiction".into(),
        condition: condition.into(),
        available_count: 1,
    }
}

pub fn library(id: &str) -> Library {
    Library {
        id: id.into(),
        name: format!("Library {id}"),
        address: "Main St 1".into(),
        city: "Moscow".into(),
    }
}

pub fn rented(id: &str, username: &str, book_id: &str, library_id: &str, end: DateTime<Utc>) -> Reservation {
    Reservation {
        id: id.into(),
        username: username.into(),
        status: ReservationStatus::Rented,
        start: day(1),
        end,
        library_id: library_id.into(),
        book_id: book_id.into(),
    }
}

#[derive(Default)]
pub struct FakeLibrary {
    pub books: Mutex<Vec<Book>>,
    pub libraries: Mutex<Vec<Library>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_books_by_ids: Mutex<Option<ServiceError>>,
    pub fail_libraries_by_ids: Mutex<Option<ServiceError>>,
    pub fail_list: Mutex<Option<ServiceError>>,
    pub fail_obtain: Mutex<Option<ServiceError>>,
}

impl FakeLibrary {
    pub fn with(books: Vec<Book>, libraries: Vec<Library>) -> Self {
        Self {
            books: Mutex::new(books),
            libraries: Mutex::new(libraries),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn fail(slot: &Mutex<Option<ServiceError>>) -> Result<(), ServiceError> {
        match slot.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LibraryApi for FakeLibrary {
    async fn list_libraries(&self, city: &str, _page: u64, _size: u64) -> Result<Page<Library>, ServiceError> {
        self.record("list_libraries");
        Self::fail(&self.fail_list)?;
        let items: Vec<_> = self
            .libraries
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.city == city)
            .cloned()
            .collect();
        Ok(Page { total: items.len() as u64, items })
    }

    async fn list_libraries_by_ids(&self, ids: &[String]) -> Result<Page<Library>, ServiceError> {
        self.record("list_libraries_by_ids");
        // Let the sibling branch run before answering.
        tokio::task::yield_now().await;
        Self::fail(&self.fail_libraries_by_ids)?;
        let items: Vec<_> = self
            .libraries
            .lock()
            .unwrap()
            .iter()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect();
        Ok(Page { total: items.len() as u64, items })
    }

    async fn list_books(&self, _library_id: &str, _show_all: bool, _page: u64, _size: u64) -> Result<Page<Book>, ServiceError> {
        self.record("list_books");
        Self::fail(&self.fail_list)?;
        let items = self.books.lock().unwrap().clone();
        Ok(Page { total: items.len() as u64, items })
    }

    async fn list_books_by_ids(&self, ids: &[String]) -> Result<Page<Book>, ServiceError> {
        self.record("list_books_by_ids");
        tokio::task::yield_now().await;
        Self::fail(&self.fail_books_by_ids)?;
        let items: Vec<_> = self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| ids.contains(&b.id))
            .cloned()
            .collect();
        Ok(Page { total: items.len() as u64, items })
    }

    async fn obtain_book(&self, library_id: &str, book_id: &str) -> Result<ReservedBook, ServiceError> {
        self.record(format!("obtain_book {library_id} {book_id}"));
        Self::fail(&self.fail_obtain)?;
        let book = self
            .books
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == book_id)
            .cloned()
            .unwrap_or_default();
        let library = self
            .libraries
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == library_id)
            .cloned()
            .unwrap_or_default();
        Ok(ReservedBook { book, library })
    }

    async fn return_book(&self, library_id: &str, book_id: &str) -> Result<Book, ServiceError> {
        self.record(format!("return_book {library_id} {book_id}"));
        self.books
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == book_id)
            .cloned()
            .ok_or_else(|| ServiceError::InvalidResponse {
                service: "library",
                reason: "status 404".into(),
            })
    }
}

#[derive(Default)]
pub struct FakeRating {
    pub stars: Mutex<u64>,
    pub updates: Mutex<Vec<(String, i64)>>,
    pub fail_get: Mutex<Option<ServiceError>>,
    pub fail_update: Mutex<Option<ServiceError>>,
}

impl FakeRating {
    pub fn with_stars(stars: u64) -> Self {
        Self {
            stars: Mutex::new(stars),
            ..Default::default()
        }
    }

    pub fn diffs(&self) -> Vec<i64> {
        self.updates.lock().unwrap().iter().map(|(_, d)| *d).collect()
    }
}

#[async_trait]
impl RatingApi for FakeRating {
    async fn get_user_rating(&self, _username: &str) -> Result<Rating, ServiceError> {
        if let Some(e) = self.fail_get.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(Rating {
            stars: *self.stars.lock().unwrap(),
        })
    }

    async fn update_user_rating(&self, username: &str, diff: i64) -> Result<(), ServiceError> {
        self.updates.lock().unwrap().push((username.to_string(), diff));
        match self.fail_update.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct FakeReservations {
    pub records: Mutex<Vec<Reservation>>,
    pub added: Mutex<Vec<Reservation>>,
    pub status_updates: Mutex<Vec<(String, ReservationStatus)>>,
    pub fail_get: Mutex<Option<ServiceError>>,
    pub fail_add: Mutex<Option<ServiceError>>,
}

impl FakeReservations {
    pub fn with(records: Vec<Reservation>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn added(&self) -> Vec<Reservation> {
        self.added.lock().unwrap().clone()
    }

    pub fn status_updates(&self) -> Vec<(String, ReservationStatus)> {
        self.status_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReservationApi for FakeReservations {
    async fn get_user_reservations(
        &self,
        username: &str,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<Reservation>, ServiceError> {
        if let Some(e) = self.fail_get.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.username == username)
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect())
    }

    async fn add_reservation(&self, reservation: &Reservation) -> Result<String, ServiceError> {
        if let Some(e) = self.fail_add.lock().unwrap().clone() {
            return Err(e);
        }
        let mut records = self.records.lock().unwrap();
        let id = format!("r-{}", records.len() + 1);
        let mut stored = reservation.clone();
        stored.id = id.clone();
        records.push(stored.clone());
        self.added.lock().unwrap().push(stored);
        Ok(id)
    }

    async fn set_reservation_status(&self, id: &str, status: ReservationStatus) -> Result<(), ServiceError> {
        self.status_updates.lock().unwrap().push((id.to_string(), status));
        if let Some(r) = self.records.lock().unwrap().iter_mut().find(|r| r.id == id) {
            r.status = status;
        }
        Ok(())
    }
}

/// The three fakes plus an orchestrator wired to them.
pub struct Harness {
    pub library: Arc<FakeLibrary>,
    pub rating: Arc<FakeRating>,
    pub reservations: Arc<FakeReservations>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new(library: FakeLibrary, rating: FakeRating, reservations: FakeReservations) -> Self {
        let library = Arc::new(library);
        let rating = Arc::new(rating);
        let reservations = Arc::new(reservations);
        let orchestrator = Orchestrator::new(library.clone(), rating.clone(), reservations.clone());
        Self {
            library,
            rating,
            reservations,
            orchestrator,
        }
    }
}
