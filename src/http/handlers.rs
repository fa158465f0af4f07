//! API handlers: translate between JSON and the orchestrator.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{self, BorrowedBook, UserReservation};
use crate::http::request::{start_of_day, Username};
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrariesQuery {
    pub city: String,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooksQuery {
    #[serde(default)]
    pub show_all: bool,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default)]
    pub size: u64,
}

fn default_page() -> u64 {
    1
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub page: u64,
    pub page_size: u64,
    pub total_elements: u64,
    pub items: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryView {
    pub library_uid: String,
    pub name: String,
    pub address: String,
    pub city: String,
}

impl From<domain::Library> for LibraryView {
    fn from(l: domain::Library) -> Self {
        Self {
            library_uid: l.id,
            name: l.name,
            address: l.address,
            city: l.city,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub book_uid: String,
    pub name: String,
    pub author: String,
    pub genre: String,
    pub condition: String,
    pub available_count: u64,
}

impl From<domain::Book> for BookView {
    fn from(b: domain::Book) -> Self {
        Self {
            book_uid: b.id,
            name: b.name,
            author: b.author,
            genre: b.genre,
            condition: b.condition,
            available_count: b.available_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    pub reservation_uid: String,
    pub status: domain::ReservationStatus,
    pub start_date: NaiveDate,
    pub till_date: NaiveDate,
    pub book: BookView,
    pub library: LibraryView,
}

impl From<UserReservation> for ReservationView {
    fn from(r: UserReservation) -> Self {
        Self {
            reservation_uid: r.id,
            status: r.status,
            start_date: r.start.date_naive(),
            till_date: r.end.date_naive(),
            book: r.book.into(),
            library: r.library.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeBookRequest {
    pub book_uid: String,
    pub library_uid: String,
    pub till_date: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeBookResponse {
    #[serde(flatten)]
    pub reservation: ReservationView,
    pub rating: domain::Rating,
}

impl From<BorrowedBook> for TakeBookResponse {
    fn from(b: BorrowedBook) -> Self {
        let reservation = UserReservation {
            id: b.reservation.id,
            username: b.reservation.username,
            status: b.reservation.status,
            start: b.reservation.start,
            end: b.reservation.end,
            book: b.reserved.book,
            library: b.reserved.library,
        };
        Self {
            reservation: reservation.into(),
            rating: b.rating,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnBookRequest {
    pub condition: String,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub pending_rating_corrections: usize,
}

pub async fn list_libraries(
    State(state): State<AppState>,
    Query(query): Query<LibrariesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let libraries = state
        .orchestrator
        .list_libraries(&query.city, query.page, query.size)
        .await?;

    Ok(Json(PageResponse {
        page: query.page,
        page_size: query.size,
        total_elements: libraries.total,
        items: libraries
            .items
            .into_iter()
            .map(LibraryView::from)
            .collect(),
    }))
}

pub async fn list_books(
    State(state): State<AppState>,
    Path(library_uid): Path<String>,
    Query(query): Query<BooksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let books = state
        .orchestrator
        .list_books(&library_uid, query.show_all, query.page, query.size)
        .await?;

    Ok(Json(PageResponse {
        page: query.page,
        page_size: query.size,
        total_elements: books.total,
        items: books.items.into_iter().map(BookView::from).collect(),
    }))
}

pub async fn get_rating(
    State(state): State<AppState>,
    Username(username): Username,
) -> Result<impl IntoResponse, ApiError> {
    let rating = state.orchestrator.get_user_rating(&username).await?;
    Ok(Json(rating))
}

pub async fn list_reservations(
    State(state): State<AppState>,
    Username(username): Username,
) -> Result<impl IntoResponse, ApiError> {
    let reservations = state.orchestrator.get_user_reservations(&username).await?;
    Ok(Json(
        reservations
            .into_iter()
            .map(ReservationView::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn take_book(
    State(state): State<AppState>,
    Username(username): Username,
    Json(request): Json<TakeBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let borrowed = state
        .orchestrator
        .take_book(
            &username,
            &request.library_uid,
            &request.book_uid,
            start_of_day(request.till_date),
        )
        .await?;

    Ok(Json(TakeBookResponse::from(borrowed)))
}

pub async fn return_book(
    State(state): State<AppState>,
    Username(username): Username,
    Path(reservation_uid): Path<String>,
    Json(request): Json<ReturnBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let date: DateTime<Utc> = start_of_day(request.date);
    let summary = state
        .orchestrator
        .return_book(&username, &reservation_uid, &request.condition, date)
        .await?;

    tracing::info!(
        username = %username,
        reservation_uid = %reservation_uid,
        status = %summary.status,
        rating_change = summary.rating_change,
        "Book returned"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        pending_rating_corrections: state.pending_corrections(),
    })
}
