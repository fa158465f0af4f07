//! Reservation records and their enriched views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::library::{Book, Library, ReservedBook};
use crate::domain::rating::Rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Rented,
    Returned,
    Expired,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rented => "RENTED",
            Self::Returned => "RETURNED",
            Self::Expired => "EXPIRED",
        }
    }

    /// Status a rented book ends up in when handed back on `date`.
    pub fn on_return(date: DateTime<Utc>, due: DateTime<Utc>) -> Self {
        if date > due {
            Self::Expired
        } else {
            Self::Returned
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RENTED" => Ok(Self::Rented),
            "RETURNED" => Ok(Self::Returned),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(format!("unknown reservation status '{other}'")),
        }
    }
}

/// A reservation as stored by the reservation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Empty until the reservation service assigns one.
    #[serde(default)]
    pub id: String,
    pub username: String,
    pub status: ReservationStatus,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub library_id: String,
    pub book_id: String,
}

/// A reservation joined with its book and library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserReservation {
    pub id: String,
    pub username: String,
    pub status: ReservationStatus,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Default (empty) when the catalog did not return the referenced entity.
    pub book: Book,
    pub library: Library,
}

/// Result of a successful borrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorrowedBook {
    pub reservation: Reservation,
    pub reserved: ReservedBook,
    /// Rating as read before the loan was granted.
    pub rating: Rating,
}
