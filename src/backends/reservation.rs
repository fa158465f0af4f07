//! Reservation service client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backends::http::USER_HEADER;
use crate::backends::{HttpBackend, ReservationApi, ServiceError};
use crate::domain::{Reservation, ReservationStatus};

#[derive(Debug, Deserialize)]
struct ReservationRecord {
    id: String,
    status: ReservationStatus,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    library_id: String,
    book_id: String,
}

#[derive(Debug, Serialize)]
struct AddReservationRequest<'a> {
    status: ReservationStatus,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    book_id: &'a str,
    library_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct AddReservationResponse {
    id: String,
}

#[derive(Debug)]
pub struct ReservationClient {
    http: HttpBackend,
}

impl ReservationClient {
    pub fn new(http: HttpBackend) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReservationApi for ReservationClient {
    async fn get_user_reservations(
        &self,
        username: &str,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<Reservation>, ServiceError> {
        self.http
            .guarded("get_user_reservations", || async {
                let url = self.http.url(&["api", "v1", "reservations"])?;
                let mut request = self.http.client().get(url).header(USER_HEADER, username);
                if let Some(status) = status {
                    request = request.query(&[("status", status.as_str())]);
                }

                let records: Vec<ReservationRecord> = self.http.send_json(request).await?;
                Ok(records
                    .into_iter()
                    .map(|r| Reservation {
                        id: r.id,
                        username: username.to_string(),
                        status: r.status,
                        start: r.start,
                        end: r.end,
                        library_id: r.library_id,
                        book_id: r.book_id,
                    })
                    .collect())
            })
            .await
    }

    async fn add_reservation(&self, reservation: &Reservation) -> Result<String, ServiceError> {
        self.http
            .guarded("add_user_reservation", || async {
                let url = self.http.url(&["api", "v1", "reservations"])?;
                let request = self
                    .http
                    .client()
                    .post(url)
                    .header(USER_HEADER, &reservation.username)
                    .json(&AddReservationRequest {
                        status: reservation.status,
                        start: reservation.start,
                        end: reservation.end,
                        book_id: &reservation.book_id,
                        library_id: &reservation.library_id,
                    });
                let response: AddReservationResponse = self.http.send_json(request).await?;
                Ok(response.id)
            })
            .await
    }

    async fn set_reservation_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> Result<(), ServiceError> {
        let url = self.http.url(&["api", "v1", "reservations", id])?;
        self.http
            .guarded("set_user_reservation_status", || async {
                let request = self
                    .http
                    .client()
                    .patch(url)
                    .query(&[("status", status.as_str())]);
                self.http.send(request).await
            })
            .await
    }
}
