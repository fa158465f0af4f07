//! Library (catalog) service client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backends::{HttpBackend, LibraryApi, ServiceError};
use crate::domain::{Book, Library, Page, ReservedBook};

#[derive(Debug, Serialize)]
struct BookRequest<'a> {
    book_id: &'a str,
    library_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReturnBookResponse {
    book: Book,
}

/// Page size sent when the caller asked for "everything".
fn effective_size(size: u64) -> u64 {
    if size == 0 {
        u64::MAX
    } else {
        size
    }
}

#[derive(Debug)]
pub struct LibraryClient {
    http: HttpBackend,
}

impl LibraryClient {
    pub fn new(http: HttpBackend) -> Self {
        Self { http }
    }

    fn ids_param(&self, ids: &[String]) -> Result<String, ServiceError> {
        serde_json::to_string(ids).map_err(|e| ServiceError::InvalidResponse {
            service: self.http.service(),
            reason: format!("encode ids: {e}"),
        })
    }
}

#[async_trait]
impl LibraryApi for LibraryClient {
    async fn list_libraries(
        &self,
        city: &str,
        page: u64,
        size: u64,
    ) -> Result<Page<Library>, ServiceError> {
        self.http
            .guarded("get_libraries", || async {
                let url = self.http.url(&["api", "v1", "libraries"])?;
                let request = self.http.client().get(url).query(&[
                    ("city", city.to_string()),
                    ("page", page.to_string()),
                    ("size", effective_size(size).to_string()),
                ]);
                self.http.send_json(request).await
            })
            .await
    }

    async fn list_libraries_by_ids(&self, ids: &[String]) -> Result<Page<Library>, ServiceError> {
        self.http
            .guarded("get_libraries_by_ids", || async {
                let url = self.http.url(&["api", "v1", "libraries"])?;
                let request = self
                    .http
                    .client()
                    .get(url)
                    .query(&[("ids", self.ids_param(ids)?)]);
                self.http.send_json(request).await
            })
            .await
    }

    async fn list_books(
        &self,
        library_id: &str,
        show_all: bool,
        page: u64,
        size: u64,
    ) -> Result<Page<Book>, ServiceError> {
        let url = self
            .http
            .url(&["api", "v1", "libraries", library_id, "books"])?;
        self.http
            .guarded("get_books", || async {
                let mut query = vec![
                    ("page", page.to_string()),
                    ("size", effective_size(size).to_string()),
                ];
                if show_all {
                    query.push(("show_all", "1".to_string()));
                }
                let request = self.http.client().get(url).query(&query);
                self.http.send_json(request).await
            })
            .await
    }

    async fn list_books_by_ids(&self, ids: &[String]) -> Result<Page<Book>, ServiceError> {
        self.http
            .guarded("get_books_by_ids", || async {
                let url = self.http.url(&["api", "v1", "books"])?;
                let request = self
                    .http
                    .client()
                    .get(url)
                    .query(&[("ids", self.ids_param(ids)?)]);
                self.http.send_json(request).await
            })
            .await
    }

    async fn obtain_book(
        &self,
        library_id: &str,
        book_id: &str,
    ) -> Result<ReservedBook, ServiceError> {
        self.http
            .guarded("obtain_book", || async {
                let url = self.http.url(&["api", "v1", "books"])?;
                let request = self.http.client().post(url).json(&BookRequest {
                    book_id,
                    library_id,
                });
                self.http.send_json(request).await
            })
            .await
    }

    async fn return_book(&self, library_id: &str, book_id: &str) -> Result<Book, ServiceError> {
        let url = self.http.url(&[
            "api",
            "v1",
            "libraries",
            library_id,
            "books",
            book_id,
            "return",
        ])?;
        self.http
            .guarded("return_book", || async {
                let request = self.http.client().post(url).json(&BookRequest {
                    book_id,
                    library_id,
                });
                let response: ReturnBookResponse = self.http.send_json(request).await?;
                Ok(response.book)
            })
            .await
    }
}
