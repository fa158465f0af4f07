//! Failure injection tests for the backend clients.
//!
//! Each test runs the real reqwest clients against a wiremock server and
//! checks how failures are classified and how the breaker reacts.

use std::sync::Arc;
use std::time::Duration;

use library_gateway::backends::{
    build_client, HttpBackend, LibraryApi, LibraryClient, RatingApi, RatingClient,
    ReservationApi, ReservationClient, ServiceError,
};
use library_gateway::config::TimeoutConfig;
use library_gateway::domain::ReservationStatus;
use library_gateway::resilience::{CircuitBreaker, RetryQueue};
use library_gateway::Shutdown;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(service: &'static str, address: &str, max_fails: u64) -> (HttpBackend, Arc<CircuitBreaker>) {
    let breaker = Arc::new(CircuitBreaker::new(max_fails, Duration::from_secs(60)));
    let client = build_client(&TimeoutConfig::default()).unwrap();
    let http = HttpBackend::new(service, address, client, breaker.clone()).unwrap();
    (http, breaker)
}

fn books_page() -> serde_json::Value {
    json!({
        "total": 1,
        "items": [{
            "id": "b1",
            "name": "Dune",
            "author": "Frank Herbert",
            "genre": "Science Fiction",
            "condition": "EXCELLENT",
            "available_count": 2
        }]
    })
}

/// Poll `check` until it holds or two seconds pass.
async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test]
async fn test_server_error_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/libraries/l1/books"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (http, breaker) = backend("library", &server.uri(), 3);
    let client = LibraryClient::new(http);

    let err = client.list_books("l1", false, 1, 10).await.unwrap_err();
    assert!(
        matches!(&err, ServiceError::InvalidResponse { service: "library", reason } if reason == "status 500"),
        "{err:?}"
    );
    assert_eq!(breaker.state("library.get_books").failure_count, 1);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/books"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let (http, _) = backend("library", &server.uri(), 3);
    let client = LibraryClient::new(http);

    let err = client.list_books_by_ids(&["b1".into()]).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse { .. }), "{err:?}");
}

#[tokio::test]
async fn test_refused_connection_is_unavailable() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (http, breaker) = backend("rating", &format!("http://{addr}"), 3);
    let shutdown = Shutdown::new();
    let queue = Arc::new(RetryQueue::new(Duration::from_secs(1), Duration::from_secs(1), shutdown));
    let client = RatingClient::new(http, queue);

    let err = client.get_user_rating("alice").await.unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable { service: "rating", .. }), "{err:?}");
    assert!(err.is_unavailable());
    assert_eq!(breaker.state("rating.get_user_rating").failure_count, 1);
}

#[tokio::test]
async fn test_circuit_opens_after_max_fails_and_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/libraries"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let (http, _) = backend("library", &server.uri(), 2);
    let client = LibraryClient::new(http);

    for _ in 0..2 {
        let err = client.list_libraries("Moscow", 1, 10).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse { .. }));
    }

    // Third call never reaches the server; `expect(2)` is checked on drop.
    let err = client.list_libraries("Moscow", 1, 10).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::CircuitOpen {
            operation: "library.get_libraries".into()
        }
    );

    // Other operations of the same backend are unaffected.
    let other = client.list_books_by_ids(&["b1".into()]).await.unwrap_err();
    assert!(!other.is_circuit_open());
}

#[tokio::test]
async fn test_success_releases_breaker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/books"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/books"))
        .and(query_param("ids", r#"["b1"]"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(books_page()))
        .mount(&server)
        .await;

    let (http, breaker) = backend("library", &server.uri(), 3);
    let client = LibraryClient::new(http);
    let ids = vec!["b1".to_string()];

    assert!(client.list_books_by_ids(&ids).await.is_err());
    assert!(client.list_books_by_ids(&ids).await.is_err());
    assert_eq!(breaker.state("library.get_books_by_ids").failure_count, 2);

    let page = client.list_books_by_ids(&ids).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].author, "Frank Herbert");
    assert_eq!(breaker.state("library.get_books_by_ids").failure_count, 0);
}

#[tokio::test]
async fn test_zero_size_requests_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/libraries"))
        .and(query_param("city", "Moscow"))
        .and(query_param("size", u64::MAX.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0, "items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let (http, _) = backend("library", &server.uri(), 3);
    let page = LibraryClient::new(http).list_libraries("Moscow", 1, 0).await.unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_obtain_book_posts_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/books"))
        .and(body_json(json!({"book_id": "b1", "library_id": "l1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "book": books_page()["items"][0],
            "library": {"id": "l1", "name": "Central", "address": "Main St 1", "city": "Moscow"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (http, _) = backend("library", &server.uri(), 3);
    let reserved = LibraryClient::new(http).obtain_book("l1", "b1").await.unwrap();
    assert_eq!(reserved.book.id, "b1");
    assert_eq!(reserved.library.name, "Central");
}

#[tokio::test]
async fn test_reservations_carry_user_and_status_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/reservations"))
        .and(header("X-User-Name", "alice"))
        .and(query_param("status", "RENTED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "r-1",
            "status": "RENTED",
            "start": "2024-03-01T00:00:00Z",
            "end": "2024-03-10T00:00:00Z",
            "library_id": "l1",
            "book_id": "b1"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let (http, _) = backend("reservation", &server.uri(), 3);
    let client = ReservationClient::new(http);

    let list = client
        .get_user_reservations("alice", Some(ReservationStatus::Rented))
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].username, "alice");
    assert_eq!(list[0].status, ReservationStatus::Rented);
    assert_eq!(list[0].book_id, "b1");
}

#[tokio::test]
async fn test_failed_rating_update_is_deferred() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/rating"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (http, _) = backend("rating", &server.uri(), 100);
    let shutdown = Shutdown::new();
    let queue = Arc::new(RetryQueue::new(
        Duration::from_secs(3600),
        Duration::from_secs(1),
        shutdown.clone(),
    ));
    let client = RatingClient::new(http, queue.clone());

    client
        .update_user_rating("alice", -10)
        .await
        .expect("rating writes are accepted even when the service is down");

    assert!(eventually(|| queue.len() == 1).await, "correction queued");
    assert!(queue.is_started());
    assert_eq!(client.pending_corrections(), 1);
    shutdown.trigger();
}

#[tokio::test]
async fn test_deferred_rating_update_is_redelivered() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/rating"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/rating"))
        .and(header("X-User-Name", "bob"))
        .and(query_param("diff", "1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (http, breaker) = backend("rating", &server.uri(), 100);
    let shutdown = Shutdown::new();
    let queue = Arc::new(RetryQueue::new(
        Duration::from_millis(50),
        Duration::from_secs(1),
        shutdown.clone(),
    ));
    let client = RatingClient::new(http, queue.clone());

    client.update_user_rating("bob", 1).await.unwrap();

    assert!(eventually(|| queue.is_started()).await);
    assert!(eventually(|| queue.is_empty()).await, "correction delivered");
    assert!(
        eventually(|| breaker.state("rating.update_user_rating").failure_count == 0).await
    );
    shutdown.trigger();
}

#[tokio::test]
async fn test_path_ids_stay_inside_their_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/rating"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stars": 7})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/libraries/[^/]+/books$"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0, "items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let (http, _) = backend("library", &server.uri(), 3);
    let client = LibraryClient::new(http);

    let page = client
        .list_books("../../v1/rating?x=", true, 1, 10)
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let url = &requests[0].url;
    assert!(url.path().starts_with("/api/v1/libraries/"), "{url}");
    assert!(url.path().ends_with("/books"), "{url}");
    assert!(!url.query_pairs().any(|(k, _)| k == "x"), "{url}");
}

#[tokio::test]
async fn test_dot_segment_ids_are_rejected_without_a_call() {
    let server = MockServer::start().await;
    let (http, breaker) = backend("library", &server.uri(), 1);
    let client = LibraryClient::new(http);

    for id in ["..", ".", ""] {
        let err = client.list_books(id, false, 1, 10).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest { service: "library", .. }), "{err:?}");
    }
    let err = client.return_book("l1", "..").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRequest { .. }), "{err:?}");

    // Caller mistakes are not backend failures.
    assert_eq!(breaker.state("library.get_books").failure_count, 0);
    assert_eq!(breaker.state("library.return_book").failure_count, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reservation_status_update_encodes_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/reservations/a%2Fb%3Fc"))
        .and(query_param("status", "RETURNED"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (http, _) = backend("reservation", &server.uri(), 3);
    ReservationClient::new(http)
        .set_reservation_status("a/b?c", ReservationStatus::Returned)
        .await
        .unwrap();
}
