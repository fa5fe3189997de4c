//! Router smoke tests: status codes and bodies for each webhook outcome.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use stockist_sync::webhook_service::router;
use tower::ServiceExt;

use crate::common::{self, InMemoryFileStore, StaticCustomerFetcher};

fn app(fetcher: StaticCustomerFetcher, store: Arc<InMemoryFileStore>) -> Router {
    router(Arc::new(common::service(fetcher, store)))
}

fn jane_app(content: &str) -> (Router, Arc<InMemoryFileStore>) {
    let jane = common::profile("42", "Jane", "Doe", "jane@doe.example", "12 Elm St");
    let store = Arc::new(InMemoryFileStore::new(content));
    (app(StaticCustomerFetcher::with(vec![jane]), store.clone()), store)
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn add_then_add_again() {
    let (app, store) = jane_app("\"Acme\",\"4 Oak Ave\"");

    let (status, body) = send(app.clone(), post("/api/add", r#"{"customer":{"id":42}}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Customer added to CSV");
    let after_first = store.content();

    let (status, body) = send(app, post("/api/add", r#"{"customer":{"id":"42"}}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Customer already exists");
    assert_eq!(store.content(), after_first);
}

#[tokio::test]
async fn remove_returns_ok() {
    let (app, store) = jane_app("\"Jane Doe\",\"12 Elm St\"\n\"Acme\",\"4 Oak Ave\"");

    let (status, body) = send(app, post("/api/remove", r#"{"customer":{"id":42}}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Customer removed from CSV");
    assert_eq!(store.content(), "\"Acme\",\"4 Oak Ave\"");
}

#[tokio::test]
async fn non_post_is_405() {
    let (app, store) = jane_app("");
    let request = Request::builder().method("GET").uri("/api/add").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, "Only POST supported");
    assert_eq!(store.read_count(), 0);
}

#[tokio::test]
async fn bad_payloads_are_400_without_io() {
    for payload in ["", "{", r#"{"customer":{}}"#, r#"{"customer":{"id":true}}"#] {
        let (app, store) = jane_app("");
        let (status, body) = send(app, post("/api/remove", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload:?}");
        assert_eq!(body, "Missing customer ID");
        assert_eq!(store.read_count(), 0);
    }
}

#[tokio::test]
async fn conflict_is_409() {
    let (app, store) = jane_app("\"Acme\",\"4 Oak Ave\"");
    store.race_next_write_with("\"Someone else\"");

    let (status, _) = send(app, post("/api/add", r#"{"customer":{"id":42}}"#)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(store.content(), "\"Someone else\"");
}

#[tokio::test]
async fn upstream_failure_is_500() {
    let store = Arc::new(InMemoryFileStore::new(""));
    let app = app(StaticCustomerFetcher::unavailable(), store);

    let (status, body) = send(app, post("/api/add", r#"{"customer":{"id":1}}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Upstream service failed");
}

#[tokio::test]
async fn unknown_customer_is_404() {
    let (app, _) = jane_app("");
    let (status, _) = send(app, post("/api/add", r#"{"customer":{"id":7}}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_file_is_generic_500() {
    let jane = common::profile("42", "Jane", "Doe", "jane@doe.example", "12 Elm St");
    let app = app(StaticCustomerFetcher::with(vec![jane]), Arc::new(InMemoryFileStore::missing()));

    let (status, body) = send(app, post("/api/add", r#"{"customer":{"id":42}}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal server error");
}

#[tokio::test]
async fn health_check() {
    let (app, _) = jane_app("");
    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
