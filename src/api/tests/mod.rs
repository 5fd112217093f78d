use super::*;
use crate::crawler::test_helpers::{MockSiteClient, setup_crawler, valid_stub, wait_for};
use crate::types::{CrawlProgress, Status};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

/// Build a router over a crawler wired to the given mock site
async fn test_app(
    site: MockSiteClient,
) -> (Router, std::sync::Arc<NewsCrawler>, tempfile::NamedTempFile) {
    let (crawler, _site, temp) = setup_crawler(site).await;
    let crawler = std::sync::Arc::new(crawler);
    let config = crawler.get_config();
    (create_router(crawler.clone(), config), crawler, temp)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _crawler, _temp) = test_app(MockSiteClient::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn start_launches_a_session_and_status_polls_it() {
    let site = MockSiteClient::new().with_list_page(1, vec![valid_stub("a1"), valid_stub("a2")]);
    let (app, crawler, _temp) = test_app(site).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/crawl/start")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"startPage": 1, "endPage": 1, "cookie": "session=abc"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let progress: CrawlProgress = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(progress.status, Status::Running);
    assert_eq!(progress.total_pages, 1);

    let id = progress.session_id;
    wait_for(&crawler, id, "session completes", |p| p.status == Status::Completed).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/crawl/sessions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "completed");
    assert_eq!(json["crawledNews"], 2);
    assert_eq!(json["pendingNews"], 0);
}

#[tokio::test]
async fn start_rejects_bad_range_with_400() {
    let (app, _crawler, _temp) = test_app(MockSiteClient::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/crawl/start")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"startPage": 9, "endPage": 2, "cookie": "c"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "invalid_page_range");
}

#[tokio::test]
async fn status_of_unknown_session_is_404() {
    let (app, _crawler, _temp) = test_app(MockSiteClient::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/crawl/sessions/9999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn pause_of_non_running_session_is_409() {
    let (app, _crawler, _temp) = test_app(MockSiteClient::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/crawl/sessions/1/pause")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "invalid_state");
}

#[tokio::test]
async fn retry_failed_returns_affected_count() {
    let (app, crawler, _temp) = test_app(MockSiteClient::new()).await;

    crawler
        .db
        .insert_stubs(&[valid_stub("r1"), valid_stub("r2")])
        .await
        .unwrap();
    crawler.db.mark_article_failed("r1", "boom").await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/crawl/retry-failed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn stats_counts_articles_by_status() {
    let (app, crawler, _temp) = test_app(MockSiteClient::new()).await;

    crawler
        .db
        .insert_stubs(&[valid_stub("s1"), valid_stub("s2"), valid_stub("s3")])
        .await
        .unwrap();
    crawler.db.mark_article_failed("s3", "boom").await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 3);
    assert_eq!(json["pending"], 2);
    assert_eq!(json["failed"], 1);
}

#[tokio::test]
async fn sessions_listing_returns_recent_first() {
    let (app, crawler, _temp) = test_app(MockSiteClient::new()).await;

    crawler.db.create_session("first", 1).await.unwrap();
    crawler.db.create_session("second", 1).await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/crawl/sessions?limit=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let sessions = json.as_array().unwrap();
    assert_eq!(sessions.len(), 2);
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (app, _crawler, _temp) = test_app(MockSiteClient::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn openapi_spec_is_served() {
    let (app, _crawler, _temp) = test_app(MockSiteClient::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/crawl/start"].is_object());
}
