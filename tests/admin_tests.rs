//! Integration tests for the admin trigger and its HTTP routes

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use clipcrawl::admin::{router, AdminToken, AdminTrigger, AuthError};
use clipcrawl::config::{CrawlDefaults, CrawlParams};
use clipcrawl::storage::{MediaStore, SqliteStorage};
use clipcrawl::IngestError;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-admin-token";

fn create_trigger(store: Arc<SqliteStorage>) -> AdminTrigger {
    AdminTrigger::new(
        AdminToken::new(TOKEN).unwrap(),
        store,
        reqwest::Client::new(),
        Duration::from_secs(5),
        CrawlDefaults::default(),
    )
}

fn create_app(store: Arc<SqliteStorage>) -> Router {
    router(create_trigger(store))
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_exercise_site(server: &MockServer, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><body>
                    <div class="exercise-card">
                        <span class="exercise-name">Kettlebell Swing</span>
                        <iframe src="https://player.vimeo.com/video/76979871"></iframe>
                    </div>
                    </body></html>"#,
                )
                .insert_header("content-type", "text/html"),
        )
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_wrong_token_never_fetches() {
    let mock_server = MockServer::start().await;
    mount_exercise_site(&mock_server, 0).await;

    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let trigger = create_trigger(store.clone());
    let params = CrawlParams {
        seeds: Some(vec![format!("{}/", mock_server.uri())]),
        ..CrawlParams::default()
    };

    let wrong = trigger
        .trigger_crawl(Some("not-the-token"), params.clone())
        .await
        .unwrap_err();
    assert!(matches!(
        wrong,
        IngestError::Unauthorized(AuthError::InvalidToken)
    ));

    let missing = trigger.trigger_crawl(None, params).await.unwrap_err();
    assert!(matches!(
        missing,
        IngestError::Unauthorized(AuthError::MissingToken)
    ));

    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_trigger_crawl_runs_job_and_saves_media() {
    let mock_server = MockServer::start().await;
    mount_exercise_site(&mock_server, 1).await;

    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let params = CrawlParams {
        seeds: Some(vec![format!("{}/", mock_server.uri())]),
        max_depth: Some(0),
        max_pages: Some(5),
        delay_ms: Some(0),
    };

    let summary = create_trigger(store.clone())
        .trigger_crawl(Some(TOKEN), params)
        .await
        .unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.media_saved, 1);
    assert_eq!(
        store.get("Kettlebell Swing").unwrap().unwrap().video_url,
        "https://player.vimeo.com/video/76979871"
    );
}

#[tokio::test]
async fn test_health() {
    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let response = create_app(store)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_ingest_without_token_is_unauthorized() {
    let mock_server = MockServer::start().await;
    mount_exercise_site(&mock_server, 0).await;

    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let response = create_app(store)
        .oneshot(post_json(
            "/admin/ingest",
            None,
            json!({ "seeds": [format!("{}/", mock_server.uri())] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["success"], false);
}

#[tokio::test]
async fn test_ingest_checks_token_before_body() {
    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let request = Request::builder()
        .method("POST")
        .uri("/admin/ingest")
        .header("authorization", "Bearer wrong")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = create_app(store).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ingest_invalid_config_is_bad_request() {
    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let response = create_app(store)
        .oneshot(post_json(
            "/admin/ingest",
            Some(TOKEN),
            json!({ "seeds": ["https://example.com/"], "maxPages": 0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("maxPages"));
}

#[tokio::test]
async fn test_ingest_bad_seed_is_bad_request() {
    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let response = create_app(store)
        .oneshot(post_json(
            "/admin/ingest",
            Some(TOKEN),
            json!({ "seeds": ["ftp://example.com/file"] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ingest_success_response_shape() {
    let mock_server = MockServer::start().await;
    mount_exercise_site(&mock_server, 1).await;

    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let response = create_app(store)
        .oneshot(post_json(
            "/admin/ingest",
            Some(TOKEN),
            json!({
                "seeds": [format!("{}/", mock_server.uri())],
                "maxDepth": 0,
                "delayMs": 0,
                "maxPages": 3
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["saved"][0]["name"], "Kettlebell Swing");
    assert!(body.get("errors").is_none());
    assert_eq!(body["summary"]["state"], "completed");
    assert_eq!(body["summary"]["pagesFetched"], 1);
    assert_eq!(body["summary"]["mediaSaved"], 1);
}

#[tokio::test]
async fn test_media_accepts_x_admin_token_and_skips_incomplete() {
    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let request = Request::builder()
        .method("POST")
        .uri("/admin/media")
        .header("content-type", "application/json")
        .header("x-admin-token", TOKEN)
        .body(Body::from(
            json!([
                { "name": "Bench Press", "video_url": "https://youtu.be/bench" },
                { "name": "Bench Press", "video_url": "https://youtu.be/bench2" },
                { "name": "Pull Up" },
                { "video_url": "https://youtu.be/orphan" }
            ])
            .to_string(),
        ))
        .unwrap();

    let response = create_app(store.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["skipped"], 2);
    assert_eq!(body["saved"].as_array().unwrap().len(), 1);
    assert_eq!(
        store.get("Bench Press").unwrap().unwrap().video_url,
        "https://youtu.be/bench2"
    );
}

#[tokio::test]
async fn test_media_token_header_variants() {
    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let app = create_app(store.clone());
    let body = json!([{ "name": "Deadlift", "video_url": "https://youtu.be/dl" }]).to_string();

    let lowercase_scheme = Request::builder()
        .method("POST")
        .uri("/admin/media")
        .header("authorization", format!("bearer {}", TOKEN))
        .body(Body::from(body.clone()))
        .unwrap();
    let response = app.clone().oneshot(lowercase_scheme).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A foreign Authorization header does not hide a valid x-admin-token
    let proxied = Request::builder()
        .method("POST")
        .uri("/admin/media")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .header("x-admin-token", TOKEN)
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(proxied).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(store.count().unwrap(), 1);
}

#[tokio::test]
async fn test_media_rejects_non_array_body() {
    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let response = create_app(store)
        .oneshot(post_json(
            "/admin/media",
            Some(TOKEN),
            json!({ "name": "Squat", "video_url": "https://youtu.be/sq" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_media_wrong_token_writes_nothing() {
    let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let response = create_app(store.clone())
        .oneshot(post_json(
            "/admin/media",
            Some("nope"),
            json!([{ "name": "Squat", "video_url": "https://youtu.be/sq" }]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.count().unwrap(), 0);
}
