//! Integration tests for the HTTP API.
//!
//! Runs the router against the in-memory store; no database required.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tc_server::api::{AppState, create_router};
use tournament_clock::{MemoryStore, TournamentManager};
use tower::ServiceExt; // For `oneshot` method
use uuid::Uuid;

/// Helper to create a test router over the in-memory store
fn create_test_server() -> (Router, Arc<TournamentManager>) {
    let store = Arc::new(MemoryStore::new());
    let manager = Arc::new(TournamentManager::new(store));

    let state = AppState {
        manager: manager.clone(),
        debug_errors: false,
    };

    (create_router(state), manager)
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn send_get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn create_standard(app: &Router) -> Uuid {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/tournaments",
        json!({
            "name": "Friday Deepstack",
            "buy_in": 100,
            "reentry_fee": 100,
            "guaranteed_prize_pool": 1000,
            "location_tag": "main-room"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    body["id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("response should contain a tournament id")
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server();

    let (status, body) = send_get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tournaments"]["active_count"], 0);
}

#[tokio::test]
async fn test_create_tournament() {
    let (app, manager) = create_test_server();

    let id = create_standard(&app).await;

    assert_eq!(manager.active_tournament_count().await, 1);
    assert!(manager.get_tournament(id).await.is_some());
}

#[tokio::test]
async fn test_create_tournament_validation_collects_all_errors() {
    let (app, manager) = create_test_server();

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/tournaments",
        json!({
            "name": "",
            "buy_in": -50,
            "levels": []
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body["errors"].as_array().expect("errors should be a list");
    assert!(errors.len() >= 2, "got: {:?}", errors);

    // Nothing created on validation failure
    assert_eq!(manager.active_tournament_count().await, 0);
}

#[tokio::test]
async fn test_create_tournament_with_explicit_levels() {
    let (app, _) = create_test_server();

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/tournaments",
        json!({
            "name": "Custom",
            "buy_in": 50,
            "levels": [
                {"small_blind": 10, "big_blind": 20, "duration_mins": 15},
                {"small_blind": 0, "big_blind": 0, "duration_mins": 10, "is_break": true},
                {"small_blind": 20, "big_blind": 40, "ante": 40, "duration_mins": 15}
            ],
            "payouts": [60.0, 40.0]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap();

    let (status, body) = send_get(&app, &format!("/api/tournaments/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_levels"], 3);
    assert_eq!(body["level"]["small_blind"], 10);
    assert_eq!(body["state"]["time_remaining_secs"], 15 * 60);
}

#[tokio::test]
async fn test_list_tournaments() {
    let (app, _) = create_test_server();
    let id = create_standard(&app).await;

    let (status, body) = send_get(&app, "/api/tournaments").await;

    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().expect("list should be an array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id.to_string());
    assert_eq!(items[0]["name"], "Friday Deepstack");
    assert_eq!(items[0]["location_tag"], "main-room");
}

#[tokio::test]
async fn test_get_unknown_tournament_returns_404() {
    let (app, _) = create_test_server();

    let (status, body) = send_get(&app, &format!("/api/tournaments/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_start_action_starts_clock() {
    let (app, _) = create_test_server();
    let id = create_standard(&app).await;

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/tournaments/{}/actions", id),
        json!({"action": {"type": "start"}, "operator": "director"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send_get(&app, &format!("/api/tournaments/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["is_running"], true);
    assert_eq!(body["state"]["is_paused"], false);
}

#[tokio::test]
async fn test_entry_actions_update_prize_pool() {
    let (app, _) = create_test_server();
    let id = create_standard(&app).await;

    for _ in 0..10 {
        let (status, _) = send_json(
            &app,
            "POST",
            &format!("/api/tournaments/{}/actions", id),
            json!({"action": {"type": "add_player"}, "operator": "floor"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send_get(&app, &format!("/api/tournaments/{}", id)).await;
    assert_eq!(body["state"]["players"], 10);
    assert_eq!(body["state"]["prize_pool"], 1000);
}

#[tokio::test]
async fn test_benign_noop_action_is_acknowledged() {
    let (app, _) = create_test_server();
    let id = create_standard(&app).await;

    // Eliminating from an empty field changes nothing but is not an error
    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/tournaments/{}/actions", id),
        json!({"action": {"type": "eliminate_player"}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_action_for_unknown_tournament_is_acknowledged() {
    let (app, _) = create_test_server();

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/tournaments/{}/actions", Uuid::new_v4()),
        json!({"action": {"type": "start"}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
}

#[tokio::test]
async fn test_delete_tournament() {
    let (app, manager) = create_test_server();
    let id = create_standard(&app).await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/tournaments/{}", id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(manager.active_tournament_count().await, 0);
    let (status, _) = send_get(&app, &format!("/api/tournaments/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_unknown_tournament_returns_404() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/tournaments/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_websocket_unknown_tournament_returns_404() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // The upgrade extractor needs a real connection, so bind an ephemeral
    // port instead of driving the router directly.
    let (app, _) = create_test_server();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET /ws/{} HTTP/1.1\r\n\
         Host: {}\r\n\
         Connection: Upgrade\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n",
        Uuid::new_v4(),
        addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut buf = vec![0u8; 1024];
    let n = stream.read(&mut buf).await.unwrap();
    let response = String::from_utf8_lossy(&buf[..n]);
    assert!(
        response.starts_with("HTTP/1.1 404"),
        "unexpected response: {response}"
    );

    server.abort();
}
