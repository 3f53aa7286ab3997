//! HTTP API tests driven through `tower::ServiceExt::oneshot`

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use caja::agent::Agent;
use caja::api::{create_router, AppState};
use caja::config::AgentConfig;
use caja::tools::ToolRegistry;
use caja::ChatService;
use common::{create_temp_storage, CountingSummarizer, ScriptedProvider};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn make_app(replies: Vec<&str>) -> (axum::Router, TempDir) {
    let (storage, tmp) = create_temp_storage();
    let agent = Agent::new(
        Arc::new(ScriptedProvider::new(replies)),
        ToolRegistry::new(),
        "sys",
        AgentConfig::default(),
    )
    .expect("Failed to create agent");
    let service = ChatService::new(
        Arc::new(storage),
        Arc::new(CountingSummarizer::default()),
        agent,
        10,
    );
    (create_router(AppState::new(service)), tmp)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_session(app: &axum::Router, name: Option<&str>) -> String {
    let body = match name {
        Some(name) => json!({"session_name": name}),
        None => json!({}),
    };
    let (status, body) = send(app, post_json("/sessions/create", body)).await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (app, _tmp) = make_app(vec![]);
    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["chat"], "POST /query/chat");
}

#[tokio::test]
async fn test_create_session_with_and_without_body() {
    let (app, _tmp) = make_app(vec![]);

    let (status, body) = send(
        &app,
        post_json("/sessions/create", json!({"session_name": "groceries"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_name"], "groceries");
    assert_eq!(body["message"], "Session created successfully");

    let empty = Request::post("/sessions/create").body(Body::empty()).unwrap();
    let (status, body) = send(&app, empty).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["session_id"].is_string());
}

#[tokio::test]
async fn test_create_session_rejects_malformed_body() {
    let (app, _tmp) = make_app(vec![]);
    let bad = Request::post("/sessions/create")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_chat_then_get_session() {
    let (app, _tmp) = make_app(vec!["Hello from Caja"]);
    let session_id = create_session(&app, Some("hello")).await;

    let (status, body) = send(
        &app,
        post_json(
            "/query/chat",
            json!({"query": "hi", "session_id": session_id, "enable_history": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Hello from Caja");

    let (status, body) = send(&app, get(&format!("/sessions/{}", session_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], session_id.as_str());
    assert_eq!(body["session_name"], "hello");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "human");
    assert_eq!(messages[0]["content"], "hi");
    assert_eq!(messages[1]["role"], "ai");
}

#[tokio::test]
async fn test_chat_unknown_session_is_404() {
    let (app, _tmp) = make_app(vec![]);
    let (status, body) = send(
        &app,
        post_json("/query/chat", json!({"query": "hi", "session_id": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_chat_missing_fields_is_400() {
    let (app, _tmp) = make_app(vec![]);
    let (status, body) = send(&app, post_json("/query/chat", json!({"query": "hi"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_list_and_delete_sessions() {
    let (app, _tmp) = make_app(vec![]);
    let first = create_session(&app, Some("one")).await;
    create_session(&app, None).await;

    let (status, body) = send(&app, get("/sessions")).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = body.as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.get("messages").is_none()));
    assert!(sessions.iter().all(|s| s["message_count"] == 0));

    let delete = Request::delete(format!("/sessions/{}", first))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], first.as_str());
    assert_eq!(body["message"], "Session deleted successfully");

    let (status, _) = send(&app, get(&format!("/sessions/{}", first))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let delete_again = Request::delete(format!("/sessions/{}", first))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete_again).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
