//! `GistClient` against an in-process fake of the raw and REST endpoints.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use licsync_sync_engine::{GistClient, RemoteStore, SyncConfig, SyncError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const GIST_ID: &str = "abc123";
const FILE_NAME: &str = "license_pig.txt";
const TOKEN: &str = "ghp_valid";

#[derive(Default)]
struct FakeGist {
    content: Mutex<String>,
    raw_queries: Mutex<Vec<HashMap<String, String>>>,
    patch_headers: Mutex<Vec<HeaderMap>>,
    user_agents: Mutex<Vec<String>>,
}

type Shared = Arc<FakeGist>;

async fn raw(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> String {
    state.raw_queries.lock().unwrap().push(query);
    if let Some(ua) = headers.get(header::USER_AGENT) {
        state
            .user_agents
            .lock()
            .unwrap()
            .push(ua.to_str().unwrap().to_string());
    }
    state.content.lock().unwrap().clone()
}

async fn missing() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn update(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.patch_headers.lock().unwrap().push(headers.clone());

    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != format!("token {TOKEN}") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Bad credentials"})),
        )
            .into_response();
    }
    if id != GIST_ID {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response();
    }

    let Some(content) = body["files"][FILE_NAME]["content"].as_str() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "Validation Failed"})),
        )
            .into_response();
    };
    *state.content.lock().unwrap() = content.to_string();
    (StatusCode::OK, Json(json!({"id": id}))).into_response()
}

async fn start(initial: &str) -> (SocketAddr, Shared) {
    let state = Arc::new(FakeGist::default());
    *state.content.lock().unwrap() = initial.to_string();

    let app = Router::new()
        .route("/raw", get(raw))
        .route("/missing", get(missing))
        .route("/gists/:id", patch(update))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn client(addr: SocketAddr, gist_id: &str, raw_path: &str) -> GistClient {
    let config = SyncConfig::new(gist_id, FILE_NAME, format!("http://{addr}{raw_path}"))
        .with_api_base_url(format!("http://{addr}"))
        .with_timeout(Duration::from_secs(5));
    GistClient::new(config).unwrap()
}

#[tokio::test]
async fn fetch_returns_raw_content_with_cache_bust() {
    let (addr, state) = start("DEVICE_HASH=AB12").await;
    let client = client(addr, GIST_ID, "/raw");

    assert_eq!(client.fetch_latest().await.unwrap(), "DEVICE_HASH=AB12");

    let queries = state.raw_queries.lock().unwrap();
    let t = queries[0].get("t").expect("cache-bust parameter");
    assert!(t.parse::<i64>().unwrap() > 0);

    let agents = state.user_agents.lock().unwrap();
    assert!(agents[0].starts_with("licsync/"));
}

#[tokio::test]
async fn push_sends_github_headers_and_body() {
    let (addr, state) = start("DEVICE_HASH=OLD").await;
    let client = client(addr, GIST_ID, "/raw");

    client
        .push_snapshot("DEVICE_HASH=NEW\nUSER=bob", TOKEN)
        .await
        .unwrap();
    assert_eq!(client.fetch_latest().await.unwrap(), "DEVICE_HASH=NEW\nUSER=bob");

    let headers = state.patch_headers.lock().unwrap();
    assert_eq!(
        headers[0].get(header::ACCEPT).unwrap(),
        "application/vnd.github.v3+json"
    );
    assert_eq!(
        headers[0].get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert!(headers[0].get(header::USER_AGENT).is_some());
}

#[tokio::test]
async fn push_with_bad_token_is_unauthorized() {
    let (addr, state) = start("DEVICE_HASH=OLD").await;
    let client = client(addr, GIST_ID, "/raw");

    let err = client.push_snapshot("DEVICE_HASH=NEW", "nope").await.unwrap_err();
    match err {
        SyncError::Unauthorized(message) => assert_eq!(message, "Bad credentials"),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    assert_eq!(*state.content.lock().unwrap(), "DEVICE_HASH=OLD");
}

#[tokio::test]
async fn push_with_malformed_token_sends_nothing() {
    let (addr, state) = start("DEVICE_HASH=OLD").await;
    let client = client(addr, GIST_ID, "/raw");

    let err = client
        .push_snapshot("DEVICE_HASH=NEW", "ghp_\nsplit")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidCredential));
    assert!(state.patch_headers.lock().unwrap().is_empty());
    assert_eq!(*state.content.lock().unwrap(), "DEVICE_HASH=OLD");
}

#[tokio::test]
async fn push_to_unknown_gist_is_rejected_with_message() {
    let (addr, _state) = start("DEVICE_HASH=OLD").await;
    let client = client(addr, "not-a-gist", "/raw");

    let err = client.push_snapshot("DEVICE_HASH=NEW", TOKEN).await.unwrap_err();
    match err {
        SyncError::RemoteRejected { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("expected RemoteRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_raw_body_is_unavailable() {
    let (addr, _state) = start("").await;
    let client = client(addr, GIST_ID, "/raw");

    assert!(matches!(
        client.fetch_latest().await,
        Err(SyncError::RemoteUnavailable(_))
    ));
}

#[tokio::test]
async fn raw_error_status_is_unavailable() {
    let (addr, _state) = start("DEVICE_HASH=AB12").await;
    let client = client(addr, GIST_ID, "/missing");

    match client.fetch_latest().await {
        Err(SyncError::RemoteUnavailable(message)) => assert!(message.contains("404")),
        other => panic!("expected RemoteUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(addr, GIST_ID, "/raw");
    assert!(matches!(
        client.fetch_latest().await,
        Err(SyncError::Network(_))
    ));
    assert!(matches!(
        client.push_snapshot("DEVICE_HASH=A", TOKEN).await,
        Err(SyncError::Network(_))
    ));
}
