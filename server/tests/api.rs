use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use slateink_server::store::MemoryStore;
use slateink_server::{router, AppState};
use slateink_shared::{Note, USER_ID_HEADER};

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Stand-in for the vision service: echoes whether a key arrived and
/// fails on demand.
async fn spawn_upstream() -> SocketAddr {
    async fn analyze(Json(request): Json<Value>) -> Json<Value> {
        let image = request["image"].as_str().unwrap_or_default();
        assert!(!image.starts_with("data:"));
        let key = request["api_key"].as_str().unwrap_or("none");
        Json(json!({ "response": format!("seen {} bytes, key {key}", image.len()) }))
    }

    async fn broken() -> (axum::http::StatusCode, String) {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "model offline".to_string(),
        )
    }

    let router = Router::new()
        .route("/analyze", post(analyze))
        .route("/broken/analyze", post(broken));
    spawn(router).await
}

async fn spawn_api(analyze_upstream: String) -> SocketAddr {
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        http: reqwest::Client::new(),
        analyze_upstream,
        api_key: Some("server-key".to_string()),
    };
    spawn(router(state)).await
}

fn payload(title: &str) -> Value {
    json!({
        "title": title,
        "slides": [
            { "canvasData": "", "order": 9 },
            { "canvasData": "", "order": 9, "text": "integral" },
        ],
    })
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let addr = spawn_api("http://127.0.0.1:1".into()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{addr}/api/notes"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn create_returns_note_with_id_and_reindexed_slides() {
    let addr = spawn_api("http://127.0.0.1:1".into()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/notes"))
        .header(USER_ID_HEADER, "u1")
        .json(&payload("calculus"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let note: Note = response.json().await.unwrap();
    assert!(!note.id.is_empty());
    assert_eq!(note.user_id, "u1");
    assert_eq!(note.slides[0].order, 0);
    assert_eq!(note.slides[1].order, 1);
    assert_eq!(note.created_at, note.updated_at);
}

#[tokio::test]
async fn blank_title_is_a_missing_field() {
    let addr = spawn_api("http://127.0.0.1:1".into()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/notes"))
        .header(USER_ID_HEADER, "u1")
        .json(&json!({ "title": "   ", "slides": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn update_modifies_and_bumps_timestamp() {
    let addr = spawn_api("http://127.0.0.1:1".into()).await;
    let client = reqwest::Client::new();

    let created: Note = client
        .post(format!("http://{addr}/api/notes"))
        .header(USER_ID_HEADER, "u1")
        .json(&payload("before"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let updated: Note = client
        .put(format!("http://{addr}/api/notes/{}", created.id))
        .header(USER_ID_HEADER, "u1")
        .json(&payload("after"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "after");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn list_is_scoped_and_sorted_newest_first() {
    let addr = spawn_api("http://127.0.0.1:1".into()).await;
    let client = reqwest::Client::new();

    for title in ["one", "two", "three"] {
        client
            .post(format!("http://{addr}/api/notes"))
            .header(USER_ID_HEADER, "u1")
            .json(&payload(title))
            .send()
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    client
        .post(format!("http://{addr}/api/notes"))
        .header(USER_ID_HEADER, "u2")
        .json(&payload("not yours"))
        .send()
        .await
        .unwrap();

    let notes: Vec<Note> = client
        .get(format!("http://{addr}/api/notes"))
        .header(USER_ID_HEADER, "u1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<&str> = notes.iter().map(|note| note.title.as_str()).collect();
    assert_eq!(titles, vec!["three", "two", "one"]);
}

#[tokio::test]
async fn other_users_notes_read_as_not_found() {
    let addr = spawn_api("http://127.0.0.1:1".into()).await;
    let client = reqwest::Client::new();

    let note: Note = client
        .post(format!("http://{addr}/api/notes"))
        .header(USER_ID_HEADER, "u1")
        .json(&payload("private"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    for request in [
        client
            .get(format!("http://{addr}/api/notes/{}", note.id))
            .header(USER_ID_HEADER, "u2"),
        client
            .put(format!("http://{addr}/api/notes/{}", note.id))
            .header(USER_ID_HEADER, "u2")
            .json(&payload("hijack")),
        client
            .delete(format!("http://{addr}/api/notes/{}", note.id))
            .header(USER_ID_HEADER, "u2"),
    ] {
        let response = request.send().await.unwrap();
        assert_eq!(response.status(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Note not found");
    }
}

#[tokio::test]
async fn delete_acknowledges_then_note_is_gone() {
    let addr = spawn_api("http://127.0.0.1:1".into()).await;
    let client = reqwest::Client::new();

    let note: Note = client
        .post(format!("http://{addr}/api/notes"))
        .header(USER_ID_HEADER, "u1")
        .json(&payload("doomed"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .delete(format!("http://{addr}/api/notes/{}", note.id))
        .header(USER_ID_HEADER, "u1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);

    let response = client
        .get(format!("http://{addr}/api/notes/{}", note.id))
        .header(USER_ID_HEADER, "u1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn analyze_strips_prefix_and_falls_back_to_server_key() {
    let upstream = spawn_upstream().await;
    let addr = spawn_api(format!("http://{upstream}")).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/analyze"))
        .json(&json!({ "image": "data:image/png;base64,aGVsbG8=" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["response"], "seen 8 bytes, key server-key");
}

#[tokio::test]
async fn analyze_rejects_empty_image() {
    let addr = spawn_api("http://127.0.0.1:1".into()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/analyze"))
        .json(&json!({ "image": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Image data is required");
}

#[tokio::test]
async fn analyze_surfaces_upstream_failures() {
    let upstream = spawn_upstream().await;
    let addr = spawn_api(format!("http://{upstream}/broken")).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/analyze"))
        .json(&json!({ "image": "aGVsbG8=" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to process image: model offline");
}
