use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use slateink_editor::{
    AnalyzeClient, EditorError, EditorSession, NotesClient, Point, ShapeKind, Theme, Tool,
};
use slateink_shared::USER_ID_HEADER;

#[derive(Clone, Default)]
struct Recorded {
    calls: Arc<Mutex<Vec<(String, String, Option<String>)>>>,
}

impl Recorded {
    fn push(&self, method: &str, path: String, headers: &HeaderMap) {
        let user = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), path, user));
    }

    fn snapshot(&self) -> Vec<(String, String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

fn note_json(id: &str, payload: &Value) -> Value {
    json!({
        "id": id,
        "userId": "user-1",
        "title": payload["title"],
        "slides": payload["slides"],
        "createdAt": "2026-08-29T10:00:00Z",
        "updatedAt": "2026-08-29T10:05:00Z",
    })
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn spawn_notes_server(recorded: Recorded) -> SocketAddr {
    async fn create(
        State(recorded): State<Recorded>,
        headers: HeaderMap,
        Json(payload): Json<Value>,
    ) -> Json<Value> {
        recorded.push("POST", "/api/notes".to_string(), &headers);
        Json(note_json("note-1", &payload))
    }

    async fn update(
        State(recorded): State<Recorded>,
        Path(id): Path<String>,
        headers: HeaderMap,
        Json(payload): Json<Value>,
    ) -> Json<Value> {
        recorded.push("PUT", format!("/api/notes/{id}"), &headers);
        Json(note_json(&id, &payload))
    }

    let router = Router::new()
        .route("/api/notes", post(create))
        .route("/api/notes/:id", put(update))
        .with_state(recorded);
    spawn(router).await
}

fn draw_stroke(session: &mut EditorSession, from: Point, to: Point) {
    session.pointer_down(from);
    session.pointer_move(to, false);
    session.pointer_up(to);
}

fn drag_selection(session: &mut EditorSession, from: Point, to: Point) {
    session.set_tool(Tool::Selection);
    session.pointer_down(from);
    session.pointer_move(to, false);
    session.pointer_up(to);
}

#[tokio::test]
async fn first_save_creates_then_later_saves_update() {
    let recorded = Recorded::default();
    let addr = spawn_notes_server(recorded.clone()).await;

    let mut session = EditorSession::new(120, 80, Theme::Light);
    session.set_title("Lecture 3");
    draw_stroke(&mut session, Point::new(10.0, 10.0), Point::new(60.0, 10.0));

    let client = NotesClient::new(format!("http://{addr}"), "user-1");
    let note = client.save(&mut session).await.unwrap();
    assert_eq!(note.id, "note-1");
    assert_eq!(session.note_id(), Some("note-1"));

    draw_stroke(&mut session, Point::new(10.0, 30.0), Point::new(60.0, 30.0));
    client.save(&mut session).await.unwrap();

    let calls = recorded.snapshot();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "POST");
    assert_eq!(calls[0].1, "/api/notes");
    assert_eq!(calls[1].0, "PUT");
    assert_eq!(calls[1].1, "/api/notes/note-1");
    assert!(calls
        .iter()
        .all(|(_, _, user)| user.as_deref() == Some("user-1")));
}

#[tokio::test]
async fn analyze_sends_selection_and_surfaces_remote_errors() {
    async fn ok_handler(Json(request): Json<Value>) -> Json<Value> {
        // Bare base64, no data-URL prefix.
        let image = request["image"].as_str().unwrap();
        assert!(!image.starts_with("data:"));
        Json(json!({ "response": "a circle" }))
    }

    async fn failing_handler() -> (axum::http::StatusCode, Json<Value>) {
        (
            axum::http::StatusCode::BAD_GATEWAY,
            Json(json!({ "error": "upstream down" })),
        )
    }

    let addr = spawn(
        Router::new()
            .route("/analyze", post(ok_handler))
            .route("/broken", post(failing_handler)),
    )
    .await;

    let mut session = EditorSession::new(200, 200, Theme::Light);
    session.set_tool(Tool::Shape);
    session.tools.shape_kind = ShapeKind::Circle;
    session.pointer_down(Point::new(40.0, 40.0));
    session.pointer_move(Point::new(120.0, 120.0), false);
    session.pointer_up(Point::new(120.0, 120.0));

    drag_selection(&mut session, Point::new(30.0, 30.0), Point::new(130.0, 130.0));
    assert!(session.selection_valid());
    let region = session.selection().unwrap();

    let client = AnalyzeClient::new(format!("http://{addr}/analyze"), None);
    let answer = client.analyze(session.surface(), region).await.unwrap();
    assert_eq!(answer, "a circle");

    let broken = AnalyzeClient::new(format!("http://{addr}/broken"), None);
    let error = broken.analyze(session.surface(), region).await.unwrap_err();
    match error {
        EditorError::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn undersized_selection_never_reaches_the_network() {
    let mut session = EditorSession::new(200, 200, Theme::Light);
    drag_selection(&mut session, Point::new(10.0, 10.0), Point::new(15.0, 80.0));
    assert!(!session.selection_valid());

    // Nothing listens on this port; the guard must reject first.
    let client = AnalyzeClient::new("http://127.0.0.1:1/analyze", None);
    let result = client
        .analyze(session.surface(), session.selection().unwrap())
        .await;
    assert!(matches!(result, Err(EditorError::SelectionTooSmall)));
}

#[test]
fn pdf_export_emits_one_page_per_slide() {
    let mut session = EditorSession::new(100, 80, Theme::Light);
    draw_stroke(&mut session, Point::new(10.0, 10.0), Point::new(80.0, 10.0));
    session.add_slide().unwrap();
    draw_stroke(&mut session, Point::new(10.0, 40.0), Point::new(80.0, 40.0));

    let pdf = session.export_pdf().unwrap();
    assert!(pdf.starts_with(b"%PDF-1.4"));
    let pages = pdf
        .windows(b"/Type /Page /".len())
        .filter(|window| *window == b"/Type /Page /")
        .count();
    assert_eq!(pages, 2);
}
