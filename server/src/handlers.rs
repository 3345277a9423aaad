use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use slateink_shared::{strip_data_url, AnalyzeRequest, AnalyzeResponse, Note, NotePayload};

use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::AppState;

pub async fn ping() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Validates a create/update body: the JSON must parse and the title
/// must be non-blank. Slides may be empty; a note with no pages yet is
/// legal.
fn validate(
    payload: Result<Json<NotePayload>, JsonRejection>,
) -> Result<NotePayload, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::MissingFields)?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::MissingFields);
    }
    Ok(payload)
}

pub async fn list_notes(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.store.list(&user_id).await?))
}

pub async fn create_note(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    payload: Result<Json<NotePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let payload = validate(payload)?;
    let note = state.store.create(&user_id, payload).await?;
    tracing::info!("created note {} for {user_id}", note.id);
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn get_note(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let note = state.store.get(&user_id, &id).await?;
    note.map(Json).ok_or(ApiError::NotFound)
}

pub async fn update_note(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Path(id): Path<String>,
    payload: Result<Json<NotePayload>, JsonRejection>,
) -> Result<Json<Note>, ApiError> {
    let payload = validate(payload)?;
    let note = state.store.update(&user_id, &id, payload).await?;
    note.map(Json).ok_or(ApiError::NotFound)
}

pub async fn delete_note(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete(&user_id, &id).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!("deleted note {id} for {user_id}");
    Ok(Json(json!({ "success": true })))
}

/// Forwards a selection snapshot to the vision service. Deliberately
/// unauthenticated: the image never touches the note store and carries
/// no identity.
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let image = strip_data_url(&request.image).to_string();
    if image.is_empty() {
        return Err(ApiError::BadRequest("Image data is required".to_string()));
    }
    let upstream_request = AnalyzeRequest {
        image,
        api_key: request.api_key.or_else(|| state.api_key.clone()),
    };
    let response = state
        .http
        .post(format!("{}/analyze", state.analyze_upstream))
        .json(&upstream_request)
        .send()
        .await
        .map_err(|error| ApiError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message: format!("Failed to process image: {error}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        tracing::warn!("analyze upstream returned {status}: {text}");
        return Err(ApiError::Upstream {
            status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            message: format!("Failed to process image: {text}"),
        });
    }
    let body: AnalyzeResponse = response.json().await.map_err(|error| ApiError::Upstream {
        status: StatusCode::BAD_GATEWAY,
        message: format!("Failed to process image: {error}"),
    })?;
    Ok(Json(body))
}
