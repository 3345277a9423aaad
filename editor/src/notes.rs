use slateink_shared::{ErrorBody, Note, NotePayload, USER_ID_HEADER};

use crate::error::EditorError;
use crate::session::EditorSession;

/// Client for the note CRUD API. Every request carries the caller's
/// identity header; the server scopes all queries by it.
pub struct NotesClient {
    base_url: String,
    user_id: String,
    http: reqwest::Client,
}

impl NotesClient {
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_id: user_id.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Note>, EditorError> {
        let response = self
            .http
            .get(format!("{}/api/notes", self.base_url))
            .header(USER_ID_HEADER, &self.user_id)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn fetch(&self, id: &str) -> Result<Note, EditorError> {
        let response = self
            .http
            .get(format!("{}/api/notes/{}", self.base_url, id))
            .header(USER_ID_HEADER, &self.user_id)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), EditorError> {
        let response = self
            .http
            .delete(format!("{}/api/notes/{}", self.base_url, id))
            .header(USER_ID_HEADER, &self.user_id)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::api_error(status, response).await);
        }
        Ok(())
    }

    /// Saves the session's note: POST on first save, PUT afterwards.
    /// The returned representation is adopted as authoritative, so the
    /// next save of a new note becomes an update.
    pub async fn save(&self, session: &mut EditorSession) -> Result<Note, EditorError> {
        let payload = session.to_payload()?;
        let note = match session.note_id() {
            None => self.create(&payload).await?,
            Some(id) => self.update(id, &payload).await?,
        };
        session.apply_saved(&note)?;
        Ok(note)
    }

    async fn create(&self, payload: &NotePayload) -> Result<Note, EditorError> {
        let response = self
            .http
            .post(format!("{}/api/notes", self.base_url))
            .header(USER_ID_HEADER, &self.user_id)
            .json(payload)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn update(&self, id: &str, payload: &NotePayload) -> Result<Note, EditorError> {
        let response = self
            .http
            .put(format!("{}/api/notes/{}", self.base_url, id))
            .header(USER_ID_HEADER, &self.user_id)
            .json(payload)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, EditorError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::api_error(status, response).await);
        }
        Ok(response.json().await?)
    }

    async fn api_error(status: reqwest::StatusCode, response: reqwest::Response) -> EditorError {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("Request failed with status {}", status.as_u16()),
        };
        EditorError::Api {
            status: status.as_u16(),
            message,
        }
    }
}
