use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use slateink_shared::{reindex_slides, Note, NotePayload};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("invalid note id: {0}")]
    InvalidId(String),
}

/// Persistence behind the note API. Every query is scoped by owner;
/// a note that exists but belongs to someone else is indistinguishable
/// from one that does not exist.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Owner's notes, most recently updated first.
    async fn list(&self, user_id: &str) -> Result<Vec<Note>, StoreError>;
    async fn create(&self, user_id: &str, payload: NotePayload) -> Result<Note, StoreError>;
    async fn get(&self, user_id: &str, id: &str) -> Result<Option<Note>, StoreError>;
    async fn update(
        &self,
        user_id: &str,
        id: &str,
        payload: NotePayload,
    ) -> Result<Option<Note>, StoreError>;
    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, StoreError>;
}

fn build_note(user_id: &str, payload: NotePayload) -> Note {
    let now = Utc::now();
    let mut slides = payload.slides;
    reindex_slides(&mut slides);
    Note {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: payload.title,
        slides,
        created_at: now,
        updated_at: now,
    }
}

fn apply_update(note: &mut Note, payload: NotePayload) {
    let mut slides = payload.slides;
    reindex_slides(&mut slides);
    note.title = payload.title;
    note.slides = slides;
    note.updated_at = Utc::now();
}

fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// One JSON file per note under the data directory.
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn note_path(&self, id: &str) -> Option<PathBuf> {
        // Ids are UUIDs we minted; anything else never resolves to a
        // path, which also rules out traversal.
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        valid.then(|| self.data_dir.join(format!("{id}.json")))
    }

    async fn read_note(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let Some(path) = self.note_path(id) else {
            return Ok(None);
        };
        let payload = match tokio::fs::read(path).await {
            Ok(payload) => payload,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        Ok(Some(serde_json::from_slice(&payload)?))
    }

    async fn write_note(&self, note: &Note) -> Result<(), StoreError> {
        let Some(path) = self.note_path(&note.id) else {
            return Err(StoreError::InvalidId(note.id.clone()));
        };
        let payload = serde_json::to_vec_pretty(note)?;
        tokio::fs::write(path, payload).await?;
        Ok(())
    }
}

#[async_trait]
impl NoteStore for FileStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Note>, StoreError> {
        let mut notes = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(notes),
            Err(error) => return Err(error.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let payload = tokio::fs::read(entry.path()).await?;
            match serde_json::from_slice::<Note>(&payload) {
                Ok(note) if note.user_id == user_id => notes.push(note),
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!("skipping unreadable note file {:?}: {error}", entry.path());
                }
            }
        }
        sort_newest_first(&mut notes);
        Ok(notes)
    }

    async fn create(&self, user_id: &str, payload: NotePayload) -> Result<Note, StoreError> {
        let note = build_note(user_id, payload);
        self.write_note(&note).await?;
        Ok(note)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<Note>, StoreError> {
        Ok(self
            .read_note(id)
            .await?
            .filter(|note| note.user_id == user_id))
    }

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        payload: NotePayload,
    ) -> Result<Option<Note>, StoreError> {
        let Some(mut note) = self.get(user_id, id).await? else {
            return Ok(None);
        };
        apply_update(&mut note, payload);
        self.write_note(&note).await?;
        Ok(Some(note))
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, StoreError> {
        if self.get(user_id, id).await?.is_none() {
            return Ok(false);
        }
        if let Some(path) = self.note_path(id) {
            tokio::fs::remove_file(path).await?;
        }
        Ok(true)
    }
}

/// In-memory store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryStore {
    notes: RwLock<HashMap<String, Note>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Note>, StoreError> {
        let notes = self.notes.read().await;
        let mut owned: Vec<Note> = notes
            .values()
            .filter(|note| note.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut owned);
        Ok(owned)
    }

    async fn create(&self, user_id: &str, payload: NotePayload) -> Result<Note, StoreError> {
        let note = build_note(user_id, payload);
        self.notes
            .write()
            .await
            .insert(note.id.clone(), note.clone());
        Ok(note)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<Note>, StoreError> {
        let notes = self.notes.read().await;
        Ok(notes
            .get(id)
            .filter(|note| note.user_id == user_id)
            .cloned())
    }

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        payload: NotePayload,
    ) -> Result<Option<Note>, StoreError> {
        let mut notes = self.notes.write().await;
        let Some(note) = notes.get_mut(id).filter(|note| note.user_id == user_id) else {
            return Ok(None);
        };
        apply_update(note, payload);
        Ok(Some(note.clone()))
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, StoreError> {
        let mut notes = self.notes.write().await;
        match notes.get(id) {
            Some(note) if note.user_id == user_id => {
                notes.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
