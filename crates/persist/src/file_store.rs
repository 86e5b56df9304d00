//! File-based session store — one JSON document per conversation.
//!
//! Storage location: `~/.ironquill/sessions/current.json`
//!
//! The envelope records a session id and a saved-at timestamp alongside
//! the history itself. Writes go through a temp file and an atomic
//! rename, so a crash mid-save leaves the previous session intact.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ironquill_core::{History, HistoryStore, StoreError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// The on-disk shape of a saved session.
#[derive(Debug, Serialize, Deserialize)]
struct SessionEnvelope {
    id: String,
    saved_at: DateTime<Utc>,
    history: History,
}

/// A file-backed session store.
pub struct FileStore {
    path: PathBuf,
    session_id: String,
}

impl FileStore {
    /// Create a store writing to the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Default path: `~/.ironquill/sessions/current.json`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".ironquill")
            .join("sessions")
            .join("current.json")
    }
}

#[async_trait]
impl HistoryStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, history: &History) -> Result<(), StoreError> {
        let envelope = SessionEnvelope {
            id: self.session_id.clone(),
            saved_at: Utc::now(),
            history: history.clone(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Storage(format!("failed to create session directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(&envelope)
            .map_err(|e| StoreError::Storage(format!("failed to serialize session: {e}")))?;

        // Temp file + rename so a crash mid-write can't truncate the
        // previous save.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &content)
            .map_err(|e| StoreError::Storage(format!("failed to write session file: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::Storage(format!("failed to replace session file: {e}")))?;

        debug!(path = %self.path.display(), messages = history.len(), "session saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<History>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            // File doesn't exist yet — nothing was saved.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "failed to read session file: {e}"
                )));
            }
        };

        let envelope: SessionEnvelope = serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        debug!(
            path = %self.path.display(),
            saved_at = %envelope.saved_at,
            messages = envelope.history.len(),
            "session loaded"
        );
        Ok(Some(envelope.history))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Storage(format!(
                "failed to remove session file: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironquill_core::Message;

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(dir.path().join("session.json"))
    }

    #[tokio::test]
    async fn load_before_any_save_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut history = History::with_system_prompt("sys");
        history.push(Message::user("hello"));
        history.push(Message::assistant("hi"));
        store.save(&history).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, history);
    }

    #[tokio::test]
    async fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("deep").join("s.json"));
        store.save(&History::with_system_prompt("x")).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_removes_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.save(&History::with_system_prompt("x")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());

        // Clearing twice is fine.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileStore::new(path);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn later_save_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.save(&History::with_system_prompt("first")).await.unwrap();
        store.save(&History::with_system_prompt("second")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.system_prompt(), Some("second"));
    }
}
