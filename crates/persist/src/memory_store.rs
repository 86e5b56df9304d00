//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use ironquill_core::{History, HistoryStore, StoreError};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A store that keeps the saved history in memory only.
pub struct MemoryStore {
    saved: Arc<RwLock<Option<History>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            saved: Arc::new(RwLock::new(None)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, history: &History) -> Result<(), StoreError> {
        *self.saved.write().await = Some(history.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<History>, StoreError> {
        Ok(self.saved.read().await.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.saved.write().await = None;
        Ok(())
    }
}
