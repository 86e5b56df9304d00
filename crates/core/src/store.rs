//! HistoryStore trait — the abstraction over session persistence.
//!
//! The conversation manager never depends on *how* history is persisted,
//! only that `load` returns whatever was last saved (or nothing) and that
//! `save` is durable before it returns.

use crate::error::StoreError;
use crate::message::History;
use async_trait::async_trait;

/// A persistence backend for conversation history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// A human-readable name for this store (e.g. "file", "memory").
    fn name(&self) -> &str;

    /// Persist the full history. Durable before returning.
    async fn save(&self, history: &History) -> std::result::Result<(), StoreError>;

    /// Load the last saved history, or `None` when nothing was saved yet.
    async fn load(&self) -> std::result::Result<Option<History>, StoreError>;

    /// Discard any saved history.
    async fn clear(&self) -> std::result::Result<(), StoreError>;
}
