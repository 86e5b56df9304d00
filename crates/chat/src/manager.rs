//! The conversation manager — the outward-facing façade.
//!
//! Owns the [`History`] for the lifetime of one conversation and is the
//! only writer to it. A turn at a time: the manager hands the
//! orchestrator exclusive mutable access for the duration of one `ask`,
//! and background collaborators use [`ConversationManager::ask_detached`],
//! which never touches history, so no interleaving can corrupt it.

use ironquill_core::{ChatResponse, Error, History, HistoryStore, Message, TokenUsage};
use std::sync::Arc;
use tracing::{info, warn};

use crate::orchestrator::ToolOrchestrator;
use crate::summarizer::Summarizer;

/// Owns history, offers with-history / independent request modes, and
/// invokes the summarizer between turns.
pub struct ConversationManager {
    orchestrator: ToolOrchestrator,

    /// The conversation record. Exclusively owned; handed out only as
    /// defensive copies.
    history: History,

    /// The configured system prompt, before any tool catalogue or
    /// summary is folded in.
    base_prompt: String,

    /// The latest condensation, carried in the system prompt so it
    /// survives catalogue rewrites on later turns.
    summary: Option<String>,

    /// When off, turns run over an ephemeral history and nothing is
    /// retained between them.
    history_mode: bool,

    summarizer: Option<Summarizer>,

    store: Option<Arc<dyn HistoryStore>>,
}

impl ConversationManager {
    /// Create a manager with the given system prompt.
    pub fn new(
        orchestrator: ToolOrchestrator,
        system_prompt: impl Into<String>,
        history_mode: bool,
    ) -> Self {
        let base_prompt = system_prompt.into();
        let history = if history_mode {
            History::with_system_prompt(&base_prompt)
        } else {
            History::new()
        };
        Self {
            orchestrator,
            history,
            base_prompt,
            summary: None,
            history_mode,
            summarizer: None,
            store: None,
        }
    }

    /// Attach a summarizer for automatic history condensation.
    pub fn with_summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Attach a persistence store; history is saved after each turn.
    pub fn with_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Run one user turn.
    ///
    /// History mode: the turn runs over the owned history, the reply is
    /// retained, and the summarizer may condense the record afterwards.
    /// With history mode off, the turn runs over a scratch history —
    /// tools still work within the turn, but nothing is retained.
    pub async fn ask(&mut self, text: &str) -> Result<ChatResponse, Error> {
        self.ask_with_temperature(text, None).await
    }

    /// Same as [`ask`](Self::ask) with a per-turn temperature override.
    pub async fn ask_with_temperature(
        &mut self,
        text: &str,
        temperature: Option<f32>,
    ) -> Result<ChatResponse, Error> {
        let prompt = self.current_prompt();

        if !self.history_mode {
            let mut scratch = History::new();
            return self
                .orchestrator
                .run(text, &prompt, &mut scratch, temperature)
                .await;
        }

        let response = self
            .orchestrator
            .run(text, &prompt, &mut self.history, temperature)
            .await?;

        self.maybe_summarize(response.usage.as_ref()).await;
        self.autosave().await;

        Ok(response)
    }

    /// Independent mode: an ephemeral system + user request straight to
    /// the endpoint. Never touches history — safe for background
    /// collaborators while no turn is in flight on their side.
    pub async fn ask_detached(&self, text: &str) -> Result<ChatResponse, Error> {
        self.orchestrator
            .run_detached(&self.current_prompt(), text)
            .await
    }

    /// Reset to an empty conversation: a single system message when
    /// history mode is on, nothing otherwise. Clears the store too.
    pub async fn clear_history(&mut self) -> Result<(), Error> {
        self.summary = None;
        if self.history_mode {
            self.history
                .reset(Some(Message::system(&self.base_prompt)));
        } else {
            self.history.reset(None);
        }
        if let Some(store) = &self.store {
            store.clear().await?;
        }
        Ok(())
    }

    /// A read-only snapshot of the conversation — always a copy, never
    /// the live instance.
    pub fn history(&self) -> Vec<Message> {
        self.history.snapshot()
    }

    /// Load the last saved session from the store, if one exists.
    /// Returns whether anything was restored.
    pub async fn restore(&mut self) -> Result<bool, Error> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        match store.load().await? {
            Some(saved) if !saved.is_empty() => {
                info!(messages = saved.len(), "restored saved conversation");
                self.history = saved;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// The system prompt for the next turn: the configured base plus the
    /// latest summary, when one exists.
    fn current_prompt(&self) -> String {
        match &self.summary {
            Some(summary) => format!(
                "{}\n\nSummary of the conversation so far:\n{}",
                self.base_prompt, summary
            ),
            None => self.base_prompt.clone(),
        }
    }

    /// Condense history when the last turn's usage crossed the threshold.
    /// A failed summarization leaves the conversation uncompressed.
    async fn maybe_summarize(&mut self, usage: Option<&TokenUsage>) {
        let Some(summarizer) = &self.summarizer else {
            return;
        };
        if !summarizer.should_summarize(usage) {
            return;
        }

        info!("usage crossed the summarization threshold, condensing history");
        match summarizer.summarize(self.history.messages()).await {
            Ok(summary) => {
                self.summary = Some(summary);
                // History collapses to a single system message wrapping
                // the summary; the next turn builds on it.
                self.history
                    .reset(Some(Message::system(self.current_prompt())));
            }
            Err(e) => {
                warn!(error = %e, "summarization failed, keeping history uncompressed");
            }
        }
    }

    async fn autosave(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(&self.history).await {
            warn!(error = %e, "failed to persist conversation");
        }
    }
}
