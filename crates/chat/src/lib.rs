//! The conversation core of Ironquill.
//!
//! One user **turn** flows through here as follows:
//!
//! 1. The [`ConversationManager`] appends the user message to its owned
//!    history and hands the turn to the [`ToolOrchestrator`]
//! 2. The orchestrator drives one or more **rounds** against the model
//!    endpoint, parsing each reply for tool requests
//! 3. Parsed requests are executed in order through the tool service and
//!    the outcomes folded back into the conversation as one synthetic
//!    user message
//! 4. A reply with no tool requests ends the turn; the manager then asks
//!    the [`Summarizer`] whether accumulated usage warrants condensing
//!    the history before the next turn
//!
//! The loop is bounded (default 10 rounds) and every failure domain —
//! endpoint, tool service, parser — degrades without corrupting history.

pub mod manager;
pub mod orchestrator;
pub mod parser;
pub mod summarizer;

pub use manager::ConversationManager;
pub use orchestrator::ToolOrchestrator;
pub use parser::parse_tool_requests;
pub use summarizer::{Summarizer, SummarizerConfig};
