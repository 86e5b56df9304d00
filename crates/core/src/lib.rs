//! # Ironquill Core
//!
//! Domain types, traits, and error definitions for the Ironquill
//! conversation runtime. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod endpoint;
pub mod error;
pub mod message;
pub mod store;
pub mod toolsvc;

// Re-export key types at crate root for ergonomics
pub use endpoint::{ChatRequest, ChatResponse, ModelEndpoint, TokenUsage};
pub use error::{EndpointError, Error, Result, StoreError, ToolServiceError};
pub use message::{History, Message, Role};
pub use store::HistoryStore;
pub use toolsvc::{ToolOutcome, ToolRequest, ToolService, ToolSpec};
