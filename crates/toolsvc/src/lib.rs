//! Tool-execution service implementations for Ironquill.
//!
//! Two ways to run tools:
//! - [`LocalToolService`] — an in-process registry of built-in tools
//! - [`HttpToolService`] — a client for a remote tool server
//!
//! Both implement the [`ironquill_core::ToolService`] contract the
//! orchestration loop dispatches through.

pub mod calculator;
pub mod clock;
pub mod http;
pub mod local;

pub use calculator::CalculatorTool;
pub use clock::ClockTool;
pub use http::HttpToolService;
pub use local::{BuiltinTool, LocalToolService};

/// The default local service: calculator + clock.
pub fn default_service() -> LocalToolService {
    let mut service = LocalToolService::new();
    service.register(Box::new(CalculatorTool));
    service.register(Box::new(ClockTool));
    service
}
