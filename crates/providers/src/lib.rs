//! Model endpoint implementations for Ironquill.

pub mod openai_compat;
pub mod select;

pub use openai_compat::OpenAiCompatEndpoint;
pub use select::build_endpoint;
