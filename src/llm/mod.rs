//! Model client for the external LLM.
//!
//! [`GeminiClient::generate`] makes one logical call: a single outbound request,
//! repeated only for transient failures (network, timeout, 5xx) up to the
//! configured retry bound. Authentication and quota failures surface
//! immediately. Dropping the returned future aborts the in-flight request.

mod client;
mod error;
mod types;

pub use client::GeminiClient;
pub use error::ModelError;
pub use types::{ModelOptions, ModelReply, ReplyMeta, TokenUsage};
