pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod workspace;
