//! Tool-level error taxonomy and its mapping onto MCP replies.

use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData as McpError;
use serde_json::json;
use thiserror::Error;

use crate::llm::ModelError;
use crate::models::FieldError;
use crate::workspace::WorkspaceError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    QuotaExceeded(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("{0}")]
    Workspace(WorkspaceError),
}

impl ToolError {
    /// Stable kind string reported to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Auth(_) => "auth",
            ToolError::Upstream(_) => "upstream",
            ToolError::QuotaExceeded(_) => "quota_exceeded",
            ToolError::Validation(_) => "validation",
            ToolError::Cancelled => "cancelled",
            ToolError::Workspace(_) => "workspace",
        }
    }

    /// Caller mistakes become protocol errors; provider failures become tool
    /// results flagged `isError` so the agent can read and react to them.
    pub fn into_tool_result(self) -> Result<CallToolResult, McpError> {
        match self {
            ToolError::Validation(_) | ToolError::Workspace(_) => {
                Err(McpError::invalid_params(self.to_string(), None))
            }
            ToolError::Cancelled => Err(McpError::internal_error(self.to_string(), None)),
            ToolError::Auth(_) | ToolError::Upstream(_) | ToolError::QuotaExceeded(_) => {
                let body = json!({ "error": self.kind(), "message": self.to_string() });
                Ok(CallToolResult::error(vec![Content::text(body.to_string())]))
            }
        }
    }
}

impl From<ModelError> for ToolError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Auth(_) => ToolError::Auth(e.to_string()),
            ModelError::QuotaExceeded(_) => ToolError::QuotaExceeded(e.to_string()),
            ModelError::Transient(_) | ModelError::Upstream { .. } => {
                ToolError::Upstream(e.to_string())
            }
        }
    }
}

impl From<WorkspaceError> for ToolError {
    fn from(e: WorkspaceError) -> Self {
        match e {
            WorkspaceError::Cancelled => ToolError::Cancelled,
            other => ToolError::Workspace(other),
        }
    }
}

impl From<FieldError> for ToolError {
    fn from(e: FieldError) -> Self {
        ToolError::Validation(e.to_string())
    }
}

impl From<ToolError> for McpError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::Validation(_) | ToolError::Workspace(_) => {
                McpError::invalid_params(e.to_string(), None)
            }
            _ => McpError::internal_error(e.to_string(), None),
        }
    }
}
