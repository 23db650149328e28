//! Error conversions for the MCP server

use ghph_core::ProjectError;
use rmcp::{
    model::{CallToolResult, Content},
    ErrorData,
};

/// Protocol-level error for failures that are not the plan's fault.
pub fn to_mcp_error(message: &str, error: &impl std::fmt::Display) -> ErrorData {
    ErrorData::internal_error(format!("{message}: {error}"), None)
}

/// Tool result reporting a failed run back to the caller.
pub fn tool_failure(message: &str, error: &ProjectError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!("{message}: {error}"))])
}
