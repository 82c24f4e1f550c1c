//! Remote tool protocol (MCP) client.
//!
//! Connect to a tool server over a spawned subprocess or streamable HTTP,
//! discover its tools, and register them so the dispatcher invokes them
//! like local ones.

mod session;
mod types;

pub use session::{McpSession, McpToolHandler};
pub use types::{
    InitializeResult, JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, McpContent,
    McpToolInfo, ServerInfo, ToolCallResult, ToolsListResult, PROTOCOL_VERSION,
};
