//! # Converse - A Minimal Conversational AI Client
//!
//! Converse is a client library for Gemini-style generative AI APIs. It
//! covers one-shot and streaming generation, stateful multi-turn chat,
//! automatic tool dispatch (local closures or remote MCP servers),
//! schema-validated structured output, and file uploads.
//!
#![deny(unsafe_code)]

//! ## Quick Start
//!
//! ```rust,no_run
//! use converse::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY (or GOOGLE_API_KEY) from the environment.
//!     let client = Client::new()?;
//!
//!     let response = client.generate("Why is the sky blue?").await?;
//!     println!("{}", response.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ## Chat with tools
//!
//! ```rust,no_run
//! use converse::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new()?;
//!     let mut chat = client.chat();
//!
//!     chat.tools_mut().register_fn(
//!         FunctionDeclaration::new(
//!             "get_weather",
//!             "Current weather for a city",
//!             json!({
//!                 "type": "object",
//!                 "properties": {"city": {"type": "string"}},
//!                 "required": ["city"]
//!             }),
//!         ),
//!         |args| async move {
//!             let city = args["city"].as_str().unwrap_or("?").to_string();
//!             Ok(json!({"city": city, "temperature_c": 21}))
//!         },
//!     );
//!
//!     // Tool calls from the model run automatically; the final answer
//!     // comes back once the model stops calling.
//!     let response = chat.send("What's the weather in Tokyo?").await?;
//!     println!("{}", response.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! use converse::prelude::*;
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new()?;
//!     let mut stream = client.generate_stream("Tell me a story").await?;
//!     while let Some(chunk) = stream.next().await {
//!         if let Some(text) = chunk?.text() {
//!             print!("{text}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod chat;
pub mod client;
pub mod error;
pub mod files;
pub mod mcp;
pub mod request;
pub mod streaming;
pub mod structured;
pub mod tools;
pub mod transport;
pub mod types;

pub use chat::ChatSession;
pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_UPLOAD_BASE_URL};
pub use error::{Error, Result, ToolFault};
pub use files::FileService;
pub use streaming::{collect_response, text_stream, ChatStream, ResponseAccumulator};
pub use transport::{HttpTransport, Transport};

/// Common imports for applications using the library.
pub mod prelude {
    pub use crate::chat::ChatSession;
    pub use crate::client::{Client, ClientBuilder};
    pub use crate::error::{Error, Result, ToolFault};
    pub use crate::mcp::McpSession;
    pub use crate::streaming::{collect_response, text_stream, ChatStream};
    pub use crate::tools::{FunctionTool, ToolHandler, ToolRegistry};
    pub use crate::types::{
        Content, FunctionCall, FunctionDeclaration, FunctionResponse, GenerateContentResponse,
        GenerationConfig, Part, Role, ToolConfig, ToolDecl,
    };
}
