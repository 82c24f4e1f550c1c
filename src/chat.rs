//! Multi-turn chat sessions.
//!
//! A session owns the committed conversation history and a per-session
//! configuration and tool registry. History is append-only and commits per
//! completed round-trip: a failed or abandoned exchange leaves it exactly
//! as it was, so retrying the same message is always safe.

use async_stream::try_stream;
use futures::Stream;
use futures_util::StreamExt;
use std::sync::Arc;

use crate::error::Result;
use crate::request::{build_request, IntoParts};
use crate::streaming::ResponseAccumulator;
use crate::tools::dispatch::config_with_registry;
use crate::tools::{run_tool_loop, ToolRegistry, DEFAULT_MAX_TOOL_ROUNDS};
use crate::transport::Transport;
use crate::types::{Content, GenerateContentResponse, GenerationConfig};

/// A stateful multi-turn conversation.
pub struct ChatSession {
    transport: Arc<dyn Transport>,
    model: String,
    config: GenerationConfig,
    tools: ToolRegistry,
    history: Vec<Content>,
    max_tool_rounds: usize,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("model", &self.model)
            .field("turns", &self.history.len())
            .field("tools", &self.tools.len())
            .finish()
    }
}

impl ChatSession {
    /// Create a session over the given transport.
    pub fn new(transport: Arc<dyn Transport>, model: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            transport,
            model: model.into(),
            config,
            tools: ToolRegistry::new(),
            history: Vec::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Seed the session with prior turns.
    pub fn with_history(mut self, history: Vec<Content>) -> Self {
        self.history = history;
        self
    }

    /// Cap on model round-trips per `send` when tools keep being called.
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// The session's tool registry.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Mutable access for registering tools.
    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    /// The committed conversation, oldest turn first.
    ///
    /// Never contains a partial exchange: each `send` either appends its
    /// completed round-trips or leaves the history untouched.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Send a message and return the model's final answer.
    ///
    /// If the session has registered tools and the model requests them,
    /// they are executed automatically and the loop continues until the
    /// model answers without calls (or the round cap trips).
    pub async fn send(
        &mut self,
        message: impl IntoParts,
    ) -> Result<GenerateContentResponse> {
        let user_turn = Content::user(message.into_parts());
        run_tool_loop(
            self.transport.as_ref(),
            &self.model,
            &self.config,
            &self.tools,
            &mut self.history,
            user_turn,
            self.max_tool_rounds,
        )
        .await
    }

    /// Send a message and stream the model's reply chunk by chunk.
    ///
    /// Tools are declared but not dispatched on this path; a streamed turn
    /// ending in function calls surfaces them to the caller. The exchange
    /// is committed to history only once the stream completes; dropping it
    /// mid-way commits nothing.
    pub fn send_stream(
        &mut self,
        message: impl IntoParts,
    ) -> impl Stream<Item = Result<GenerateContentResponse>> + '_ {
        let user_turn = Content::user(message.into_parts());
        try_stream! {
            let config = config_with_registry(&self.config, &self.tools);
            let mut contents = self.history.clone();
            contents.push(user_turn.clone());

            let request = build_request(&self.model, contents, &config, false)?;
            let mut stream = self.transport.execute_stream(&request).await?;

            let mut acc = ResponseAccumulator::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                acc.push(&chunk);
                yield chunk;
            }

            self.history.push(user_turn);
            self.history.push(acc.into_content());
        }
    }
}
