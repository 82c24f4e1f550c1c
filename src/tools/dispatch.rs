//! Automatic function-call dispatch.
//!
//! An iterative, bounded loop: send the conversation, and while the model
//! answers with function calls, execute them and send the results back.
//! Never recursive; the bound caps provider round-trips, not tool
//! invocations (one round may carry several calls).
//!
//! History is committed per completed round-trip. A transport or API failure
//! mid-loop leaves every completed round in place and nothing partial.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::request::build_request;
use crate::transport::Transport;
use crate::types::{Content, FunctionCall, GenerateContentResponse, GenerationConfig, Part, ToolDecl};

use super::ToolRegistry;

/// Default cap on model round-trips in one dispatch loop.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

/// Run the request/dispatch loop until the model stops calling tools.
///
/// `history` holds the committed conversation; the new user turn and every
/// completed round are appended to it. On `Ok`, the returned response is the
/// model's final (call-free) answer and `history` ends with its turn.
pub async fn run_tool_loop(
    transport: &dyn Transport,
    model: &str,
    config: &GenerationConfig,
    registry: &ToolRegistry,
    history: &mut Vec<Content>,
    user_turn: Content,
    max_rounds: usize,
) -> Result<GenerateContentResponse> {
    let config = config_with_registry(config, registry);
    let auto = !registry.is_empty();

    // The turn opening the current round-trip, committed only once the
    // model's reply for that round has arrived.
    let mut pending = user_turn;

    for round in 0..max_rounds {
        let mut contents = history.clone();
        contents.push(pending.clone());

        let request = build_request(model, contents, &config, auto)?;
        let response = transport.execute(&request).await?;

        let model_turn = response
            .content()
            .cloned()
            .unwrap_or_else(|| Content::model(Vec::new()));
        let calls: Vec<FunctionCall> =
            response.function_calls().into_iter().cloned().collect();

        // Resolve every handler before committing, so an unknown name
        // leaves the history exactly as it was.
        let handlers = calls
            .iter()
            .map(|call| {
                registry
                    .get(&call.name)
                    .cloned()
                    .ok_or_else(|| Error::UnknownTool(call.name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        history.push(std::mem::replace(&mut pending, Content::user(Vec::new())));
        history.push(model_turn);

        if calls.is_empty() {
            tracing::debug!(round, "dispatch loop finished");
            return Ok(response);
        }

        tracing::debug!(round, calls = calls.len(), "dispatching tool calls");
        let mut parts = Vec::with_capacity(calls.len());
        for (call, handler) in calls.iter().zip(handlers) {
            let result = match handler.invoke(call.args.clone()).await {
                Ok(value) => wrap_result(value),
                Err(fault) => {
                    tracing::warn!(tool = %call.name, fault = %fault, "tool faulted");
                    serde_json::json!({"error": fault.message()})
                }
            };
            parts.push(Part::function_response(&call.name, result));
        }
        pending = Content::user(parts);
    }

    Err(Error::ToolLoopExceeded { rounds: max_rounds })
}

/// Merge the registry's declarations into the configured tools.
pub(crate) fn config_with_registry(config: &GenerationConfig, registry: &ToolRegistry) -> GenerationConfig {
    let mut config = config.clone();
    if !registry.is_empty() {
        config
            .tools
            .get_or_insert_with(Vec::new)
            .push(ToolDecl::functions(registry.declarations()));
    }
    config
}

/// Tool results must reach the model as a mapping; bare values are wrapped.
fn wrap_result(value: Value) -> Value {
    if value.is_object() {
        value
    } else {
        serde_json::json!({"result": value})
    }
}
