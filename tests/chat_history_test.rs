//! History ordering and configuration plumbing across turns.

mod support;

use converse::prelude::*;
use converse::types::{Content, FunctionCallingMode};
use std::sync::Arc;
use support::{text_response, ScriptedTransport};

fn client_with(transport: Arc<ScriptedTransport>) -> Client {
    Client::builder()
        .transport(transport)
        .model("test-model")
        .build()
        .unwrap()
}

#[tokio::test]
async fn consecutive_sends_accumulate_in_order() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(text_response("One."));
    transport.push_response(text_response("Two."));

    let client = client_with(Arc::clone(&transport));
    let mut chat = client.chat();
    chat.send("first").await.unwrap();
    chat.send("second").await.unwrap();

    let history = chat.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].text().as_deref(), Some("first"));
    assert_eq!(history[1].text().as_deref(), Some("One."));
    assert_eq!(history[2].text().as_deref(), Some("second"));
    assert_eq!(history[3].text().as_deref(), Some("Two."));

    // The second request replays the committed history plus the new turn.
    let requests = transport.recorded_requests();
    assert_eq!(requests[1].contents.len(), 3);
    assert_eq!(requests[1].contents[0].text().as_deref(), Some("first"));
}

#[tokio::test]
async fn seeded_history_is_replayed_verbatim() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(text_response("It was Rust."));

    let client = client_with(Arc::clone(&transport));
    let mut chat = client.chat().with_history(vec![
        Content::user_text("Pick a language."),
        Content::model_text("Rust."),
    ]);
    chat.send("Which did you pick?").await.unwrap();

    let request = &transport.recorded_requests()[0];
    assert_eq!(request.contents.len(), 3);
    assert_eq!(request.contents[1].text().as_deref(), Some("Rust."));
    assert_eq!(chat.history().len(), 4);
}

#[tokio::test]
async fn session_config_shapes_every_request() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(text_response("ok"));

    let client = client_with(Arc::clone(&transport));
    let config = GenerationConfig::new()
        .with_temperature(0.1)
        .with_system_instruction("Answer in one word.")
        .with_tool_config(ToolConfig::mode(FunctionCallingMode::Any));
    let mut chat = client.chat_with_config(config);
    chat.send("Ready?").await.unwrap();

    let request = &transport.recorded_requests()[0];
    assert_eq!(
        request.system_instruction.as_ref().unwrap().text().as_deref(),
        Some("Answer in one word.")
    );
    assert_eq!(
        request.generation_config.as_ref().unwrap().temperature,
        Some(0.1)
    );
    let mode = request
        .tool_config
        .as_ref()
        .unwrap()
        .function_calling_config
        .as_ref()
        .unwrap()
        .mode;
    assert_eq!(mode, Some(FunctionCallingMode::Any));
}

#[tokio::test]
async fn multi_part_user_turns_stay_one_turn() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(text_response("A PDF about crabs."));

    let client = client_with(Arc::clone(&transport));
    let mut chat = client.chat();
    chat.send(vec![
        Part::text("Summarize this."),
        Part::file_uri("https://example.com/crabs.pdf", "application/pdf"),
    ])
    .await
    .unwrap();

    let request = &transport.recorded_requests()[0];
    assert_eq!(request.contents.len(), 1);
    assert_eq!(request.contents[0].parts.len(), 2);
    assert_eq!(chat.history()[0].parts.len(), 2);
}
