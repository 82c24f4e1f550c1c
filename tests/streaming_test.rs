//! Streaming through chat sessions and the one-shot client surface.

mod support;

use converse::prelude::*;
use futures_util::StreamExt;
use serde_json::json;
use std::sync::Arc;
use support::{text_chunk, ScriptedTransport};

fn client_with(transport: Arc<ScriptedTransport>) -> Client {
    Client::builder()
        .transport(transport)
        .model("test-model")
        .build()
        .unwrap()
}

#[tokio::test]
async fn completed_stream_commits_the_exchange() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_stream(vec![text_chunk("Once "), text_chunk("upon "), text_chunk("a time.")]);

    let client = client_with(Arc::clone(&transport));
    let mut chat = client.chat();

    let mut collected = String::new();
    {
        let stream = chat.send_stream("Tell me a story");
        futures_util::pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            if let Some(text) = chunk.unwrap().text() {
                collected.push_str(&text);
            }
        }
    }

    assert_eq!(collected, "Once upon a time.");
    assert_eq!(chat.history().len(), 2);
    assert_eq!(chat.history()[1].text().as_deref(), Some("Once upon a time."));
}

#[tokio::test]
async fn abandoned_stream_commits_nothing() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_stream(vec![text_chunk("partial"), text_chunk(" answer")]);

    let client = client_with(Arc::clone(&transport));
    let mut chat = client.chat();

    {
        let stream = chat.send_stream("Go on");
        futures_util::pin_mut!(stream);
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text().as_deref(), Some("partial"));
        // Dropped before exhaustion.
    }

    assert!(chat.history().is_empty());
}

#[tokio::test]
async fn streamed_function_calls_are_surfaced_not_dispatched() {
    let transport = Arc::new(ScriptedTransport::new());
    let call_chunk = serde_json::from_value(json!({
        "candidates": [{"content": {"role": "model", "parts": [
            {"functionCall": {"name": "lookup", "args": {"q": "rust"}}}
        ]}, "finishReason": "STOP"}]
    }))
    .unwrap();
    transport.push_stream(vec![text_chunk("Checking. "), call_chunk]);

    let client = client_with(Arc::clone(&transport));
    let mut chat = client.chat();
    chat.tools_mut().register_fn(
        FunctionDeclaration::new("lookup", "", json!({"type": "object"})),
        |_| async { Ok(json!({})) },
    );

    let mut calls = Vec::new();
    {
        let stream = chat.send_stream("Look up rust");
        futures_util::pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            for call in chunk.unwrap().function_calls() {
                calls.push(call.name.clone());
            }
        }
    }

    // The call reached the caller; only one request went out.
    assert_eq!(calls, vec!["lookup"]);
    assert_eq!(transport.recorded_requests().len(), 1);
    // The committed model turn retains the call part.
    assert!(chat.history()[1].has_function_calls());
}

#[tokio::test]
async fn one_shot_stream_concatenates_like_unary_text() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_stream(vec![text_chunk("a"), text_chunk("b"), text_chunk("c")]);

    let client = client_with(Arc::clone(&transport));
    let stream = client.generate_stream("spell abc").await.unwrap();
    let response = collect_response(stream).await.unwrap();
    assert_eq!(response.text().as_deref(), Some("abc"));
}
