//! Scripted transport for driving conversations without a network.
#![allow(dead_code)]

use async_trait::async_trait;
use converse::types::{GenerateContentRequest, GenerateContentResponse};
use converse::{ChatStream, Error, Result, Transport};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Plays back pre-scripted responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    unary: Mutex<VecDeque<Result<GenerateContentResponse>>>,
    streams: Mutex<VecDeque<Vec<Result<GenerateContentResponse>>>>,
    requests: Mutex<Vec<GenerateContentRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: GenerateContentResponse) {
        self.unary.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_error(&self, error: Error) {
        self.unary.lock().unwrap().push_back(Err(error));
    }

    pub fn push_stream(&self, chunks: Vec<GenerateContentResponse>) {
        self.streams
            .lock()
            .unwrap()
            .push_back(chunks.into_iter().map(Ok).collect());
    }

    pub fn recorded_requests(&self) -> Vec<GenerateContentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.unary
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for {}", request.model))
    }

    async fn execute_stream(&self, request: &GenerateContentRequest) -> Result<ChatStream> {
        self.requests.lock().unwrap().push(request.clone());
        let chunks = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted stream for {}", request.model));
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

/// A response whose single candidate is plain text.
pub fn text_response(text: &str) -> GenerateContentResponse {
    serde_json::from_value(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    }))
    .unwrap()
}

/// A response whose candidate requests the given function calls, in order.
pub fn call_response(calls: &[(&str, Value)]) -> GenerateContentResponse {
    let parts: Vec<Value> = calls
        .iter()
        .map(|(name, args)| json!({"functionCall": {"name": name, "args": args}}))
        .collect();
    serde_json::from_value(json!({
        "candidates": [{"content": {"role": "model", "parts": parts}}]
    }))
    .unwrap()
}

/// A streamed chunk carrying one text fragment.
pub fn text_chunk(text: &str) -> GenerateContentResponse {
    serde_json::from_value(json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    }))
    .unwrap()
}
