//! Streaming response assembly.
//!
//! A streamed response is a lazy, finite, non-restartable sequence of
//! partial [`GenerateContentResponse`] chunks. The assembler accumulates
//! chunks into one materialized response; metadata-only chunks (no textual
//! content) are tolerated and never produce empty output.

use futures::Stream;
use futures_util::StreamExt;
use std::pin::Pin;

use crate::error::Result;
use crate::types::{Candidate, Content, GenerateContentResponse, Part, Role};

/// A lazy, finite stream of partial responses.
///
/// Terminates when the provider signals completion. Not restartable: issue a
/// new request to regenerate.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

/// Accumulates streamed chunks into a single materialized response.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    text: String,
    parts: Vec<Part>,
    finish_reason: Option<String>,
    usage: Option<crate::types::UsageMetadata>,
    model_version: Option<String>,
    response_id: Option<String>,
}

impl ResponseAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk in. Chunks without textual content are skipped for
    /// text purposes; their metadata (usage, finish reason) is still taken.
    pub fn push(&mut self, chunk: &GenerateContentResponse) {
        if let Some(candidate) = chunk.candidates.first() {
            if let Some(content) = &candidate.content {
                for part in &content.parts {
                    match part {
                        Part::Text(text) if text.is_empty() => {}
                        Part::Text(text) => self.text.push_str(text),
                        other => {
                            self.flush_text();
                            self.parts.push(other.clone());
                        }
                    }
                }
            }
            if candidate.finish_reason.is_some() {
                self.finish_reason = candidate.finish_reason.clone();
            }
        }
        if chunk.usage_metadata.is_some() {
            self.usage = chunk.usage_metadata.clone();
        }
        if chunk.model_version.is_some() {
            self.model_version = chunk.model_version.clone();
        }
        if chunk.response_id.is_some() {
            self.response_id = chunk.response_id.clone();
        }
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.parts.push(Part::Text(std::mem::take(&mut self.text)));
        }
    }

    /// The model turn accumulated so far.
    pub fn into_content(mut self) -> Content {
        self.flush_text();
        Content {
            role: Role::Model,
            parts: self.parts,
        }
    }

    /// Materialize the full response.
    pub fn finish(mut self) -> GenerateContentResponse {
        self.flush_text();
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Role::Model,
                    parts: std::mem::take(&mut self.parts),
                }),
                finish_reason: self.finish_reason.take(),
                index: Some(0),
            }],
            usage_metadata: self.usage.take(),
            model_version: self.model_version.take(),
            response_id: self.response_id.take(),
        }
    }
}

/// Drain a stream and assemble the materialized response.
pub async fn collect_response(mut stream: ChatStream) -> Result<GenerateContentResponse> {
    let mut acc = ResponseAccumulator::new();
    while let Some(chunk) = stream.next().await {
        acc.push(&chunk?);
    }
    Ok(acc.finish())
}

/// Map a chunk stream to its non-empty text fragments.
///
/// Metadata-only chunks yield nothing, so concatenating the items equals
/// concatenating the non-empty chunk texts exactly.
pub fn text_stream(stream: ChatStream) -> impl Stream<Item = Result<String>> + Send {
    stream.filter_map(|chunk| async move {
        match chunk {
            Ok(chunk) => match chunk.text() {
                Some(text) if !text.is_empty() => Some(Ok(text)),
                _ => None,
            },
            Err(e) => Some(Err(e)),
        }
    })
}
