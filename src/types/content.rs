//! Conversation content types.
//!
//! A conversation is an ordered sequence of [`Content`] turns; each turn
//! holds ordered, typed [`Part`]s. Part order is semantically meaningful
//! (e.g. text following file data), so nothing here reorders parts.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Role of a conversation turn.
///
/// Alternation between `User` and `Model` is conventional but not enforced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One role-attributed unit of conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Creates a user turn from parts.
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    /// Creates a model turn from parts.
    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    /// Creates a single-text user turn.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![Part::text(text)])
    }

    /// Creates a single-text model turn.
    pub fn model_text(text: impl Into<String>) -> Self {
        Self::model(vec![Part::text(text)])
    }

    /// Concatenated text of all non-empty text parts, if any.
    pub fn text(&self) -> Option<String> {
        let mut out = String::new();
        for part in &self.parts {
            if let Part::Text(text) = part {
                out.push_str(text);
            }
        }
        if out.is_empty() { None } else { Some(out) }
    }

    /// All function-call parts, in part order.
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Whether any part is a function call.
    pub fn has_function_calls(&self) -> bool {
        self.parts.iter().any(Part::is_function_call)
    }
}

/// A single typed content unit within a turn.
///
/// Exactly one variant is populated per part; the wire form is the
/// externally tagged object the provider expects (`{"text": ...}`,
/// `{"functionCall": {...}}`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    /// Plain text.
    Text(String),
    /// Inline binary data (base64) with a media type.
    InlineData(Blob),
    /// Reference to uploaded or external file data.
    FileData(FileData),
    /// A request from the model to invoke a named tool.
    FunctionCall(FunctionCall),
    /// The result of a tool invocation, fed back to the model.
    FunctionResponse(FunctionResponse),
    /// Code the provider generated for execution (code-execution tool).
    ExecutableCode(ExecutableCode),
    /// Output of provider-side code execution.
    CodeExecutionResult(CodeExecutionResult),
}

impl Part {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates an inline-data part from raw bytes, base64-encoding them.
    pub fn inline_data(data: impl AsRef<[u8]>, mime_type: impl Into<String>) -> Self {
        Self::InlineData(Blob {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(data),
        })
    }

    /// Creates a file-reference part from an upload handle URI or public URL.
    pub fn file_uri(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::FileData(FileData {
            file_uri: uri.into(),
            mime_type: Some(mime_type.into()),
            video_metadata: None,
        })
    }

    /// Creates a file-reference part for a video with clipping metadata.
    ///
    /// Sampling policy (frame rate, audio bitrate) is provider-enforced and
    /// not represented here.
    pub fn video_uri(
        uri: impl Into<String>,
        mime_type: impl Into<String>,
        metadata: VideoMetadata,
    ) -> Self {
        Self::FileData(FileData {
            file_uri: uri.into(),
            mime_type: Some(mime_type.into()),
            video_metadata: Some(metadata),
        })
    }

    /// Creates a function-call part.
    pub fn function_call(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self::FunctionCall(FunctionCall {
            name: name.into(),
            args,
        })
    }

    /// Creates a function-response part.
    pub fn function_response(name: impl Into<String>, response: serde_json::Value) -> Self {
        Self::FunctionResponse(FunctionResponse {
            name: name.into(),
            response,
        })
    }

    /// Whether this is a text part.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Whether this is a function call.
    pub fn is_function_call(&self) -> bool {
        matches!(self, Self::FunctionCall(_))
    }

    /// The text content, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The call data, if this is a function-call part.
    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match self {
            Self::FunctionCall(call) => Some(call),
            _ => None,
        }
    }
}

/// Inline binary data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

/// Reference to file data by URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub file_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_metadata: Option<VideoMetadata>,
}

/// Optional clipping metadata for video file references.
///
/// Offsets are duration strings as the provider expects them, e.g. `"90s"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<String>,
}

impl VideoMetadata {
    /// Clip to the given start/end offsets (seconds).
    pub fn clip(start_secs: u64, end_secs: u64) -> Self {
        Self {
            start_offset: Some(format!("{start_secs}s")),
            end_offset: Some(format!("{end_secs}s")),
        }
    }
}

/// A request for invocation emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// Keyword-argument mapping.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// An invocation result fed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    pub name: String,
    /// Result mapping; error-shaped (`{"error": ...}`) when the tool faulted.
    pub response: serde_json::Value,
}

/// Code generated by the provider for execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutableCode {
    pub language: String,
    pub code: String,
}

/// Output of provider-side code execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeExecutionResult {
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}
