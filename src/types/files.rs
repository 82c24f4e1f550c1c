//! File upload handle types.

use serde::{Deserialize, Serialize};

/// An opaque handle returned by the file upload endpoint.
///
/// Large inputs are uploaded once and referenced by many requests as
/// file-reference parts (`Part::file_uri(handle.uri, ...)`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    /// Resource name, e.g. `files/abc-123`.
    #[serde(default)]
    pub name: String,
    /// URI referencable from generation requests.
    #[serde(default)]
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<FileState>,
}

impl FileHandle {
    /// Whether the file has finished server-side processing.
    pub fn is_active(&self) -> bool {
        matches!(self.state, Some(FileState::Active))
    }
}

/// Server-side processing state of an uploaded file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileState {
    #[serde(rename = "STATE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "PROCESSING")]
    Processing,
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Wrapper envelope returned by the upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileResponse {
    pub file: FileHandle,
}

/// Metadata sent alongside the uploaded bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileRequest {
    pub file: UploadFileMetadata,
}

/// User-visible metadata for an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Page of file handles from the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesResponse {
    #[serde(default)]
    pub files: Vec<FileHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}
