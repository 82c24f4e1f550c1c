//! Data model: conversation content, generation config, wire types.

mod content;
mod files;
mod generation;

pub use content::{
    Blob, CodeExecutionResult, Content, ExecutableCode, FileData, FunctionCall, FunctionResponse,
    Part, Role, VideoMetadata,
};
pub use files::{
    FileHandle, FileState, ListFilesResponse, UploadFileMetadata, UploadFileRequest,
    UploadFileResponse,
};
pub use generation::{
    Candidate, FunctionCallingConfig, FunctionCallingMode, FunctionDeclaration,
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, ToolConfig, ToolDecl,
    UsageMetadata,
};
