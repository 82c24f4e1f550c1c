//! Request assembly.
//!
//! Pure data construction and validation: contents may be given as a single
//! string, a sequence of parts, or fully-formed turns; the configuration's
//! system instruction and tool declarations are lifted into their dedicated
//! request fields.

use crate::error::{Error, Result};
use crate::types::{Content, GenerateContentRequest, GenerationConfig, Part};

/// Conversion into a full contents sequence.
pub trait IntoContents {
    fn into_contents(self) -> Vec<Content>;
}

impl IntoContents for &str {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::user_text(self)]
    }
}

impl IntoContents for String {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::user_text(self)]
    }
}

impl IntoContents for Part {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::user(vec![self])]
    }
}

impl IntoContents for Vec<Part> {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::user(self)]
    }
}

impl IntoContents for Content {
    fn into_contents(self) -> Vec<Content> {
        vec![self]
    }
}

impl IntoContents for Vec<Content> {
    fn into_contents(self) -> Vec<Content> {
        self
    }
}

/// Conversion into the parts of a single user turn.
pub trait IntoParts {
    fn into_parts(self) -> Vec<Part>;
}

impl IntoParts for &str {
    fn into_parts(self) -> Vec<Part> {
        vec![Part::text(self)]
    }
}

impl IntoParts for String {
    fn into_parts(self) -> Vec<Part> {
        vec![Part::text(self)]
    }
}

impl IntoParts for Part {
    fn into_parts(self) -> Vec<Part> {
        vec![self]
    }
}

impl IntoParts for Vec<Part> {
    fn into_parts(self) -> Vec<Part> {
        self
    }
}

/// Assemble a request from contents and configuration.
///
/// `auto_tools` indicates that dispatched tools will execute automatically;
/// combining that with a response schema is rejected because both shape the
/// response format.
pub fn build_request(
    model: &str,
    contents: Vec<Content>,
    config: &GenerationConfig,
    auto_tools: bool,
) -> Result<GenerateContentRequest> {
    if auto_tools && config.response_schema.is_some() {
        return Err(Error::InvalidInput(
            "response_schema cannot be combined with automatically executed tools".to_string(),
        ));
    }

    let mut generation_config = config.clone();
    let system_instruction = generation_config.system_instruction.take();
    let tools = generation_config.tools.take();
    let tool_config = generation_config.tool_config.take();

    // The provider requires a JSON mime type whenever a schema is set.
    if generation_config.response_schema.is_some()
        && generation_config.response_mime_type.is_none()
    {
        generation_config.response_mime_type = Some("application/json".to_string());
    }

    let has_config = serde_json::to_value(&generation_config)
        .map(|v| v.as_object().is_some_and(|o| !o.is_empty()))
        .unwrap_or(false);

    Ok(GenerateContentRequest {
        model: model.to_string(),
        contents,
        system_instruction,
        tools,
        tool_config,
        generation_config: has_config.then_some(generation_config),
    })
}
