//! Client construction and one-shot generation calls.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::chat::ChatSession;
use crate::error::{Error, Result};
use crate::files::FileService;
use crate::request::{build_request, IntoContents};
use crate::streaming::ChatStream;
use crate::structured;
use crate::transport::{HttpTransport, Transport};
use crate::types::{GenerateContentResponse, GenerationConfig};

/// Default inference endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default upload endpoint.
pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://generativelanguage.googleapis.com/upload/v1beta";

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Entry point for all API operations.
///
/// ```no_run
/// # async fn run() -> converse::Result<()> {
/// let client = converse::Client::builder()
///     .api_key("...")
///     .model("gemini-2.5-flash")
///     .build()?;
/// let response = client.generate("Why is the sky blue?").await?;
/// println!("{}", response.text().unwrap_or_default());
/// # Ok(())
/// # }
/// ```
pub struct Client {
    transport: Arc<dyn Transport>,
    model: String,
    files: Option<FileService>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("model", &self.model).finish()
    }
}

impl Client {
    /// Create a client with defaults, resolving the API key from the
    /// environment or credential file.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Start building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The configured default model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The file upload service.
    ///
    /// Unavailable when the client was built over a custom transport, since
    /// uploads bypass the transport seam.
    pub fn files(&self) -> Result<&FileService> {
        self.files.as_ref().ok_or_else(|| {
            Error::InvalidInput("file service is unavailable with a custom transport".to_string())
        })
    }

    /// One-shot generation with default configuration.
    pub async fn generate(
        &self,
        message: impl IntoContents,
    ) -> Result<GenerateContentResponse> {
        self.generate_with_config(message, &GenerationConfig::default())
            .await
    }

    /// One-shot generation with explicit configuration.
    pub async fn generate_with_config(
        &self,
        message: impl IntoContents,
        config: &GenerationConfig,
    ) -> Result<GenerateContentResponse> {
        let request = build_request(&self.model, message.into_contents(), config, false)?;
        self.transport.execute(&request).await
    }

    /// One-shot streaming generation with default configuration.
    pub async fn generate_stream(&self, message: impl IntoContents) -> Result<ChatStream> {
        self.generate_stream_with_config(message, &GenerationConfig::default())
            .await
    }

    /// One-shot streaming generation with explicit configuration.
    pub async fn generate_stream_with_config(
        &self,
        message: impl IntoContents,
        config: &GenerationConfig,
    ) -> Result<ChatStream> {
        let request = build_request(&self.model, message.into_contents(), config, false)?;
        self.transport.execute_stream(&request).await
    }

    /// Generate output conforming to a JSON schema and decode it.
    ///
    /// The schema is both sent to the provider (constrained decoding) and
    /// enforced locally: a non-conforming payload fails closed with a
    /// schema-validation error.
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        message: impl IntoContents,
        schema: serde_json::Value,
    ) -> Result<T> {
        let config = GenerationConfig::new().with_response_schema(schema.clone());
        let response = self.generate_with_config(message, &config).await?;
        let payload = response.text().ok_or_else(|| {
            Error::SchemaValidation("response contained no text payload".to_string())
        })?;
        structured::decode(&schema, &payload)
    }

    /// Open a chat session with default configuration.
    pub fn chat(&self) -> ChatSession {
        self.chat_with_config(GenerationConfig::default())
    }

    /// Open a chat session with explicit configuration.
    pub fn chat_with_config(&self, config: GenerationConfig) -> ChatSession {
        ChatSession::new(Arc::clone(&self.transport), self.model.clone(), config)
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    upload_base_url: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Set the API key explicitly, bypassing environment resolution.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the inference endpoint (e.g. a proxy).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the upload endpoint.
    pub fn upload_base_url(mut self, url: impl Into<String>) -> Self {
        self.upload_base_url = Some(url.into());
        self
    }

    /// Set the default model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the request timeout (default 120s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Inject a custom transport. Intended for tests and instrumentation;
    /// skips credential resolution entirely.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client, resolving credentials unless a transport was
    /// injected.
    pub fn build(self) -> Result<Client> {
        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        if let Some(transport) = self.transport {
            return Ok(Client {
                transport,
                model,
                files: None,
            });
        }

        let api_key = crate::auth::resolve_api_key(self.api_key.as_deref())?;
        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let upload_base_url = self
            .upload_base_url
            .unwrap_or_else(|| DEFAULT_UPLOAD_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        let transport = HttpTransport::new(http.clone(), base_url.clone(), api_key.clone());
        let files = FileService::new(http, base_url, upload_base_url, api_key);

        Ok(Client {
            transport: Arc::new(transport),
            model,
            files: Some(files),
        })
    }
}
