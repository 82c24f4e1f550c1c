//! HTTP transport.
//!
//! [`Transport`] is the seam between request assembly and the network: the
//! production implementation is [`HttpTransport`] over `reqwest`; tests
//! inject scripted implementations to play the model's side of the
//! conversation.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::streaming::ChatStream;
use crate::types::{GenerateContentRequest, GenerateContentResponse};

/// Header carrying the API credential.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Issues generation requests against a remote inference endpoint.
///
/// Two modes: unary (`execute`) returns one complete response; streaming
/// (`execute_stream`) returns a lazy, finite, non-restartable chunk stream.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the complete response.
    async fn execute(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse>;

    /// Send a request and return the chunk stream.
    async fn execute_stream(&self, request: &GenerateContentRequest) -> Result<ChatStream>;
}

/// Error envelope returned by the endpoint on non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// `reqwest`-backed transport for the inference endpoint.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key_present", &!self.api_key.expose_secret().is_empty())
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport over an existing HTTP client.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(self.api_key.expose_secret())
            .map_err(|e| Error::Authentication(format!("invalid API key: {e}")))?;
        headers.insert(API_KEY_HEADER, key);
        Ok(headers)
    }

    fn generate_url(&self, model: &str, stream: bool) -> String {
        if stream {
            format!(
                "{}/models/{}:streamGenerateContent?alt=sse",
                self.base_url, model
            )
        } else {
            format!("{}/models/{}:generateContent", self.base_url, model)
        }
    }

}

/// Map a non-success endpoint reply to [`Error::Api`], preferring the
/// message from the JSON error envelope when one is present.
pub(crate) fn api_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(512).collect());
    Error::Api { status, message }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let url = self.generate_url(&request.model, false);
        tracing::debug!(model = %request.model, turns = request.contents.len(), "unary generate");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }

    async fn execute_stream(&self, request: &GenerateContentRequest) -> Result<ChatStream> {
        let url = self.generate_url(&request.model, true);
        tracing::debug!(model = %request.model, turns = request.contents.len(), "streaming generate");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let events = response.bytes_stream().eventsource();
        let stream = events.filter_map(|event| async move {
            match event {
                Ok(event) => {
                    // Some gateways terminate with an explicit sentinel.
                    if event.data.trim() == "[DONE]" {
                        return None;
                    }
                    Some(
                        serde_json::from_str::<GenerateContentResponse>(&event.data)
                            .map_err(Error::from),
                    )
                }
                Err(e) => Some(Err(Error::Stream(e.to_string()))),
            }
        });
        Ok(Box::pin(stream))
    }
}
