//! File upload service.
//!
//! Large inputs are uploaded once and referenced from generation requests
//! as file-reference parts. Upload returns an opaque handle; the provider
//! may report the file as still processing, in which case callers poll
//! `get` until it turns active.

use secrecy::{ExposeSecret, SecretString};
use std::path::Path;

use crate::error::{Error, Result};
use crate::transport::{api_error, API_KEY_HEADER};
use crate::types::{
    FileHandle, ListFilesResponse, UploadFileMetadata, UploadFileRequest, UploadFileResponse,
};

/// Client for the file upload endpoints.
pub struct FileService {
    http: reqwest::Client,
    base_url: String,
    upload_base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("base_url", &self.base_url)
            .field("upload_base_url", &self.upload_base_url)
            .finish()
    }
}

impl FileService {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        upload_base_url: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            upload_base_url: upload_base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn key_header(&self) -> Result<reqwest::header::HeaderValue> {
        reqwest::header::HeaderValue::from_str(self.api_key.expose_secret())
            .map_err(|e| Error::Authentication(format!("invalid API key: {e}")))
    }

    /// Upload raw bytes with an explicit media type.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        display_name: Option<&str>,
    ) -> Result<FileHandle> {
        let metadata = UploadFileRequest {
            file: UploadFileMetadata {
                display_name: display_name.map(str::to_string),
            },
        };
        let metadata_part = reqwest::multipart::Part::text(serde_json::to_string(&metadata)?)
            .mime_str("application/json")
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let file_part = reqwest::multipart::Part::bytes(data)
            .mime_str(mime_type)
            .map_err(|e| Error::InvalidInput(format!("invalid mime type {mime_type}: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        let url = format!("{}/files?uploadType=multipart", self.upload_base_url);
        tracing::debug!(mime_type, "uploading file");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.key_header()?)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(response.json::<UploadFileResponse>().await?.file)
    }

    /// Upload a file from disk, guessing its media type from the extension.
    pub async fn upload_path(&self, path: impl AsRef<Path>) -> Result<FileHandle> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| Error::InvalidInput(format!("cannot read {}: {e}", path.display())))?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let display_name = path.file_name().and_then(|n| n.to_str());
        self.upload(data, &mime_type, display_name).await
    }

    /// Fetch a handle by resource name (`files/...`).
    pub async fn get(&self, name: &str) -> Result<FileHandle> {
        let url = format!("{}/{}", self.base_url, name);
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, self.key_header()?)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }

    /// List uploaded files, one page at a time.
    pub async fn list(
        &self,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<ListFilesResponse> {
        let url = format!("{}/files", self.base_url);
        let mut request = self.http.get(&url).header(API_KEY_HEADER, self.key_header()?);
        if let Some(size) = page_size {
            request = request.query(&[("pageSize", size.to_string())]);
        }
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }

    /// Delete an uploaded file by resource name.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let url = format!("{}/{}", self.base_url, name);
        let response = self
            .http
            .delete(&url)
            .header(API_KEY_HEADER, self.key_header()?)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(())
    }
}
