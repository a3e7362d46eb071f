use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use summary_flow::{FileCandidate, PipelineError, Result, Stage, UploadedDocument, Uploader};

/// Uploader backed by the external blob-storage provider's HTTP API.
///
/// The provider answers a multipart POST with a JSON array shaped like
/// `[{ "serverData": { "file": { "url": "..." } } }]`. A failed call maps to a
/// transport error; a 2xx response without a usable file url maps to an
/// empty-result error. No cleanup is attempted on failure; orphaned objects
/// are left to provider-side garbage collection.
pub struct HttpBlobStore {
    client: Client,
    endpoint: String,
    token: String,
}

impl HttpBlobStore {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint = std::env::var("UPLOAD_PROVIDER_URL")
            .map_err(|_| anyhow::anyhow!("UPLOAD_PROVIDER_URL not set"))?;
        let token = std::env::var("UPLOAD_PROVIDER_TOKEN")
            .map_err(|_| anyhow::anyhow!("UPLOAD_PROVIDER_TOKEN not set"))?;
        Ok(Self::new(endpoint, token))
    }
}

#[async_trait]
impl Uploader for HttpBlobStore {
    async fn upload(&self, file: &FileCandidate) -> Result<UploadedDocument> {
        info!(file = %file.name, size = file.size_bytes(), "uploading to blob storage provider");

        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| PipelineError::transport(Stage::Upload, e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::transport(Stage::Upload, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::transport(
                Stage::Upload,
                format!("provider responded with {}", status),
            ));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::transport(Stage::Upload, e.to_string()))?;

        match extract_file_url(&payload) {
            Some(url) => Ok(UploadedDocument {
                remote_url: url.to_string(),
                original_file_name: file.name.clone(),
                size_bytes: file.size_bytes(),
            }),
            None => {
                warn!(file = %file.name, "provider returned 2xx but no file url");
                Err(PipelineError::empty_result(
                    Stage::Upload,
                    "provider response carried no file url",
                ))
            }
        }
    }
}

fn extract_file_url(payload: &Value) -> Option<&str> {
    payload
        .pointer("/0/serverData/file/url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
}
