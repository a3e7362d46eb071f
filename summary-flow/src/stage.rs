use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FileCandidate, SummaryDraft, UploadedDocument};

/// Transfers a validated file to the external blob-storage provider.
///
/// Implementations must map a provider response with no usable result to
/// [`PipelineError::EmptyResult`](crate::PipelineError::EmptyResult) and a
/// failed call to [`PipelineError::Transport`](crate::PipelineError::Transport);
/// the orchestrator reports the two differently. On failure no usable remote
/// object is assumed to exist; cleanup is left to provider-side garbage
/// collection.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, file: &FileCandidate) -> Result<UploadedDocument>;
}

/// Extracts text from an uploaded document and produces a structured summary.
///
/// Three failure shapes must stay distinguishable in diagnostics: a transport
/// failure, a successful response with no usable payload, and a payload with a
/// missing or empty summary field. All of them terminate the pipeline before
/// the store is touched.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, document: UploadedDocument) -> Result<SummaryDraft>;
}
