use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A candidate file as submitted through the upload form.
///
/// Lives only for the duration of a single pipeline run. `bytes` is a cheap
/// handle, so the orchestrator can retain the attachment across a validation
/// failure without copying the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCandidate {
    pub name: String,
    /// Declared MIME type; never derived from the payload.
    pub content_type: String,
    pub bytes: Bytes,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of a successful upload: a stable reference to the remote object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub remote_url: String,
    pub original_file_name: String,
    pub size_bytes: u64,
}

/// The summarizer's output, consumed immediately by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryDraft {
    pub title: String,
    /// Markdown-like long text.
    pub body: String,
}

/// Everything needed to create one summary record.
#[derive(Debug, Clone)]
pub struct NewSummary {
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub source_file_url: String,
    pub source_file_name: String,
}

/// The durable summary entity. Immutable once written; every record carries a
/// non-empty title and body and the id of the user who submitted the file.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SummaryRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub source_file_url: String,
    pub source_file_name: String,
    pub created_at: DateTime<Utc>,
}
