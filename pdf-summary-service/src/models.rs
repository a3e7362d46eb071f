use serde::Serialize;
use summary_flow::{Notification, PipelineStatus, SummaryRecord};
use uuid::Uuid;

/// Outcome of one form submission, including the notification side channel
/// the pipeline emitted while it ran.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: PipelineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct SummaryListResponse {
    pub summaries: Vec<SummaryRecord>,
}
