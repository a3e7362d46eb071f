use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One sequential unit of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    Upload,
    Summarize,
    Save,
}

impl fmt::Display for Stage {
    /// Informal stage names used in user-facing messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validating",
            Stage::Upload => "uploading",
            Stage::Summarize => "processing",
            Stage::Save => "saving",
        };
        write!(f, "{}", name)
    }
}

/// Where a submission currently stands. One instance per active submission,
/// mutated only by the orchestrator and read by the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineStatus {
    Idle,
    Validating,
    Uploading,
    Summarizing,
    Saving,
    Succeeded { summary_id: Uuid },
    Failed { stage: Stage, reason: String },
}

impl PipelineStatus {
    /// Terminal states accept no further automatic transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStatus::Succeeded { .. } | PipelineStatus::Failed { .. }
        )
    }

    /// A submission is in flight: non-idle and non-terminal.
    pub fn is_active(&self) -> bool {
        !matches!(self, PipelineStatus::Idle) && !self.is_terminal()
    }
}

impl Default for PipelineStatus {
    fn default() -> Self {
        PipelineStatus::Idle
    }
}
