use thiserror::Error;

use crate::status::Stage;

/// Errors produced by pipeline stages.
///
/// `Transport` and `EmptyResult` read the same to the user ("try again / use a
/// different file") but stay distinct here so diagnostics can tell a failed
/// call apart from a successful call that returned nothing usable.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Bad input shape, size or type. Never reaches a network stage.
    #[error("invalid file ({reason}): {message}")]
    Validation { reason: String, message: String },

    /// A collaborator call failed outright (network, provider rejection).
    #[error("{stage} failed: {message}")]
    Transport { stage: Stage, message: String },

    /// A collaborator call succeeded but carried no usable payload.
    #[error("{stage} returned no usable result: {detail}")]
    EmptyResult { stage: Stage, detail: String },

    /// The durable write failed. The document was already uploaded and
    /// summarized, so this is surfaced distinctly.
    #[error("failed to save summary: {0}")]
    Persistence(String),
}

impl PipelineError {
    pub fn validation(reason: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Validation {
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub fn transport(stage: Stage, message: impl Into<String>) -> Self {
        PipelineError::Transport {
            stage,
            message: message.into(),
        }
    }

    pub fn empty_result(stage: Stage, detail: impl Into<String>) -> Self {
        PipelineError::EmptyResult {
            stage,
            detail: detail.into(),
        }
    }

    /// The stage this error terminated the pipeline at.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Validation { .. } => Stage::Validate,
            PipelineError::Transport { stage, .. } => *stage,
            PipelineError::EmptyResult { stage, .. } => *stage,
            PipelineError::Persistence(_) => Stage::Save,
        }
    }

    /// Short machine-readable reason code ("size", "type", "missing" for
    /// validation errors; the error kind otherwise).
    pub fn reason(&self) -> &str {
        match self {
            PipelineError::Validation { reason, .. } => reason,
            PipelineError::Transport { .. } => "transport",
            PipelineError::EmptyResult { .. } => "empty_result",
            PipelineError::Persistence(_) => "persistence",
        }
    }

    /// Human-readable text for the terminal failure notification, with a
    /// corrective suggestion where one is known.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Validation { message, .. } => message.clone(),
            PipelineError::Transport { stage, .. } | PipelineError::EmptyResult { stage, .. } => {
                match stage {
                    Stage::Upload => {
                        "Something went wrong while uploading. Use a different file".to_string()
                    }
                    _ => format!("Something went wrong while {}. Please try again", stage),
                }
            }
            PipelineError::Persistence(_) => {
                "Your summary was generated but could not be saved. Please try again".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
