use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use crate::error::{PipelineError, Result};
use crate::model::{FileCandidate, NewSummary, SummaryRecord};
use crate::notify::{Navigator, Notifier};
use crate::stage::{Summarizer, Uploader};
use crate::status::{PipelineStatus, Stage};
use crate::storage::SummaryStore;
use crate::validate::validate;

/// Per-run mutable state: the status flag the UI reads and the attached file
/// reference. Owned exclusively by the single active submission.
struct RunState {
    status: PipelineStatus,
    attached_file: Option<FileCandidate>,
}

/// Drives a submission through validate, upload, summarize and save, in that
/// order. Each stage's success is the precondition for the next; the first
/// failure moves the run to a terminal `Failed` state without touching later
/// stages.
///
/// The notifier and navigator are injected capabilities, so the service can
/// forward notifications to the client and tests can substitute recording
/// stubs.
pub struct SubmissionPipeline {
    uploader: Arc<dyn Uploader>,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn SummaryStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<RunState>,
}

impl SubmissionPipeline {
    pub fn new(
        uploader: Arc<dyn Uploader>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn SummaryStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            uploader,
            summarizer,
            store,
            notifier,
            navigator,
            state: Mutex::new(RunState {
                status: PipelineStatus::Idle,
                attached_file: None,
            }),
        }
    }

    /// Current status, as read by the UI layer.
    pub fn status(&self) -> PipelineStatus {
        self.state.lock().unwrap().status.clone()
    }

    /// The file still attached to the form, if any. Preserved across a
    /// validation failure so the user does not have to re-pick it.
    pub fn attached_file(&self) -> Option<FileCandidate> {
        self.state.lock().unwrap().attached_file.clone()
    }

    /// Acknowledge a terminal state and return to `Idle`.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.status = PipelineStatus::Idle;
        state.attached_file = None;
    }

    /// Run one submission to a terminal state.
    ///
    /// While a submission is in flight, further calls are no-ops that return
    /// the in-flight status. A call from a terminal state starts a fresh run.
    /// Without a file the machine is never entered: the status stays `Idle`
    /// and a validation error is surfaced immediately.
    pub async fn submit(&self, user_id: &str, file: Option<FileCandidate>) -> PipelineStatus {
        let file = {
            let mut state = self.state.lock().unwrap();
            if state.status.is_active() {
                info!(status = ?state.status, "submission already in flight, ignoring");
                return state.status.clone();
            }

            // Fresh submission: terminal leftovers reset to Idle first.
            state.status = PipelineStatus::Idle;
            state.attached_file = None;

            let Some(file) = file else {
                drop(state);
                self.notifier.error("Something went wrong", "No file attached");
                return PipelineStatus::Idle;
            };

            state.attached_file = Some(file.clone());
            state.status = PipelineStatus::Validating;
            file
        };

        match self.run_stages(user_id, &file).await {
            Ok(record) => self.succeed(record),
            Err(err) => self.fail(err),
        }
    }

    async fn run_stages(&self, user_id: &str, file: &FileCandidate) -> Result<SummaryRecord> {
        info!(file = %file.name, size = file.size_bytes(), "validating submission");
        self.notifier
            .info("Validating PDF", "Checking your file before upload");
        validate(file)?;

        self.set_status(PipelineStatus::Uploading);
        info!(file = %file.name, "uploading to storage provider");
        self.notifier
            .info("Uploading PDF", "Hang tight! We are uploading your PDF");
        let document = self.uploader.upload(file).await?;

        self.set_status(PipelineStatus::Summarizing);
        info!(url = %document.remote_url, "requesting summary");
        self.notifier.info(
            "PDF is processing",
            "Hang tight! Our AI is reading through the document",
        );
        let source_file_url = document.remote_url.clone();
        let source_file_name = document.original_file_name.clone();
        let draft = self.summarizer.summarize(document).await?;

        // An Ok draft with an empty body is a failure at this transition, not
        // inside the summarizer.
        if draft.body.trim().is_empty() {
            return Err(PipelineError::empty_result(
                Stage::Summarize,
                "summary body was empty",
            ));
        }

        self.set_status(PipelineStatus::Saving);
        info!("saving summary");
        self.notifier
            .info("Saving PDF", "Hang tight! We are saving your summary");

        // Record invariant: never persist an empty title. A draft without one
        // falls back to the original file name.
        let title = if draft.title.trim().is_empty() {
            source_file_name.clone()
        } else {
            draft.title
        };

        self.store
            .insert_summary(NewSummary {
                user_id: user_id.to_string(),
                title,
                body: draft.body,
                source_file_url,
                source_file_name,
            })
            .await
    }

    fn succeed(&self, record: SummaryRecord) -> PipelineStatus {
        let status = PipelineStatus::Succeeded {
            summary_id: record.id,
        };
        {
            let mut state = self.state.lock().unwrap();
            state.status = status.clone();
            state.attached_file = None;
        }

        info!(summary_id = %record.id, "submission succeeded");
        self.notifier.success(
            "Summary generated",
            "Your summary has been created and saved",
        );
        self.navigator.navigate(&format!("/summaries/{}", record.id));
        status
    }

    fn fail(&self, err: PipelineError) -> PipelineStatus {
        let stage = err.stage();
        // Transport and empty-result failures carry the same user message but
        // stay distinct here.
        match &err {
            PipelineError::Validation { .. } => warn!(%stage, error = %err, "submission rejected"),
            _ => error!(%stage, error = %err, "pipeline stage failed"),
        }

        let status = PipelineStatus::Failed {
            stage,
            reason: err.user_message(),
        };
        {
            let mut state = self.state.lock().unwrap();
            state.status = status.clone();
            // The attachment survives only failures that precede the upload.
            if stage != Stage::Validate {
                state.attached_file = None;
            }
        }

        self.notifier.error("Something went wrong", &err.user_message());
        status
    }

    fn set_status(&self, status: PipelineStatus) {
        self.state.lock().unwrap().status = status;
    }
}
