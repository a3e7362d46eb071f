pub mod error;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod stage;
pub mod status;
pub mod storage;
pub mod validate;

// Re-export commonly used types
pub use error::{PipelineError, Result};
pub use model::{FileCandidate, NewSummary, SummaryDraft, SummaryRecord, UploadedDocument};
pub use notify::{
    Navigator, Notification, NotificationKind, Notifier, RecordingNavigator, RecordingNotifier,
};
pub use pipeline::SubmissionPipeline;
pub use stage::{Summarizer, Uploader};
pub use status::{PipelineStatus, Stage};
pub use storage::{InMemorySummaryStore, PostgresSummaryStore, SummaryStore};
pub use validate::{validate, MAX_UPLOAD_BYTES};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn pdf_file(size: usize) -> FileCandidate {
        FileCandidate::new("report.pdf", "application/pdf", Bytes::from(vec![0u8; size]))
    }

    enum UploadBehavior {
        Succeed,
        TransportError,
        EmptyResult,
        /// Park until released, then succeed.
        Block(Arc<Notify>),
    }

    struct StubUploader {
        behavior: UploadBehavior,
        calls: AtomicUsize,
    }

    impl StubUploader {
        fn new(behavior: UploadBehavior) -> Self {
            Self {
                behavior,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Uploader for StubUploader {
        async fn upload(&self, file: &FileCandidate) -> Result<UploadedDocument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                UploadBehavior::TransportError => Err(PipelineError::transport(
                    Stage::Upload,
                    "connection reset by peer",
                )),
                UploadBehavior::EmptyResult => Err(PipelineError::empty_result(
                    Stage::Upload,
                    "provider returned no upload result",
                )),
                UploadBehavior::Block(gate) => {
                    gate.notified().await;
                    Ok(uploaded(file))
                }
                UploadBehavior::Succeed => Ok(uploaded(file)),
            }
        }
    }

    fn uploaded(file: &FileCandidate) -> UploadedDocument {
        UploadedDocument {
            remote_url: format!("https://files.example/{}", file.name),
            original_file_name: file.name.clone(),
            size_bytes: file.size_bytes(),
        }
    }

    enum SummarizeBehavior {
        Succeed { title: String, body: String },
        TransportError,
        NoPayload,
    }

    struct StubSummarizer {
        behavior: SummarizeBehavior,
        calls: AtomicUsize,
    }

    impl StubSummarizer {
        fn new(behavior: SummarizeBehavior) -> Self {
            Self {
                behavior,
                calls: AtomicUsize::new(0),
            }
        }

        fn succeeding() -> Self {
            Self::new(SummarizeBehavior::Succeed {
                title: "Quarterly Report".to_string(),
                body: "## Overview\nRevenue grew.".to_string(),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, _document: UploadedDocument) -> Result<SummaryDraft> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                SummarizeBehavior::Succeed { title, body } => Ok(SummaryDraft {
                    title: title.clone(),
                    body: body.clone(),
                }),
                SummarizeBehavior::TransportError => Err(PipelineError::transport(
                    Stage::Summarize,
                    "summarization request failed",
                )),
                SummarizeBehavior::NoPayload => Err(PipelineError::empty_result(
                    Stage::Summarize,
                    "response carried no data payload",
                )),
            }
        }
    }

    struct CountingStore {
        inner: InMemorySummaryStore,
        inserts: AtomicUsize,
        fail_inserts: bool,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: InMemorySummaryStore::new(),
                inserts: AtomicUsize::new(0),
                fail_inserts: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_inserts: true,
                ..Self::new()
            }
        }

        fn inserts(&self) -> usize {
            self.inserts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SummaryStore for CountingStore {
        async fn insert_summary(&self, new: NewSummary) -> Result<SummaryRecord> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self.fail_inserts {
                return Err(PipelineError::Persistence(
                    "connection closed mid-write".to_string(),
                ));
            }
            self.inner.insert_summary(new).await
        }

        async fn list_summaries(&self, user_id: &str) -> Result<Vec<SummaryRecord>> {
            self.inner.list_summaries(user_id).await
        }

        async fn get_summary(&self, id: uuid::Uuid) -> Result<Option<SummaryRecord>> {
            self.inner.get_summary(id).await
        }
    }

    struct Harness {
        pipeline: Arc<SubmissionPipeline>,
        uploader: Arc<StubUploader>,
        summarizer: Arc<StubSummarizer>,
        store: Arc<CountingStore>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness(
        uploader: StubUploader,
        summarizer: StubSummarizer,
        store: CountingStore,
    ) -> Harness {
        let uploader = Arc::new(uploader);
        let summarizer = Arc::new(summarizer);
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let pipeline = Arc::new(SubmissionPipeline::new(
            uploader.clone(),
            summarizer.clone(),
            store.clone(),
            notifier.clone(),
            navigator.clone(),
        ));
        Harness {
            pipeline,
            uploader,
            summarizer,
            store,
            notifier,
            navigator,
        }
    }

    #[tokio::test]
    async fn happy_path_creates_record_and_navigates_once() {
        let h = harness(
            StubUploader::new(UploadBehavior::Succeed),
            StubSummarizer::succeeding(),
            CountingStore::new(),
        );

        let status = h
            .pipeline
            .submit("user_1", Some(pdf_file(2 * 1024 * 1024)))
            .await;

        let PipelineStatus::Succeeded { summary_id } = status else {
            panic!("expected success, got {:?}", status);
        };

        let record = h.store.get_summary(summary_id).await.unwrap().unwrap();
        assert_eq!(record.user_id, "user_1");
        assert!(!record.title.trim().is_empty());
        assert!(!record.body.trim().is_empty());
        assert_eq!(record.source_file_name, "report.pdf");

        assert_eq!(
            h.navigator.paths(),
            vec![format!("/summaries/{}", summary_id)]
        );

        let successes: Vec<_> = h
            .notifier
            .notifications()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Success)
            .collect();
        assert_eq!(successes.len(), 1);

        // Form state cleared on success.
        assert!(h.pipeline.attached_file().is_none());
    }

    #[tokio::test]
    async fn missing_file_never_enters_the_machine() {
        let h = harness(
            StubUploader::new(UploadBehavior::Succeed),
            StubSummarizer::succeeding(),
            CountingStore::new(),
        );

        let status = h.pipeline.submit("user_1", None).await;

        assert_eq!(status, PipelineStatus::Idle);
        assert_eq!(h.uploader.calls(), 0);
        let errors: Vec<_> = h
            .notifier
            .notifications()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Error)
            .collect();
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn oversized_file_fails_validation_with_zero_network_calls() {
        let h = harness(
            StubUploader::new(UploadBehavior::Succeed),
            StubSummarizer::succeeding(),
            CountingStore::new(),
        );

        // 25 MiB PDF
        let status = h
            .pipeline
            .submit("user_1", Some(pdf_file(25 * 1024 * 1024)))
            .await;

        assert!(
            matches!(&status, PipelineStatus::Failed { stage: Stage::Validate, .. }),
            "got {:?}",
            status
        );
        assert_eq!(h.uploader.calls(), 0);
        assert_eq!(h.summarizer.calls(), 0);
        // The user should not have to re-pick the file.
        assert!(h.pipeline.attached_file().is_some());
    }

    #[tokio::test]
    async fn wrong_type_rejected_before_any_upload() {
        let h = harness(
            StubUploader::new(UploadBehavior::Succeed),
            StubSummarizer::succeeding(),
            CountingStore::new(),
        );

        let file = FileCandidate::new("photo.png", "image/png", Bytes::from(vec![0u8; 1024]));
        let status = h.pipeline.submit("user_1", Some(file)).await;

        assert!(matches!(
            status,
            PipelineStatus::Failed {
                stage: Stage::Validate,
                ..
            }
        ));
        assert_eq!(h.uploader.calls(), 0);
    }

    #[tokio::test]
    async fn empty_upload_result_stops_before_summarizer() {
        let h = harness(
            StubUploader::new(UploadBehavior::EmptyResult),
            StubSummarizer::succeeding(),
            CountingStore::new(),
        );

        let status = h
            .pipeline
            .submit("user_1", Some(pdf_file(2 * 1024 * 1024)))
            .await;

        let PipelineStatus::Failed { stage, reason } = status else {
            panic!("expected failure");
        };
        assert_eq!(stage, Stage::Upload);
        assert!(reason.contains("different file"));
        assert_eq!(h.summarizer.calls(), 0);
        // Upload had begun, so the attempt is discarded.
        assert!(h.pipeline.attached_file().is_none());
    }

    #[tokio::test]
    async fn upload_transport_failure_reports_upload_stage() {
        let h = harness(
            StubUploader::new(UploadBehavior::TransportError),
            StubSummarizer::succeeding(),
            CountingStore::new(),
        );

        let status = h
            .pipeline
            .submit("user_1", Some(pdf_file(1024)))
            .await;

        assert!(matches!(
            status,
            PipelineStatus::Failed {
                stage: Stage::Upload,
                ..
            }
        ));
        assert_eq!(h.summarizer.calls(), 0);
    }

    #[tokio::test]
    async fn empty_summary_body_stops_before_persister() {
        // Summarizer resolves Ok with an empty body: the failure happens at
        // the Summarizing -> Saving transition.
        let h = harness(
            StubUploader::new(UploadBehavior::Succeed),
            StubSummarizer::new(SummarizeBehavior::Succeed {
                title: "T".to_string(),
                body: String::new(),
            }),
            CountingStore::new(),
        );

        let status = h
            .pipeline
            .submit("user_1", Some(pdf_file(2 * 1024 * 1024)))
            .await;

        assert!(matches!(
            status,
            PipelineStatus::Failed {
                stage: Stage::Summarize,
                ..
            }
        ));
        assert_eq!(h.store.inserts(), 0);
    }

    #[tokio::test]
    async fn summarizer_empty_payload_stops_before_persister() {
        let h = harness(
            StubUploader::new(UploadBehavior::Succeed),
            StubSummarizer::new(SummarizeBehavior::NoPayload),
            CountingStore::new(),
        );

        let status = h.pipeline.submit("user_1", Some(pdf_file(1024))).await;

        assert!(matches!(
            status,
            PipelineStatus::Failed {
                stage: Stage::Summarize,
                ..
            }
        ));
        assert_eq!(h.store.inserts(), 0);
    }

    #[tokio::test]
    async fn save_failure_is_reported_distinctly() {
        let h = harness(
            StubUploader::new(UploadBehavior::Succeed),
            StubSummarizer::succeeding(),
            CountingStore::failing(),
        );

        let status = h.pipeline.submit("user_1", Some(pdf_file(1024))).await;

        let PipelineStatus::Failed { stage, reason } = status else {
            panic!("expected failure");
        };
        assert_eq!(stage, Stage::Save);
        // The document was already uploaded and summarized.
        assert!(reason.contains("could not be saved"));
        assert!(h.navigator.paths().is_empty());
    }

    #[tokio::test]
    async fn second_submission_while_in_flight_is_a_noop() {
        let gate = Arc::new(Notify::new());
        let h = harness(
            StubUploader::new(UploadBehavior::Block(gate.clone())),
            StubSummarizer::succeeding(),
            CountingStore::new(),
        );

        let pipeline = h.pipeline.clone();
        let first = tokio::spawn(async move {
            pipeline.submit("user_1", Some(pdf_file(1024))).await
        });

        // Wait until the first submission is parked inside the uploader.
        while h.pipeline.status() != PipelineStatus::Uploading {
            tokio::task::yield_now().await;
        }

        let second = h.pipeline.submit("user_1", Some(pdf_file(1024))).await;
        assert_eq!(second, PipelineStatus::Uploading);
        assert_eq!(h.uploader.calls(), 1);

        gate.notify_one();
        let first = first.await.unwrap();
        assert!(matches!(first, PipelineStatus::Succeeded { .. }));
        assert_eq!(h.uploader.calls(), 1);
        assert_eq!(h.store.inserts(), 1);
    }

    #[tokio::test]
    async fn resubmission_after_terminal_state_starts_fresh() {
        let h = harness(
            StubUploader::new(UploadBehavior::Succeed),
            StubSummarizer::succeeding(),
            CountingStore::new(),
        );

        let rejected = h
            .pipeline
            .submit("user_1", Some(pdf_file(25 * 1024 * 1024)))
            .await;
        assert!(rejected.is_terminal());

        let retried = h
            .pipeline
            .submit("user_1", Some(pdf_file(1024)))
            .await;
        assert!(matches!(retried, PipelineStatus::Succeeded { .. }));
        assert_eq!(h.store.inserts(), 1);
    }

    #[tokio::test]
    async fn empty_draft_title_falls_back_to_file_name() {
        let h = harness(
            StubUploader::new(UploadBehavior::Succeed),
            StubSummarizer::new(SummarizeBehavior::Succeed {
                title: "  ".to_string(),
                body: "Some body text".to_string(),
            }),
            CountingStore::new(),
        );

        let status = h.pipeline.submit("user_1", Some(pdf_file(1024))).await;
        let PipelineStatus::Succeeded { summary_id } = status else {
            panic!("expected success, got {:?}", status);
        };

        let record = h.store.get_summary(summary_id).await.unwrap().unwrap();
        assert_eq!(record.title, "report.pdf");
    }

    #[tokio::test]
    async fn reset_acknowledges_a_terminal_state() {
        let h = harness(
            StubUploader::new(UploadBehavior::TransportError),
            StubSummarizer::succeeding(),
            CountingStore::new(),
        );

        let status = h.pipeline.submit("user_1", Some(pdf_file(1024))).await;
        assert!(status.is_terminal());

        h.pipeline.reset();
        assert_eq!(h.pipeline.status(), PipelineStatus::Idle);
        assert!(h.pipeline.attached_file().is_none());
    }

    #[tokio::test]
    async fn progress_notifications_are_emitted_per_stage() {
        let h = harness(
            StubUploader::new(UploadBehavior::Succeed),
            StubSummarizer::succeeding(),
            CountingStore::new(),
        );

        h.pipeline.submit("user_1", Some(pdf_file(1024))).await;

        let infos: Vec<String> = h
            .notifier
            .notifications()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Info)
            .map(|n| n.title)
            .collect();
        assert_eq!(
            infos,
            vec![
                "Validating PDF".to_string(),
                "Uploading PDF".to_string(),
                "PDF is processing".to_string(),
                "Saving PDF".to_string(),
            ]
        );
    }
}
