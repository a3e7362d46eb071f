use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

use summary_flow::{
    FileCandidate, PipelineStatus, PostgresSummaryStore, RecordingNavigator, RecordingNotifier,
    SubmissionPipeline, Summarizer, SummaryStore, Uploader,
};

use crate::models::{SubmitResponse, SummaryListResponse};
use crate::providers::{
    HttpBlobStore, HttpIdentityProvider, IdentityProvider, LlmSummarizer, PaymentsPlanChecker,
    SubscriptionChecker, User,
};

type ApiResult<T> = Result<Json<T>, ApiError>;
type ApiError = (StatusCode, Json<Value>);

fn unauthorized_error(message: &str) -> ApiError {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message })))
}

fn upgrade_required_error() -> ApiError {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "An active plan is required to summarize documents" })),
    )
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "summary_id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub uploader: Arc<dyn Uploader>,
    pub summarizer: Arc<dyn Summarizer>,
    pub store: Arc<dyn SummaryStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub plans: Arc<dyn SubscriptionChecker>,
}

pub async fn create_app() -> Router {
    let app_state = create_app_state().await;
    build_router(app_state)
}

async fn create_app_state() -> AppState {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable must be set");

    let store = PostgresSummaryStore::connect(&database_url)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            std::process::exit(1);
        });
    let plans = Arc::new(PaymentsPlanChecker::new(store.pool().clone()));

    let uploader = HttpBlobStore::from_env().unwrap_or_else(|e| {
        error!("Failed to configure blob storage provider: {}", e);
        std::process::exit(1);
    });

    let summarizer = LlmSummarizer::from_env().unwrap_or_else(|e| {
        error!("Failed to configure summarizer: {}", e);
        std::process::exit(1);
    });

    let identity = HttpIdentityProvider::from_env().unwrap_or_else(|e| {
        error!("Failed to configure identity provider: {}", e);
        std::process::exit(1);
    });

    AppState {
        uploader: Arc::new(uploader),
        summarizer: Arc::new(summarizer),
        store: Arc::new(store),
        identity: Arc::new(identity),
        plans,
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/summaries", post(submit_summary).get(list_summaries))
        .route("/summaries/{id}", get(get_summary))
        // Oversized files are rejected by the validator with a proper error,
        // so the transport limit sits above the 20 MiB policy cap.
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "PDF Summary Service",
        "version": "1.0.0",
        "description": "Upload a PDF and receive a persisted AI-generated summary",
        "endpoints": {
            "POST /summaries": "Submit a PDF (multipart form, one 'file' field)",
            "GET /summaries": "List your summaries, newest first",
            "GET /summaries/{id}": "Fetch a single summary",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Resolve the caller and check their plan. Both gates sit upstream of the
/// pipeline, which assumes access was already granted.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized_error("Missing bearer token"))?;

    let user = state
        .identity
        .current_user(token)
        .await
        .map_err(|e| internal_error("Identity lookup failed", &e.to_string()))?
        .ok_or_else(|| unauthorized_error("Sign in to summarize documents"))?;

    let has_plan = state
        .plans
        .has_active_plan(&user.email)
        .await
        .map_err(|e| internal_error("Plan lookup failed", &e.to_string()))?;
    if !has_plan {
        return Err(upgrade_required_error());
    }

    Ok(user)
}

async fn submit_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let file = read_file_field(multipart).await?;

    info!(user = %user.id, file = ?file.as_ref().map(|f| f.name.clone()), "summary submission received");

    // One pipeline per request; the form instance and the submission share a
    // lifetime, so the at-most-one guard is scoped to it.
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let pipeline = SubmissionPipeline::new(
        state.uploader.clone(),
        state.summarizer.clone(),
        state.store.clone(),
        notifier.clone(),
        navigator.clone(),
    );

    let status = pipeline.submit(&user.id, file).await;
    let notifications = notifier.take();

    let response = match status {
        PipelineStatus::Succeeded { summary_id } => (
            StatusCode::CREATED,
            Json(SubmitResponse {
                status: PipelineStatus::Succeeded { summary_id },
                summary_id: Some(summary_id),
                redirect_to: navigator.last_path(),
                notifications,
            }),
        ),
        status @ PipelineStatus::Failed { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(SubmitResponse {
                status,
                summary_id: None,
                redirect_to: None,
                notifications,
            }),
        ),
        // No file attached: the pipeline never left Idle.
        status => (
            StatusCode::BAD_REQUEST,
            Json(SubmitResponse {
                status,
                summary_id: None,
                redirect_to: None,
                notifications,
            }),
        ),
    };

    Ok(response)
}

async fn read_file_field(mut multipart: Multipart) -> Result<Option<FileCandidate>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        internal_error("Failed to read upload form", &e.to_string())
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| internal_error("Failed to read uploaded file", &e.to_string()))?;

        return Ok(Some(FileCandidate::new(name, content_type, bytes)));
    }

    Ok(None)
}

async fn list_summaries(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<SummaryListResponse> {
    let user = authenticate(&state, &headers).await?;

    let summaries = state
        .store
        .list_summaries(&user.id)
        .await
        .map_err(|e| internal_error("Failed to list summaries", &e.to_string()))?;

    Ok(Json(SummaryListResponse { summaries }))
}

async fn get_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<summary_flow::SummaryRecord> {
    let user = authenticate(&state, &headers).await?;

    let record = state
        .store
        .get_summary(id)
        .await
        .map_err(|e| internal_error("Failed to fetch summary", &e.to_string()))?;

    match record {
        Some(record) if record.user_id == user.id => Ok(Json(record)),
        // Absent and not-yours look the same to the caller.
        _ => Err(not_found_error("Summary not found", &id.to_string())),
    }
}
