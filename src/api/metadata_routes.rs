//! Metadata upload endpoint

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::document::SubmissionDocument;
use crate::error::{SubmissionError, ValidationError};
use crate::executor::{HttpExecutor, StepTransport};
use crate::pipeline::{SubmissionPipeline, SubmissionReport};

/// Multipart part carrying the YAML document.
pub const FILE_FIELD: &str = "file";

#[derive(Clone)]
pub struct MetadataState {
    transport: Arc<dyn StepTransport>,
}

impl MetadataState {
    pub fn new(transport: Arc<dyn StepTransport>) -> Self {
        Self { transport }
    }

    pub fn with_executor(executor: HttpExecutor) -> Self {
        Self::new(Arc::new(executor))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

// Every submission failure is reported as a client error.
impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        warn!(error = %self, "metadata submission failed");
        let body = ErrorResponse {
            detail: self.to_string(),
            upstream_status: self.upstream_status(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

struct Upload {
    file_name: Option<String>,
    content: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, SubmissionError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content = field.bytes().await?.to_vec();
        return Ok(Upload { file_name, content });
    }
    Err(ValidationError::MissingFile(FILE_FIELD).into())
}

/// POST /process_metadata/
async fn process_metadata(
    State(state): State<MetadataState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmissionReport>, SubmissionError> {
    let upload = read_upload(multipart?).await?;

    let span = info_span!(
        "submission",
        submission_id = %Uuid::new_v4(),
        file = upload.file_name.as_deref().unwrap_or("-"),
    );
    let document = span.in_scope(|| {
        info!(bytes = upload.content.len(), "metadata upload received");
        SubmissionDocument::from_yaml_slice(&upload.content)
    })?;

    let report = SubmissionPipeline::new(state.transport.as_ref())
        .with_span(span)
        .run(&document)
        .await?;
    Ok(Json(report))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create router for the metadata endpoints
pub fn create_metadata_router(state: MetadataState) -> Router {
    Router::new()
        .route("/process_metadata/", post(process_metadata))
        .route("/process_metadata", post(process_metadata))
        .route("/health", get(health))
        .with_state(state)
}
