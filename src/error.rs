//! Error taxonomy for metadata submission.
//!
//! Every failure a submission can hit is one of two kinds: the uploaded
//! document is rejected before any network traffic (`ValidationError`), or a
//! management API call fails and aborts the remaining steps
//! (`UpstreamRequestError`). `SubmissionError` is what the ingress layer sees.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use thiserror::Error;

/// Longest upstream response excerpt kept in an error.
const BODY_EXCERPT_CHARS: usize = 512;

/// The uploaded document could not be turned into a `SubmissionDocument`.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("invalid metadata document: {0}")]
    Document(#[from] serde_yaml::Error),

    #[error("uploaded file is empty")]
    EmptyUpload,

    #[error("multipart request has no `{0}` file part")]
    MissingFile(&'static str),
}

/// One POST against the management API failed.
#[derive(Error, Debug)]
pub enum UpstreamRequestError {
    #[error("POST {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("POST {endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("POST {endpoint} returned HTTP {status} with a body that is not JSON: {source}")]
    Decode {
        endpoint: String,
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot build {endpoint}: the `{source_step}` response has no usable `id` field")]
    MissingId {
        endpoint: String,
        source_step: &'static str,
    },
}

impl UpstreamRequestError {
    pub fn status(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        Self::Status {
            endpoint: endpoint.into(),
            status,
            body: excerpt(body),
        }
    }

    pub fn decode(
        endpoint: impl Into<String>,
        status: u16,
        body: &str,
        source: serde_json::Error,
    ) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            status,
            body: excerpt(body),
            source,
        }
    }

    /// Endpoint path (relative to the base URL) of the failed call.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. }
            | Self::MissingId { endpoint, .. } => endpoint,
        }
    }

    /// HTTP status reported by the management API, if a response arrived.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Transport { .. } | Self::MissingId { .. } => None,
        }
    }
}

/// Anything that stops a submission, as seen by the ingress endpoint.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("upstream request error: {0}")]
    Upstream(#[from] UpstreamRequestError),

    #[error("failed to read upload: {0}")]
    Upload(#[from] MultipartError),

    #[error("expected a multipart/form-data upload: {0}")]
    NotMultipart(#[from] MultipartRejection),
}

impl SubmissionError {
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream(e) => e.upstream_status(),
            _ => None,
        }
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
