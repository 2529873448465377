//! Authenticated POST executor for the management API.
//!
//! `StepTransport` is the seam between the pipeline and the network.
//! `HttpExecutor` is the reqwest implementation used in production; it sends
//! one JSON POST and hands back the decoded response body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{info, warn};

use crate::document::{Credentials, Payload};
use crate::error::UpstreamRequestError;

/// How a submission authenticates against the management API.
#[derive(Clone)]
pub enum Authorization {
    /// Pre-encoded credential, sent as `Authorization: Basic <value>`.
    Literal(String),
    /// Standard Basic auth built from username and password.
    Basic { username: String, password: String },
}

impl Authorization {
    /// A document's `auth_string` takes precedence over username/password.
    pub fn from_credentials(credentials: &Credentials) -> Self {
        match &credentials.auth_string {
            Some(literal) => Self::Literal(literal.clone()),
            None => Self::Basic {
                username: credentials.username.clone(),
                password: credentials.password.clone(),
            },
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Literal(value) => request.header(AUTHORIZATION, format!("Basic {}", value)),
            Self::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }
}

/// One POST to issue: `base_url` and `endpoint` are joined verbatim.
#[derive(Clone, Copy)]
pub struct StepRequest<'a> {
    pub base_url: &'a str,
    pub endpoint: &'a str,
    pub payload: &'a Payload,
    pub auth: &'a Authorization,
}

impl StepRequest<'_> {
    /// Plain concatenation; slashes are not normalized.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }
}

#[async_trait]
pub trait StepTransport: Send + Sync {
    /// POST the payload and return the decoded JSON response body.
    async fn post_json(&self, request: StepRequest<'_>) -> Result<Value, UpstreamRequestError>;
}

/// reqwest-backed transport. Cloning shares the connection pool.
#[derive(Clone, Default)]
pub struct HttpExecutor {
    http: Client,
}

impl HttpExecutor {
    /// Without a timeout, calls wait as long as the transport allows.
    pub fn new(timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    fn build_request(&self, request: &StepRequest<'_>) -> RequestBuilder {
        let builder = self
            .http
            .post(request.url())
            .header(CONTENT_TYPE, "application/json")
            .json(request.payload);
        request.auth.apply(builder)
    }
}

#[async_trait]
impl StepTransport for HttpExecutor {
    async fn post_json(&self, request: StepRequest<'_>) -> Result<Value, UpstreamRequestError> {
        let url = request.url();
        let payload = serde_json::to_string(request.payload).unwrap_or_default();
        info!(url = %url, payload = %payload, "POST");

        let transport_error = |source: reqwest::Error| {
            warn!(url = %url, error = %source, "POST failed");
            UpstreamRequestError::Transport {
                endpoint: request.endpoint.to_string(),
                source,
            }
        };

        let response = self
            .build_request(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "POST rejected");
            return Err(UpstreamRequestError::status(
                request.endpoint,
                status.as_u16(),
                &body,
            ));
        }
        info!(url = %url, status = status.as_u16(), "POST completed");

        serde_json::from_str(&body).map_err(|source| {
            warn!(url = %url, error = %source, "response body is not JSON");
            UpstreamRequestError::decode(request.endpoint, status.as_u16(), &body, source)
        })
    }
}
