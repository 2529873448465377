//! Ordered submission of a metadata document.
//!
//! The ten management API calls are described by [`SUBMISSION_STEPS`]: each
//! entry names its payload block, its endpoint template and, for link calls,
//! the earlier step whose `id` fills the `{id}` placeholder. The pipeline
//! walks the table strictly in order and stops at the first failure; calls
//! that already succeeded stay committed upstream.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::{debug, error, info, Instrument, Span};

use crate::document::{PayloadBlock, SubmissionDocument};
use crate::error::UpstreamRequestError;
use crate::executor::{Authorization, StepRequest, StepTransport};

const ID_PLACEHOLDER: &str = "{id}";

/// One management API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionStep {
    pub payload: PayloadBlock,
    pub endpoint: &'static str,
    /// Step whose response `id` is substituted into `endpoint`.
    pub id_from: Option<PayloadBlock>,
}

pub const SUBMISSION_STEPS: [SubmissionStep; 10] = [
    SubmissionStep {
        payload: PayloadBlock::Catalog,
        endpoint: "/api/catalogs",
        id_from: None,
    },
    SubmissionStep {
        payload: PayloadBlock::Representation,
        endpoint: "/api/representations",
        id_from: None,
    },
    SubmissionStep {
        payload: PayloadBlock::Offer,
        endpoint: "/api/offers",
        id_from: None,
    },
    SubmissionStep {
        payload: PayloadBlock::ResourceCatalog,
        endpoint: "/api/catalogs/{id}/offers",
        id_from: Some(PayloadBlock::Catalog),
    },
    SubmissionStep {
        payload: PayloadBlock::RepresentationResource,
        endpoint: "/api/offers/{id}/representations",
        id_from: Some(PayloadBlock::Offer),
    },
    SubmissionStep {
        payload: PayloadBlock::Contract,
        endpoint: "/api/contracts",
        id_from: None,
    },
    SubmissionStep {
        payload: PayloadBlock::Rule,
        endpoint: "/api/rules",
        id_from: None,
    },
    SubmissionStep {
        payload: PayloadBlock::RuleContract,
        endpoint: "/api/contracts/{id}/rules",
        id_from: Some(PayloadBlock::Contract),
    },
    SubmissionStep {
        payload: PayloadBlock::Artifact,
        endpoint: "/api/artifacts",
        id_from: None,
    },
    SubmissionStep {
        payload: PayloadBlock::ArtifactRepresentation,
        endpoint: "/api/representations/{id}/artifacts",
        id_from: Some(PayloadBlock::Representation),
    },
];

impl SubmissionStep {
    pub fn name(&self) -> &'static str {
        self.payload.key()
    }

    /// Key of this step's body in the aggregate response.
    pub fn response_key(&self) -> String {
        response_key(self.payload)
    }

    /// Concrete endpoint path, with the referenced id filled in.
    fn resolve_endpoint(&self, report: &SubmissionReport) -> Result<String, UpstreamRequestError> {
        let Some(source) = self.id_from else {
            return Ok(self.endpoint.to_string());
        };
        let id = report
            .response(source)
            .and_then(extract_id)
            .ok_or_else(|| UpstreamRequestError::MissingId {
                endpoint: self.endpoint.to_string(),
                source_step: source.key(),
            })?;
        Ok(self.endpoint.replace(ID_PLACEHOLDER, &id))
    }
}

fn response_key(block: PayloadBlock) -> String {
    format!("{}_response", block.key())
}

/// Strings are used verbatim, numbers in their JSON text form.
fn extract_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Decoded response bodies of a completed submission, in call order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionReport {
    responses: Vec<(PayloadBlock, Value)>,
}

impl SubmissionReport {
    pub fn response(&self, block: PayloadBlock) -> Option<&Value> {
        self.responses
            .iter()
            .find(|(b, _)| *b == block)
            .map(|(_, body)| body)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    fn record(&mut self, block: PayloadBlock, body: Value) {
        self.responses.push((block, body));
    }
}

impl Serialize for SubmissionReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.responses.len()))?;
        for (block, body) in &self.responses {
            map.serialize_entry(&response_key(*block), body)?;
        }
        map.end()
    }
}

/// Runs [`SUBMISSION_STEPS`] for one document over a transport.
///
/// Log events are emitted inside the span handed to [`with_span`](Self::with_span),
/// so callers decide how a submission is labelled in the logs.
pub struct SubmissionPipeline<'t> {
    transport: &'t dyn StepTransport,
    span: Span,
}

impl<'t> SubmissionPipeline<'t> {
    pub fn new(transport: &'t dyn StepTransport) -> Self {
        Self {
            transport,
            span: Span::current(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Submit every block in order. The first failing call aborts the run.
    ///
    /// Running the same document twice issues every call twice.
    pub async fn run(
        &self,
        document: &SubmissionDocument,
    ) -> Result<SubmissionReport, UpstreamRequestError> {
        self.execute(document).instrument(self.span.clone()).await
    }

    async fn execute(
        &self,
        document: &SubmissionDocument,
    ) -> Result<SubmissionReport, UpstreamRequestError> {
        let auth = Authorization::from_credentials(&document.auth);
        let mut report = SubmissionReport::default();

        for (index, step) in SUBMISSION_STEPS.iter().enumerate() {
            let position = index + 1;
            let outcome = match step.resolve_endpoint(&report) {
                Ok(endpoint) => {
                    debug!(step = step.name(), position, endpoint = %endpoint, "dispatching step");
                    let request = StepRequest {
                        base_url: &document.base_url,
                        endpoint: &endpoint,
                        payload: document.payload(step.payload),
                        auth: &auth,
                    };
                    self.transport.post_json(request).await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(body) => report.record(step.payload, body),
                Err(e) => {
                    error!(step = step.name(), position, error = %e, "submission aborted");
                    return Err(e);
                }
            }
        }

        info!(steps = report.len(), "submission complete");
        Ok(report)
    }
}
