//! Connector metadata submission.
//!
//! Accepts a YAML document describing a data-space connector offering
//! (catalog, representation, offer, contract, rule, artifact and the links
//! between them) and replays it as ten dependent POST calls against the
//! connector's management API.

pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod telemetry;

pub use document::{Credentials, Payload, PayloadBlock, SubmissionDocument};
pub use error::{SubmissionError, UpstreamRequestError, ValidationError};
pub use executor::{Authorization, HttpExecutor, StepRequest, StepTransport};
pub use pipeline::{SubmissionPipeline, SubmissionReport, SubmissionStep, SUBMISSION_STEPS};
