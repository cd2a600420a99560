//! Client library for the Rossum Elis invoice extraction API.
//!
//! This crate provides:
//! - Document submission (PDF, PNG, JPEG) with local validation
//! - Status polling with a configurable wait policy, deadline and cancellation
//! - Retrieval and persistence of the JSON extraction result
//! - A field summary matching the service's de-duplication conventions

pub mod api;
pub mod client;
pub mod error;
pub mod fetch;
pub mod models;
pub mod poll;
pub mod submit;
pub mod summary;

pub use api::{ElisApi, HttpApi};
pub use client::{ExtractRequest, RossumClient, default_output_path};
pub use error::{ErrorKind, Result, RossumError, Stage};
pub use fetch::ResultFetcher;
pub use models::{
    ClientConfig, ExtractionResult, Field, Filter, Job, JobStatus, PollPolicy, RossumSettings,
    StatusResponse, SubmitResponse,
};
pub use poll::Poller;
pub use submit::{DocumentUpload, Submitter};

/// Re-exported so callers can cancel an extraction without depending on tokio-util.
pub use tokio_util::sync::CancellationToken;
