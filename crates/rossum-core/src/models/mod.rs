//! Data models for jobs, extraction results and configuration.

pub mod config;
pub mod extraction;
pub mod job;

pub use config::{ClientConfig, Filter, PollPolicy, RossumSettings};
pub use extraction::{ExtractionResult, Field};
pub use job::{Job, JobStatus, StatusResponse, SubmitResponse};
