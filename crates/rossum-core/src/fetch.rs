//! Retrieval of the final extraction for a ready job.

use tracing::debug;

use crate::api::ElisApi;
use crate::error::{Result, RossumError};
use crate::models::config::Filter;
use crate::models::extraction::ExtractionResult;
use crate::models::job::{Job, JobStatus};

pub struct ResultFetcher<'a, A> {
    api: &'a A,
    filter: Filter,
}

impl<'a, A: ElisApi> ResultFetcher<'a, A> {
    pub fn new(api: &'a A, filter: Filter) -> Self {
        Self { api, filter }
    }

    /// Return the extraction of a ready job.
    ///
    /// The ready status body already carries the extraction, so the cached
    /// response is used when the poller stored one.
    pub async fn fetch(&self, job: &Job) -> Result<ExtractionResult> {
        match job.status {
            JobStatus::Ready => {}
            JobStatus::Failed => return Err(failed(job.id.as_str(), job.message.as_deref())),
            JobStatus::Processing => {
                return Err(RossumError::Validation(format!(
                    "document {} is not ready yet",
                    job.id
                )));
            }
        }

        let body = match &job.last_response {
            Some(body) => body.clone(),
            None => {
                debug!(document_id = %job.id, "No cached response, requesting extraction");
                let response = self.api.document_status(&job.id, self.filter).await?;
                match response.status {
                    JobStatus::Ready => response.body,
                    JobStatus::Failed => {
                        return Err(failed(job.id.as_str(), response.message.as_deref()));
                    }
                    JobStatus::Processing => {
                        return Err(RossumError::Validation(format!(
                            "document {} is still processing",
                            job.id
                        )));
                    }
                }
            }
        };

        ExtractionResult::from_value(body)
    }
}

fn failed(document_id: &str, message: Option<&str>) -> RossumError {
    RossumError::ExtractionFailed {
        document_id: document_id.to_string(),
        message: message.unwrap_or("unknown error").to_string(),
    }
}
