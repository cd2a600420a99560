//! Status polling until a job reaches a terminal state.

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ElisApi;
use crate::error::{Result, RossumError};
use crate::models::config::{Filter, PollPolicy};
use crate::models::job::{Job, JobStatus};

/// Repeatedly checks a job's status within the limits of a [`PollPolicy`].
///
/// The first check is issued immediately. The loop ends when the service
/// reports `ready` (returns the job) or `failed`, when attempts or duration
/// run out, or when the cancellation token fires.
pub struct Poller<'a, A> {
    api: &'a A,
    policy: &'a PollPolicy,
    filter: Filter,
}

impl<'a, A: ElisApi> Poller<'a, A> {
    pub fn new(api: &'a A, policy: &'a PollPolicy, filter: Filter) -> Self {
        Self {
            api,
            policy,
            filter,
        }
    }

    /// Wait until the job is ready.
    pub async fn wait(&self, job: Job, cancel: &CancellationToken) -> Result<Job> {
        self.wait_with(job, cancel, |_| {}).await
    }

    /// Wait until the job is ready, calling `on_check` after every status check.
    pub async fn wait_with<F>(&self, mut job: Job, cancel: &CancellationToken, mut on_check: F) -> Result<Job>
    where
        F: FnMut(&Job),
    {
        self.policy.validate()?;

        let started = Instant::now();
        // A duration too large to represent as an instant means no deadline.
        let deadline = started.checked_add(self.policy.max_duration());
        let mut attempts = 0u32;
        let mut network_failures = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(RossumError::Cancelled);
            }

            attempts += 1;
            match self.api.document_status(&job.id, self.filter).await {
                Ok(response) => {
                    network_failures = 0;
                    job.observe(response);
                    on_check(&job);
                    debug!(document_id = %job.id, attempt = attempts, status = ?job.status, "Checked document status");

                    match job.status {
                        JobStatus::Ready => {
                            info!(document_id = %job.id, checks = attempts, elapsed = ?started.elapsed(), "Document ready");
                            return Ok(job);
                        }
                        JobStatus::Failed => {
                            return Err(RossumError::ExtractionFailed {
                                document_id: job.id.clone(),
                                message: job
                                    .message
                                    .clone()
                                    .unwrap_or_else(|| "unknown error".to_string()),
                            });
                        }
                        JobStatus::Processing => {}
                    }
                }
                Err(err) if err.is_retryable() && network_failures < self.policy.max_network_retries => {
                    network_failures += 1;
                    warn!(
                        document_id = %job.id,
                        attempt = attempts,
                        failures = network_failures,
                        error = %err,
                        "Status check failed, retrying"
                    );
                }
                Err(err) => return Err(err),
            }

            let now = Instant::now();
            if attempts >= self.policy.max_attempts || deadline.is_some_and(|d| now >= d) {
                return Err(RossumError::Timeout {
                    document_id: job.id.clone(),
                    attempts,
                    elapsed: now.duration_since(started),
                });
            }

            let mut delay = self.policy.delay_after(attempts);
            if let Some(deadline) = deadline {
                delay = delay.min(deadline - now);
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(RossumError::Cancelled),
                _ = sleep(delay) => {}
            }
        }
    }
}
