//! Server-side extraction job as seen by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RossumError};

/// Processing state reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Ready,
    /// The service reports this state as `error`.
    #[serde(alias = "error")]
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

/// One document submitted for extraction.
#[derive(Debug, Clone)]
pub struct Job {
    /// Document identifier assigned by the service.
    pub id: String,

    /// Last known status.
    pub status: JobStatus,

    /// When the document was submitted.
    pub created_at: DateTime<Utc>,

    /// Number of status checks performed so far.
    pub checks: u32,

    /// Failure message reported by the service.
    pub message: Option<String>,

    /// Body of the most recent status response.
    pub last_response: Option<Value>,
}

impl Job {
    /// A freshly submitted job.
    pub fn submitted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Processing,
            created_at: Utc::now(),
            checks: 0,
            message: None,
            last_response: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record the outcome of a status check.
    pub fn observe(&mut self, response: StatusResponse) {
        self.checks += 1;
        self.status = response.status;
        self.message = response.message;
        self.last_response = Some(response.body);
    }
}

/// Parsed body of `GET /document/{id}`.
#[derive(Debug, Clone)]
pub struct StatusResponse {
    pub status: JobStatus,
    pub message: Option<String>,

    /// The complete body; holds the extraction once the status is ready.
    pub body: Value,
}

impl StatusResponse {
    /// Read the status out of a response body.
    pub fn from_body(body: Value) -> Result<Self> {
        #[derive(Deserialize)]
        struct Head {
            status: JobStatus,
            #[serde(default)]
            message: Option<String>,
        }

        let head = Head::deserialize(&body)
            .map_err(|e| RossumError::Parse(format!("invalid status response: {}", e)))?;

        Ok(Self {
            status: head.status,
            message: head.message,
            body,
        })
    }
}

/// Parsed body of `POST /document`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}
