//! Error types for the rossum-core library.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Main error type for the rossum library.
#[derive(Error, Debug)]
pub enum RossumError {
    /// The service rejected the API key (HTTP 401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The request was rejected: unsupported file, oversized payload or
    /// invalid parameters.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Connection failure or transient server error. Safe to retry.
    #[error("network error: {0}")]
    Network(String),

    /// Polling budget exhausted while the document was still processing.
    #[error("document {document_id} still processing after {attempts} checks ({elapsed:?})")]
    Timeout {
        document_id: String,
        attempts: u32,
        elapsed: Duration,
    },

    /// The service reported that extraction failed.
    #[error("extraction of document {document_id} failed: {message}")]
    ExtractionFailed { document_id: String, message: String },

    /// Malformed response body.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Missing API key or invalid settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Error annotated with the extraction stage it came from.
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<RossumError>,
    },
}

/// Stage of the extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Submit,
    Poll,
    Fetch,
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Submit => write!(f, "submit"),
            Stage::Poll => write!(f, "poll"),
            Stage::Fetch => write!(f, "fetch"),
            Stage::Save => write!(f, "save"),
        }
    }
}

/// Error kind, independent of the stage annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Validation,
    Network,
    Timeout,
    ExtractionFailed,
    Parse,
    Config,
    Io,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Auth => "AuthError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::ExtractionFailed => "ExtractionFailedError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Io => "IoError",
            ErrorKind::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

impl RossumError {
    /// Kind of the underlying error, looking through stage annotations.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RossumError::Auth(_) => ErrorKind::Auth,
            RossumError::Validation(_) => ErrorKind::Validation,
            RossumError::Network(_) => ErrorKind::Network,
            RossumError::Timeout { .. } => ErrorKind::Timeout,
            RossumError::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            RossumError::Parse(_) => ErrorKind::Parse,
            RossumError::Config(_) => ErrorKind::Config,
            RossumError::Io(_) => ErrorKind::Io,
            RossumError::Cancelled => ErrorKind::Cancelled,
            RossumError::Stage { source, .. } => source.kind(),
        }
    }

    /// Stage that failed, if the error was annotated by the client facade.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RossumError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    /// Wrap the error with the stage it came from.
    pub fn at(self, stage: Stage) -> Self {
        RossumError::Stage {
            stage,
            source: Box::new(self),
        }
    }
}

impl From<reqwest::Error> for RossumError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RossumError::Parse(err.to_string())
        } else {
            RossumError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RossumError {
    fn from(err: serde_json::Error) -> Self {
        RossumError::Parse(err.to_string())
    }
}

/// Result type for the rossum library.
pub type Result<T> = std::result::Result<T, RossumError>;
