//! High-level extraction client: submit, poll, fetch, optionally save.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{ElisApi, HttpApi};
use crate::error::{Result, RossumError, Stage};
use crate::fetch::ResultFetcher;
use crate::models::config::{ClientConfig, DEFAULT_MAX_UPLOAD_BYTES, Filter, PollPolicy};
use crate::models::extraction::ExtractionResult;
use crate::models::job::Job;
use crate::poll::Poller;
use crate::submit::Submitter;

/// Host of the web preview for extracted documents.
const PREVIEW_URL: &str = "https://rossum.ai/document";

/// One document to extract, with per-request overrides of the client defaults.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub document: PathBuf,
    pub output: Option<PathBuf>,
    pub locale: Option<String>,
    pub tables: Option<bool>,
    pub filter: Option<Filter>,
}

impl ExtractRequest {
    pub fn new(document: impl Into<PathBuf>) -> Self {
        Self {
            document: document.into(),
            output: None,
            locale: None,
            tables: None,
            filter: None,
        }
    }

    /// Save the result to `output` once extracted.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Save the result next to the document (`<document>.json`).
    pub fn with_default_output(self) -> Self {
        let output = default_output_path(&self.document);
        self.with_output(output)
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_tables(mut self, tables: bool) -> Self {
        self.tables = Some(tables);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Client configuration with this request's overrides applied.
    pub fn apply(&self, base: &ClientConfig) -> ClientConfig {
        let mut config = base.clone();
        if let Some(locale) = &self.locale {
            config.locale = Some(locale.clone());
        }
        if let Some(tables) = self.tables {
            config.tables = tables;
        }
        if let Some(filter) = self.filter {
            config.filter = filter;
        }
        config
    }
}

/// Output path used when none is given: the document path with `.json` appended.
pub fn default_output_path(document: &Path) -> PathBuf {
    let mut path = OsString::from(document.as_os_str());
    path.push(".json");
    PathBuf::from(path)
}

/// Client for the Elis extraction API.
///
/// # Example
///
/// ```rust,ignore
/// use rossum_core::{ClientConfig, ExtractRequest, RossumClient};
///
/// let client = RossumClient::new(ClientConfig::new(api_key)?)?;
/// let result = client
///     .extract(&ExtractRequest::new("invoice.pdf").with_default_output())
///     .await?;
/// println!("{} fields", result.fields.len());
/// ```
pub struct RossumClient<A = HttpApi> {
    api: A,
    config: ClientConfig,
    policy: PollPolicy,
    max_upload_bytes: u64,
}

impl RossumClient<HttpApi> {
    /// Create a client talking to the configured endpoint over HTTPS.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = HttpApi::new(&config)?;
        Ok(Self::with_api(api, config))
    }
}

impl<A: ElisApi> RossumClient<A> {
    /// Create a client over a custom transport.
    pub fn with_api(api: A, config: ClientConfig) -> Self {
        Self {
            api,
            config,
            policy: PollPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Extract a document and wait for the result.
    pub async fn extract(&self, request: &ExtractRequest) -> Result<ExtractionResult> {
        self.extract_with(request, &CancellationToken::new(), |_| {})
            .await
    }

    /// Extract a document, observing every status check and honouring `cancel`.
    ///
    /// Errors are annotated with the [`Stage`] that produced them.
    pub async fn extract_with<F>(
        &self,
        request: &ExtractRequest,
        cancel: &CancellationToken,
        on_check: F,
    ) -> Result<ExtractionResult>
    where
        F: FnMut(&Job),
    {
        if cancel.is_cancelled() {
            return Err(RossumError::Cancelled.at(Stage::Submit));
        }

        let config = request.apply(&self.config);

        info!(document = %request.document.display(), "Extracting document");
        let job = Submitter::new(&self.api, &config)
            .submit_path(&request.document, self.max_upload_bytes)
            .await
            .map_err(|e| e.at(Stage::Submit))?;

        let job = Poller::new(&self.api, &self.policy, config.filter)
            .wait_with(job, cancel, on_check)
            .await
            .map_err(|e| e.at(Stage::Poll))?;

        let result = ResultFetcher::new(&self.api, config.filter)
            .fetch(&job)
            .await
            .map_err(|e| e.at(Stage::Fetch))?;

        if let Some(output) = &request.output {
            result.save(output).map_err(|e| e.at(Stage::Save))?;
            info!(document_id = %job.id, output = %output.display(), "Extraction saved");
        }

        Ok(result)
    }

    /// Web preview of an extracted document.
    ///
    /// The URL embeds the API key; do not log it.
    pub fn document_preview_url(&self, document_id: &str) -> String {
        format!("{}/{}?apikey={}", PREVIEW_URL, document_id, self.config.api_key)
    }
}
