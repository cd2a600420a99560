//! reqwest-based implementation of [`ElisApi`].

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

use super::ElisApi;
use crate::error::{Result, RossumError};
use crate::models::config::{ClientConfig, Filter};
use crate::models::job::{StatusResponse, SubmitResponse};
use crate::submit::DocumentUpload;

/// Longest error body excerpt carried into error messages.
const MAX_ERROR_BODY: usize = 200;

/// HTTP client for the Elis API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client authenticating with the configured API key.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("secret_key {}", config.api_key))
            .map_err(|_| {
                RossumError::Config("API key contains characters not allowed in a header".to_string())
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .user_agent(concat!("rossum-client/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| RossumError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ElisApi for HttpApi {
    async fn submit_document(
        &self,
        upload: &DocumentUpload,
        locale: &str,
        tables: bool,
    ) -> Result<SubmitResponse> {
        let url = format!("{}/document", self.base_url);

        let part = Part::bytes(upload.data.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.content_type)
            .map_err(|e| RossumError::Validation(format!("invalid content type: {}", e)))?;
        let form = Form::new().part("file", part);

        debug!(url = %url, file = %upload.file_name, bytes = upload.data.len(), "Uploading document");

        let response = self
            .client
            .post(&url)
            .query(&[("locale", locale), ("tables", if tables { "true" } else { "false" })])
            .multipart(form)
            .send()
            .await?;

        let body = read_json(response).await?;
        if let Some(error) = body.get("error") {
            return Err(RossumError::Validation(value_text(error)));
        }

        serde_json::from_value(body)
            .map_err(|e| RossumError::Parse(format!("invalid submit response: {}", e)))
    }

    async fn document_status(&self, document_id: &str, filter: Filter) -> Result<StatusResponse> {
        let url = format!("{}/document/{}", self.base_url, document_id);

        let response = self
            .client
            .get(&url)
            .query(&[("filter", filter.as_str())])
            .send()
            .await?;

        let body = read_json(response).await?;
        if body.get("status").is_none() {
            if let Some(error) = body.get("error") {
                return Err(RossumError::Validation(value_text(error)));
            }
        }

        StatusResponse::from_body(body)
    }
}

/// Read a JSON body, classifying non-success statuses.
async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(classify_status(status.as_u16(), &text));
    }

    serde_json::from_str(&text)
        .map_err(|e| RossumError::Parse(format!("response is not valid JSON: {}", e)))
}

/// Map an HTTP error status to an error kind.
pub(crate) fn classify_status(status: u16, body: &str) -> RossumError {
    let message = match error_message(body) {
        Some(detail) => format!("HTTP {}: {}", status, detail),
        None => format!("HTTP {}", status),
    };

    match status {
        401 | 403 => RossumError::Auth(message),
        413 => RossumError::Validation(format!("payload too large ({})", message)),
        408 | 429 | 500..=599 => RossumError::Network(message),
        _ => RossumError::Validation(message),
    }
}

fn error_message(body: &str) -> Option<String> {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(value) = json.get(key) {
                return Some(value_text(value));
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_ERROR_BODY).collect())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
