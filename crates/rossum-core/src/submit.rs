//! Document submission.

use std::path::Path;

use tracing::{debug, info};

use crate::api::ElisApi;
use crate::error::{Result, RossumError};
use crate::models::config::ClientConfig;
use crate::models::job::Job;

/// A validated document ready for upload.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// File name sent in the multipart part.
    pub file_name: String,

    /// MIME type derived from the extension.
    pub content_type: &'static str,

    /// Document bytes.
    pub data: Vec<u8>,
}

impl DocumentUpload {
    /// Content type for a supported document extension.
    pub fn content_type_for(path: &Path) -> Result<&'static str> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Ok("application/pdf"),
            "png" => Ok("image/png"),
            "jpg" | "jpeg" => Ok("image/jpeg"),
            _ => Err(RossumError::Validation(format!(
                "unsupported document type '{}' (expected PDF, PNG or JPEG): {}",
                extension,
                path.display()
            ))),
        }
    }

    /// Build an upload from in-memory bytes.
    pub fn from_bytes(file_name: impl Into<String>, data: Vec<u8>, max_bytes: u64) -> Result<Self> {
        let file_name = file_name.into();
        let content_type = Self::content_type_for(Path::new(&file_name))?;
        check_size(data.len() as u64, max_bytes, &file_name)?;

        Ok(Self {
            file_name,
            content_type,
            data,
        })
    }

    /// Read and validate a document from disk.
    ///
    /// Type and size are checked before the file content is read.
    pub async fn from_path(path: &Path, max_bytes: u64) -> Result<Self> {
        let content_type = Self::content_type_for(path)?;

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(RossumError::Validation(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        check_size(metadata.len(), max_bytes, &path.display().to_string())?;

        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();

        Ok(Self {
            file_name,
            content_type,
            data,
        })
    }
}

fn check_size(len: u64, max_bytes: u64, name: &str) -> Result<()> {
    if len == 0 {
        return Err(RossumError::Validation(format!("document is empty: {}", name)));
    }
    if len > max_bytes {
        return Err(RossumError::Validation(format!(
            "document {} is {} bytes, the upload limit is {} bytes",
            name, len, max_bytes
        )));
    }
    Ok(())
}

/// Uploads documents and turns the response into a [`Job`].
pub struct Submitter<'a, A> {
    api: &'a A,
    config: &'a ClientConfig,
}

impl<'a, A: ElisApi> Submitter<'a, A> {
    pub fn new(api: &'a A, config: &'a ClientConfig) -> Self {
        Self { api, config }
    }

    /// Submit an already loaded document.
    pub async fn submit(&self, upload: &DocumentUpload) -> Result<Job> {
        let locale = self.config.effective_locale();
        debug!(file = %upload.file_name, locale, tables = self.config.tables, "Submitting document");

        let response = self
            .api
            .submit_document(upload, locale, self.config.tables)
            .await?;

        if response.id.is_empty() {
            return Err(RossumError::Parse(
                "submit response contains an empty document id".to_string(),
            ));
        }

        info!(document_id = %response.id, file = %upload.file_name, "Document submitted");
        Ok(Job::submitted(response.id))
    }

    /// Validate, read and submit a document from disk.
    pub async fn submit_path(&self, path: &Path, max_bytes: u64) -> Result<Job> {
        let upload = DocumentUpload::from_path(path, max_bytes).await?;
        self.submit(&upload).await
    }
}
