//! Transport layer for the Elis extraction API.

mod http;

pub use http::HttpApi;

use std::future::Future;

use crate::error::Result;
use crate::models::config::Filter;
use crate::models::job::{StatusResponse, SubmitResponse};
use crate::submit::DocumentUpload;

/// Requests the client issues against the extraction service.
///
/// [`HttpApi`] talks to the real service; tests substitute scripted
/// implementations.
pub trait ElisApi {
    /// Upload a document for extraction (`POST /document`).
    fn submit_document(
        &self,
        upload: &DocumentUpload,
        locale: &str,
        tables: bool,
    ) -> impl Future<Output = Result<SubmitResponse>> + Send;

    /// Read the processing status of a document (`GET /document/{id}`).
    ///
    /// Once the document is ready the response body holds the extraction.
    fn document_status(
        &self,
        document_id: &str,
        filter: Filter,
    ) -> impl Future<Output = Result<StatusResponse>> + Send;
}
