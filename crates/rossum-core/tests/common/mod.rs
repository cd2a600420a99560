//! Scripted in-memory Elis API shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use rossum_core::{
    DocumentUpload, ElisApi, Filter, Result, RossumError, StatusResponse, SubmitResponse,
};
use serde_json::{Value, json};

/// Reply to a status check.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(Value),
    Network,
    Auth,
}

/// Reply to a submission.
#[derive(Debug, Clone)]
pub enum SubmitReply {
    Id(String),
    Auth,
}

/// Fake service replaying a fixed script of status replies.
///
/// The last status reply repeats once the script is exhausted.
pub struct ScriptedApi {
    submit_reply: SubmitReply,
    statuses: Mutex<VecDeque<Reply>>,
    submit_calls: AtomicU32,
    status_calls: AtomicU32,
    submitted: Mutex<Vec<(String, String, bool)>>,
    filters: Mutex<Vec<Filter>>,
}

impl ScriptedApi {
    pub fn new(statuses: Vec<Reply>) -> Self {
        Self {
            submit_reply: SubmitReply::Id("doc-42".to_string()),
            statuses: Mutex::new(statuses.into()),
            submit_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            submitted: Mutex::new(Vec::new()),
            filters: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting_key() -> Self {
        Self {
            submit_reply: SubmitReply::Auth,
            ..Self::new(vec![ready()])
        }
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// `(file name, locale, tables)` of every submission.
    pub fn submitted(&self) -> Vec<(String, String, bool)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn filters(&self) -> Vec<Filter> {
        self.filters.lock().unwrap().clone()
    }

    fn next_status(&self) -> Reply {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().cloned().expect("status script is empty")
        }
    }
}

impl ElisApi for ScriptedApi {
    async fn submit_document(
        &self,
        upload: &DocumentUpload,
        locale: &str,
        tables: bool,
    ) -> Result<SubmitResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap()
            .push((upload.file_name.clone(), locale.to_string(), tables));

        match &self.submit_reply {
            SubmitReply::Id(id) => Ok(SubmitResponse { id: id.clone() }),
            SubmitReply::Auth => Err(RossumError::Auth("HTTP 401: invalid API key".to_string())),
        }
    }

    async fn document_status(&self, _document_id: &str, filter: Filter) -> Result<StatusResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.filters.lock().unwrap().push(filter);

        match self.next_status() {
            Reply::Status(body) => StatusResponse::from_body(body),
            Reply::Network => Err(RossumError::Network("connection reset".to_string())),
            Reply::Auth => Err(RossumError::Auth("HTTP 403".to_string())),
        }
    }
}

pub fn processing() -> Reply {
    Reply::Status(json!({"status": "processing"}))
}

pub fn failed(message: &str) -> Reply {
    Reply::Status(json!({"status": "error", "message": message}))
}

pub fn ready() -> Reply {
    Reply::Status(ready_body())
}

pub fn ready_body() -> Value {
    json!({
        "status": "ready",
        "language": "eng",
        "currency": "usd",
        "fields": [
            {
                "name": "invoice_id",
                "title": "Invoice number",
                "value": "INV-2018-001",
                "bbox": [120.0, 80.0, 260.0, 96.0],
                "score": 0.98
            },
            {
                "name": "amount_total",
                "title": "Amount total",
                "value": "1210.00",
                "bbox": [400.0, 700.0, 480.0, 716.0],
                "score": 0.91
            }
        ]
    })
}

/// Write a small placeholder document and return its path.
pub fn write_document(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.4\n% placeholder\n").unwrap();
    path
}
