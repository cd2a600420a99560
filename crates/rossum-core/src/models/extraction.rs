//! Extraction result returned by the Elis API.

use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Result, RossumError};

/// Complete extraction of one document.
///
/// The typed fields are a read-only view of the body returned by the
/// service. Serializing writes that body back unchanged, including keys the
/// client does not model and explicit `null` values.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// Always `ready` for a completed extraction.
    pub status: String,

    /// Detected document language.
    pub language: Option<String>,

    /// Detected currency code.
    pub currency: Option<String>,

    /// Extracted fields.
    pub fields: Vec<Field>,

    /// Full text content, when the service returned it.
    pub full_text: Option<Value>,

    /// Table content, when table extraction was requested.
    pub tables: Option<Value>,

    raw: Value,
}

#[derive(Deserialize)]
struct ResultView {
    status: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    fields: Option<Vec<Field>>,
    #[serde(default)]
    full_text: Option<Value>,
    #[serde(default)]
    tables: Option<Value>,
}

/// A single extracted field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Machine name, e.g. `invoice_id` or `sender_addrline`.
    pub name: String,

    /// Human readable title.
    #[serde(default)]
    pub title: String,

    /// Extracted value, usually a string but numbers occur too.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Bounding box `[x1, y1, x2, y2]` in page coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// Confidence in the range 0.0 - 1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Nested fields of a grouped field (e.g. `tax_details`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<Field>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Field {
    pub fn score_or_zero(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    /// Value as display text; strings are unquoted, other JSON is rendered as is.
    pub fn value_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl ExtractionResult {
    /// Interpret a ready status body as an extraction result.
    pub fn from_value(body: Value) -> Result<Self> {
        let view = ResultView::deserialize(&body)
            .map_err(|e| RossumError::Parse(format!("invalid extraction result: {}", e)))?;

        if view.status != "ready" {
            return Err(RossumError::Parse(format!(
                "extraction result has status '{}', expected 'ready'",
                view.status
            )));
        }

        Ok(Self {
            status: view.status,
            language: view.language,
            currency: view.currency,
            fields: view.fields.unwrap_or_default(),
            full_text: view.full_text,
            tables: view.tables,
            raw: body,
        })
    }

    /// The body exactly as returned by the service.
    pub fn as_json(&self) -> &Value {
        &self.raw
    }

    pub fn into_json(self) -> Value {
        self.raw
    }

    /// Serialize as UTF-8 JSON with four-space indentation.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.raw.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(|e| RossumError::Parse(e.to_string()))
    }

    /// Write the result to `path`, creating missing parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_pretty_json()?)?;
        Ok(())
    }

    /// Read a previously saved result.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_value(serde_json::from_str(&content)?)
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}
