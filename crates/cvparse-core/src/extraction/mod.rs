//! Field extraction and normalization.

mod normalizer;

pub use normalizer::{normalize, Normalized};

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::ExtractionError;
use crate::llm::{prompts, strip_json_fences, GenerativeModel};
use crate::models::record::UnvalidatedRecord;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Turns plain resume text into a loosely typed record.
pub trait FieldExtractor: Send + Sync {
    /// Extract the record fields from `text` (which may be empty).
    fn extract(&self, text: &str) -> Result<UnvalidatedRecord>;
}

/// Field extractor backed by a generative model and a fixed prompt.
pub struct LlmFieldExtractor {
    model: Arc<dyn GenerativeModel>,
}

impl LlmFieldExtractor {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }
}

impl FieldExtractor for LlmFieldExtractor {
    fn extract(&self, text: &str) -> Result<UnvalidatedRecord> {
        let reply = self.model.generate(&prompts::extraction_prompt(text))?;
        let record = parse_record(&reply)?;
        debug!("Extracted raw record from {} chars of text", text.len());
        Ok(record)
    }
}

/// Parse a model reply into a raw record. The reply must be a JSON object,
/// optionally wrapped in a code fence.
pub fn parse_record(reply: &str) -> Result<UnvalidatedRecord> {
    let body = strip_json_fences(reply);
    let value: Value = serde_json::from_str(body).map_err(|e| ExtractionError::InvalidJson {
        reason: e.to_string(),
        preview: preview(body),
    })?;

    if !value.is_object() {
        return Err(ExtractionError::NotAnObject(json_kind(&value)));
    }

    UnvalidatedRecord::from_value(value).map_err(|e| ExtractionError::InvalidJson {
        reason: e.to_string(),
        preview: preview(body),
    })
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
