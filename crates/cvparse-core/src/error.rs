//! Error types for the cvparse-core library.

use thiserror::Error;

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to read the document handle.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors from a document reader. The pipeline logs these and continues with empty text.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text detection or recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// No page images were available to recognize.
    #[error("no page images to recognize")]
    NoImages,

    /// OCR support was not compiled in.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the generative text service.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service returned no text.
    #[error("model returned empty content")]
    EmptyContent,

    /// The API key environment variable is not set.
    #[error("missing API key: set {0}")]
    MissingApiKey(String),
}

/// Errors from the field extraction step.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The model call itself failed.
    #[error("generative model call failed: {0}")]
    Model(#[from] LlmError),

    /// Model output was not valid JSON.
    #[error("model output is not valid JSON ({reason}): {preview}")]
    InvalidJson { reason: String, preview: String },

    /// Model output was JSON but not an object.
    #[error("model output is not a JSON object (got {0})")]
    NotAnObject(&'static str),
}

/// A single schema violation with its location in the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Field path, e.g. `Education[0].degree`.
    pub path: String,
    /// What was wrong with the value.
    pub reason: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Errors from normalization into the canonical record.
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The coerced record still violates the schema.
    #[error("record failed schema validation: {}", join_violations(.0))]
    Schema(Vec<SchemaViolation>),

    /// Serialization of the canonical record failed.
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Terminal pipeline failures, tagged by the stage that failed.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Field extraction stage failed.
    #[error("field extraction failed: {0}")]
    FieldExtraction(#[from] ExtractionError),

    /// Normalization stage failed.
    #[error("normalization failed: {0}")]
    Normalization(#[from] NormalizeError),

    /// A stage ran without the state it depends on.
    #[error("pipeline reached {stage} without required state")]
    InvalidState { stage: crate::pipeline::Stage },
}
