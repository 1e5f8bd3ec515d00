//! Core library for structured resume extraction.
//!
//! This crate provides:
//! - PDF text extraction with an OCR fallback for scanned documents
//! - Field extraction through a generative model
//! - Normalization into a strict canonical record
//! - Rule-based and model-backed validation of the result

pub mod error;
pub mod extraction;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod validation;

pub use error::PipelineError;
pub use extraction::{normalize, FieldExtractor, LlmFieldExtractor, Normalized};
pub use llm::{GeminiClient, GenerativeModel};
pub use models::config::CvConfig;
pub use models::record::{CanonicalRecord, EducationItem, ExperienceItem, UnvalidatedRecord};
pub use ocr::{LazyOcrEngine, OcrFallbackReader, OcrService};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{DocumentReader, DocumentSource, PdfTextReader};
pub use pipeline::{PipelineOutput, ResumePipeline, Stage, TextSource};
pub use validation::{ResultValidator, ValidationOutcome, ValidationReport};
