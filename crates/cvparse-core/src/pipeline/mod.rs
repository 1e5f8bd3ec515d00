//! Resume processing pipeline.
//!
//! A run walks a small state machine:
//!
//! ```text
//! ReadText -> ExtractFields -> Normalize -> Done
//!     \                ^
//!      -> ImageFallback
//! ```
//!
//! The only conditional edge is after `ReadText`: blank text routes through
//! the OCR fallback. [`next_stage`] is a pure function of the state, the
//! [`ResumePipeline`] controller performs the work of each stage.

mod controller;

pub use controller::{PipelineOutput, ResumePipeline};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extraction::Normalized;
use crate::models::record::UnvalidatedRecord;
use crate::pdf::DocumentSource;

/// A step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ReadText,
    ImageFallback,
    ExtractFields,
    Normalize,
    Done,
}

impl Stage {
    /// Entry stage of every run.
    pub const START: Stage = Stage::ReadText;
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ReadText => "read-text",
            Stage::ImageFallback => "image-fallback",
            Stage::ExtractFields => "extract-fields",
            Stage::Normalize => "normalize",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Where the final raw text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    /// Embedded text layer of the document.
    Document,
    /// OCR over rasterized pages.
    Ocr,
}

impl fmt::Display for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSource::Document => f.write_str("document"),
            TextSource::Ocr => f.write_str("ocr"),
        }
    }
}

/// Mutable state of a single run. Owned by that run only.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub source: DocumentSource,
    pub raw_text: Option<String>,
    pub text_source: Option<TextSource>,
    pub extracted_record: Option<UnvalidatedRecord>,
    pub canonical: Option<Normalized>,
}

impl PipelineState {
    pub fn new(source: DocumentSource) -> Self {
        Self {
            source,
            raw_text: None,
            text_source: None,
            extracted_record: None,
            canonical: None,
        }
    }

    /// True when there is no text, or only whitespace.
    pub fn text_is_blank(&self) -> bool {
        self.raw_text
            .as_deref()
            .is_none_or(|text| text.trim().is_empty())
    }
}

/// Stage that follows `stage` once it has updated `state`.
pub fn next_stage(state: &PipelineState, stage: Stage) -> Stage {
    match stage {
        Stage::ReadText if state.text_is_blank() => Stage::ImageFallback,
        Stage::ReadText => Stage::ExtractFields,
        Stage::ImageFallback => Stage::ExtractFields,
        Stage::ExtractFields => Stage::Normalize,
        Stage::Normalize | Stage::Done => Stage::Done,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_text(text: Option<&str>) -> PipelineState {
        let mut state = PipelineState::new(DocumentSource::Bytes(Vec::new()));
        state.raw_text = text.map(String::from);
        state
    }

    #[test]
    fn test_text_goes_straight_to_extraction() {
        let state = state_with_text(Some("Jane Doe"));
        assert_eq!(next_stage(&state, Stage::ReadText), Stage::ExtractFields);
    }

    #[test]
    fn test_blank_text_routes_to_fallback() {
        for text in [None, Some(""), Some("  \n\t ")] {
            let state = state_with_text(text);
            assert_eq!(next_stage(&state, Stage::ReadText), Stage::ImageFallback);
        }
    }

    #[test]
    fn test_fallback_never_loops() {
        let state = state_with_text(Some(""));
        assert_eq!(next_stage(&state, Stage::ImageFallback), Stage::ExtractFields);
    }

    #[test]
    fn test_linear_tail() {
        let state = state_with_text(Some("x"));
        assert_eq!(next_stage(&state, Stage::ExtractFields), Stage::Normalize);
        assert_eq!(next_stage(&state, Stage::Normalize), Stage::Done);
        assert_eq!(next_stage(&state, Stage::Done), Stage::Done);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::START.to_string(), "read-text");
        assert_eq!(Stage::ImageFallback.to_string(), "image-fallback");
    }
}
