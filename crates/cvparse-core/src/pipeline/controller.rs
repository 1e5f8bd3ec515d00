//! Pipeline controller: runs each stage and follows the transitions.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::extraction::{normalize, FieldExtractor, LlmFieldExtractor};
use crate::llm::GenerativeModel;
use crate::models::config::CvConfig;
use crate::models::record::CanonicalRecord;
use crate::ocr::{LazyOcrEngine, OcrFallbackReader, OcrService};
use crate::pdf::{DocumentReader, DocumentSource, PdfTextReader};

use super::{next_stage, PipelineState, Stage, TextSource};

/// Final result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Text the record was extracted from.
    pub raw_text: String,
    pub text_source: TextSource,
    pub record: CanonicalRecord,
    /// Pretty-printed canonical JSON.
    pub json: String,
}

/// Resume pipeline: text extraction, OCR fallback, field extraction and
/// normalization.
///
/// One instance can serve many concurrent runs; each run owns its own
/// [`PipelineState`]. Collaborators are shared, the OCR engine included.
pub struct ResumePipeline {
    reader: Arc<dyn DocumentReader>,
    fallback: Arc<dyn DocumentReader>,
    extractor: Arc<dyn FieldExtractor>,
}

impl ResumePipeline {
    pub fn new(
        reader: Arc<dyn DocumentReader>,
        fallback: Arc<dyn DocumentReader>,
        extractor: Arc<dyn FieldExtractor>,
    ) -> Self {
        Self {
            reader,
            fallback,
            extractor,
        }
    }

    /// Standard wiring around an already constructed OCR service and model.
    pub fn with_services(
        config: &CvConfig,
        ocr: Arc<dyn OcrService>,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        Self::new(
            Arc::new(PdfTextReader::new()),
            Arc::new(OcrFallbackReader::new(ocr, config.pdf.clone())),
            Arc::new(LlmFieldExtractor::new(model)),
        )
    }

    /// Standard wiring with the OCR models in `model_dir`, loaded on first
    /// fallback and then shared by every run of this pipeline.
    pub fn from_config(
        config: &CvConfig,
        model_dir: PathBuf,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        debug!("OCR models will be loaded from {}", model_dir.display());
        let ocr = LazyOcrEngine::from_model_dir(model_dir, config.models.clone(), config.ocr.clone());
        Self::with_services(config, Arc::new(ocr), model)
    }

    /// Process one document from start to end.
    pub fn run(&self, source: DocumentSource) -> Result<PipelineOutput, PipelineError> {
        let mut state = PipelineState::new(source);
        let mut stage = Stage::START;

        while stage != Stage::Done {
            self.step(&mut state, stage)?;
            let next = next_stage(&state, stage);
            debug!("Pipeline stage {} -> {}", stage, next);
            stage = next;
        }

        finish(state)
    }

    fn step(&self, state: &mut PipelineState, stage: Stage) -> Result<(), PipelineError> {
        match stage {
            Stage::ReadText => {
                state.raw_text = Some(read_or_empty(self.reader.as_ref(), &state.source, "text"));
                state.text_source = Some(TextSource::Document);
            }
            Stage::ImageFallback => {
                info!("No text found in {}, using image processor instead", state.source);
                state.raw_text = Some(read_or_empty(self.fallback.as_ref(), &state.source, "image"));
                state.text_source = Some(TextSource::Ocr);
            }
            Stage::ExtractFields => {
                let text = state
                    .raw_text
                    .as_deref()
                    .ok_or(PipelineError::InvalidState { stage })?;
                state.extracted_record = Some(self.extractor.extract(text)?);
            }
            Stage::Normalize => {
                let raw = state
                    .extracted_record
                    .clone()
                    .ok_or(PipelineError::InvalidState { stage })?;
                state.canonical = Some(normalize(raw)?);
            }
            Stage::Done => {}
        }
        Ok(())
    }
}

/// Reader failures count as "no text found".
fn read_or_empty(reader: &dyn DocumentReader, source: &DocumentSource, kind: &str) -> String {
    match reader.read_text(source) {
        Ok(text) => text,
        Err(e) => {
            warn!("{} extraction failed for {}: {}", kind, source, e);
            String::new()
        }
    }
}

fn finish(state: PipelineState) -> Result<PipelineOutput, PipelineError> {
    let invalid = PipelineError::InvalidState { stage: Stage::Done };
    match (state.raw_text, state.text_source, state.canonical) {
        (Some(raw_text), Some(text_source), Some(canonical)) => Ok(PipelineOutput {
            raw_text,
            text_source,
            record: canonical.record,
            json: canonical.json,
        }),
        _ => Err(invalid),
    }
}
