//! Image-based text extraction: rasterize pages, then OCR them.

use std::sync::Arc;

use tracing::debug;

use crate::error::{OcrError, ReadError};
use crate::models::config::PdfConfig;
use crate::pdf::{DocumentReader, DocumentSource, PdfExtractor};

use super::{pages_to_text, OcrService};

/// Document reader that runs the shared OCR service over page images.
pub struct OcrFallbackReader {
    ocr: Arc<dyn OcrService>,
    config: PdfConfig,
}

impl OcrFallbackReader {
    pub fn new(ocr: Arc<dyn OcrService>, config: PdfConfig) -> Self {
        Self { ocr, config }
    }
}

impl DocumentReader for OcrFallbackReader {
    fn read_text(&self, source: &DocumentSource) -> Result<String, ReadError> {
        let data = source.read_bytes()?;
        let mut extractor = PdfExtractor::new();
        extractor.load(&data)?;

        let images = extractor.render_pages(self.config.max_pages, self.config.min_image_dimension)?;
        if images.is_empty() {
            debug!("No page images in {}", source);
            return Err(OcrError::NoImages.into());
        }

        let pages = self.ocr.recognize(&images)?;
        let text = pages_to_text(&pages);
        debug!("OCR produced {} chars from {} pages of {}", text.len(), pages.len(), source);
        Ok(text)
    }
}
