//! Document handles and primary text extraction.

mod extractor;
#[cfg(test)]
pub(crate) mod fixtures;

pub use extractor::PdfExtractor;

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{PdfError, ReadError};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A single resume document, by path or in memory.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// File on disk.
    Path(PathBuf),
    /// Uploaded bytes.
    Bytes(Vec<u8>),
}

impl DocumentSource {
    /// Read the whole document.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match self {
            DocumentSource::Path(path) => Ok(std::fs::read(path)?),
            DocumentSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        DocumentSource::Path(path)
    }
}

impl From<Vec<u8>> for DocumentSource {
    fn from(bytes: Vec<u8>) -> Self {
        DocumentSource::Bytes(bytes)
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Path(path) => write!(f, "{}", path.display()),
            DocumentSource::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// Something that turns a document into plain text.
///
/// Implemented by the direct PDF text reader and by the OCR fallback. The
/// pipeline absorbs errors from either into empty text.
pub trait DocumentReader: Send + Sync {
    /// Extract the document's text in page order.
    fn read_text(&self, source: &DocumentSource) -> std::result::Result<String, ReadError>;
}

/// Reads the embedded text layer of a PDF.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextReader;

impl PdfTextReader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentReader for PdfTextReader {
    fn read_text(&self, source: &DocumentSource) -> std::result::Result<String, ReadError> {
        let data = source.read_bytes()?;
        let mut extractor = PdfExtractor::new();
        extractor.load(&data)?;
        let text = extractor.extract_text()?;
        debug!(
            "Read {} chars of embedded text from {} ({} pages)",
            text.len(),
            source,
            extractor.page_count()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_are_an_error() {
        let source = DocumentSource::Bytes(b"not a pdf".to_vec());
        assert!(PdfTextReader::new().read_text(&source).is_err());
    }

    #[test]
    fn test_reads_text_layer() {
        let source = DocumentSource::Bytes(fixtures::text_pdf(&[&["Jane Doe", "jane@x.com"]]));
        let text = PdfTextReader::new().read_text(&source).unwrap();
        assert!(text.contains("Jane Doe"));
        assert!(text.contains("jane@x.com"));
    }

    #[test]
    fn test_pdf_extract_panic_becomes_error() {
        let source = DocumentSource::Bytes(fixtures::broken_font_pdf());
        assert!(matches!(
            PdfTextReader::new().read_text(&source),
            Err(ReadError::Pdf(PdfError::TextExtraction(_)))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let source = DocumentSource::Path(PathBuf::from("/nonexistent/resume.pdf"));
        assert!(matches!(source.read_bytes(), Err(PdfError::Io(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(DocumentSource::Bytes(vec![0; 3]).to_string(), "<3 bytes>");
        assert_eq!(
            DocumentSource::Path(PathBuf::from("cv.pdf")).to_string(),
            "cv.pdf"
        );
    }
}
