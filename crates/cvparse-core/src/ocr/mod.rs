//! OCR fallback for documents without a text layer.

mod fallback;
mod layout;
mod lazy;
#[cfg(feature = "native")]
mod pure_engine;

pub use fallback::OcrFallbackReader;
pub use layout::{group_regions, TextRegion};
pub use lazy::LazyOcrEngine;
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// An image-to-text service returning a block/line/word hierarchy per page.
///
/// Implementations are shared across concurrent pipeline runs and must be
/// safe to call from several threads at once.
pub trait OcrService: Send + Sync {
    /// Recognize every page image, returning one [`OcrPage`] per input.
    fn recognize(&self, pages: &[DynamicImage]) -> Result<Vec<OcrPage>, OcrError>;
}

/// Recognized content of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    pub blocks: Vec<OcrBlock>,
}

/// A visually separated group of lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrBlock {
    pub lines: Vec<OcrLine>,
}

/// One line of words, left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub words: Vec<String>,
}

impl OcrLine {
    /// Words joined by single spaces; empty words are dropped.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl OcrPage {
    /// Non-empty lines of every block, in order, one per line.
    pub fn text(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }

    fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.lines.iter())
            .map(OcrLine::text)
            .filter(|line| !line.is_empty())
    }
}

/// Flatten recognized pages into a single string in document order.
pub fn pages_to_text(pages: &[OcrPage]) -> String {
    pages
        .iter()
        .flat_map(|page| page.lines())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(words: &[&str]) -> OcrLine {
        OcrLine {
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    #[test]
    fn test_pages_to_text_flattens_hierarchy() {
        let pages = vec![
            OcrPage {
                blocks: vec![
                    OcrBlock {
                        lines: vec![line(&["Jane", "Doe"]), line(&["jane@x.com"])],
                    },
                    OcrBlock {
                        lines: vec![line(&["Skills:", "", "Rust"])],
                    },
                ],
            },
            OcrPage {
                blocks: vec![OcrBlock {
                    lines: vec![line(&["  "]), line(&["Page", "two"])],
                }],
            },
        ];

        assert_eq!(
            pages_to_text(&pages),
            "Jane Doe\njane@x.com\nSkills: Rust\nPage two"
        );
    }

    #[test]
    fn test_empty_pages_give_empty_text() {
        assert_eq!(pages_to_text(&[OcrPage::default()]), "");
        assert_eq!(pages_to_text(&[]), "");
    }
}
