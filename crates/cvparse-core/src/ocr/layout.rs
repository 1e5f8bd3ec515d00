//! Grouping of detected text regions into lines and blocks.

use super::{OcrBlock, OcrLine, OcrPage};

/// A detected text region with its axis-aligned bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    /// (min_x, min_y, max_x, max_y).
    pub rect: (f32, f32, f32, f32),
    pub text: String,
}

impl TextRegion {
    pub fn new(rect: (f32, f32, f32, f32), text: impl Into<String>) -> Self {
        Self {
            rect,
            text: text.into(),
        }
    }

    fn top(&self) -> f32 {
        self.rect.1
    }

    fn bottom(&self) -> f32 {
        self.rect.3
    }

    fn height(&self) -> f32 {
        (self.rect.3 - self.rect.1).max(1.0)
    }

    fn center_y(&self) -> f32 {
        (self.rect.1 + self.rect.3) / 2.0
    }
}

struct LineSpan {
    top: f32,
    bottom: f32,
    regions: Vec<TextRegion>,
}

impl LineSpan {
    fn height(&self) -> f32 {
        (self.bottom - self.top).max(1.0)
    }

    fn overlap(&self, region: &TextRegion) -> f32 {
        (self.bottom.min(region.bottom()) - self.top.max(region.top())).max(0.0)
    }
}

/// Arrange regions into reading order.
///
/// Regions overlapping vertically by at least `line_tolerance` of the smaller
/// height share a line. A gap between lines larger than `block_gap_factor`
/// median line heights starts a new block.
pub fn group_regions(mut regions: Vec<TextRegion>, line_tolerance: f32, block_gap_factor: f32) -> OcrPage {
    regions.retain(|r| !r.text.trim().is_empty());
    if regions.is_empty() {
        return OcrPage::default();
    }

    regions.sort_by(|a, b| {
        a.center_y()
            .total_cmp(&b.center_y())
            .then(a.rect.0.total_cmp(&b.rect.0))
    });

    let mut lines: Vec<LineSpan> = Vec::new();
    for region in regions {
        let joins = lines.last().is_some_and(|line| {
            line.overlap(&region) >= line_tolerance * line.height().min(region.height())
        });
        match lines.last_mut() {
            Some(line) if joins => {
                line.top = line.top.min(region.top());
                line.bottom = line.bottom.max(region.bottom());
                line.regions.push(region);
            }
            _ => lines.push(LineSpan {
                top: region.top(),
                bottom: region.bottom(),
                regions: vec![region],
            }),
        }
    }

    let mut heights: Vec<f32> = lines.iter().map(LineSpan::height).collect();
    heights.sort_by(f32::total_cmp);
    let median_height = heights[heights.len() / 2];

    let mut blocks: Vec<OcrBlock> = Vec::new();
    let mut previous_bottom: Option<f32> = None;
    for mut line in lines {
        let new_block = match previous_bottom {
            None => true,
            Some(bottom) => line.top - bottom > block_gap_factor * median_height,
        };
        previous_bottom = Some(line.bottom);

        line.regions.sort_by(|a, b| a.rect.0.total_cmp(&b.rect.0));
        let words = line
            .regions
            .iter()
            .flat_map(|r| r.text.split_whitespace())
            .map(str::to_string)
            .collect();

        if new_block {
            blocks.push(OcrBlock::default());
        }
        if let Some(block) = blocks.last_mut() {
            block.lines.push(OcrLine { words });
        }
    }

    OcrPage { blocks }
}
