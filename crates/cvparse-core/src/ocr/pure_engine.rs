//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

use super::layout::{group_regions, TextRegion};
use super::{OcrPage, OcrService};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
///
/// Calls from concurrent pipeline runs are serialized on the engine.
pub struct PureOcrEngine {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
    config: OcrConfig,
}

impl PureOcrEngine {
    /// Load detection, recognition and dictionary files from `model_dir`.
    pub fn from_dir(model_dir: &Path, models: &ModelConfig, config: OcrConfig) -> Result<Self, OcrError> {
        let [det_path, rec_path, dict_path] = models.files_in(model_dir);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
            config,
        })
    }

    /// Recognize a single page image.
    pub fn recognize_page(&self, image: &DynamicImage) -> Result<OcrPage, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        let engine = self
            .engine
            .lock()
            .map_err(|_| OcrError::Recognition("OCR engine lock poisoned".to_string()))?;
        let results = engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let regions: Vec<TextRegion> = results
            .iter()
            .map(|r| {
                let text = if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                TextRegion::new(polygon_to_rect(&r.bounding_box), text)
            })
            .collect();

        let page = group_regions(regions, self.config.line_tolerance, self.config.block_gap_factor);

        debug!(
            "OCR on {}x{} page: {} regions, {} blocks in {}ms",
            width,
            height,
            results.len(),
            page.blocks.len(),
            start.elapsed().as_millis()
        );

        Ok(page)
    }
}

impl OcrService for PureOcrEngine {
    fn recognize(&self, pages: &[DynamicImage]) -> Result<Vec<OcrPage>, OcrError> {
        pages.iter().map(|page| self.recognize_page(page)).collect()
    }
}

/// Axis-aligned bounds of a detection polygon.
fn polygon_to_rect(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32, f32, f32) {
    let mut rect = (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
    for coord in polygon.exterior().coords() {
        let (x, y) = (coord.x as f32, coord.y as f32);
        rect.0 = rect.0.min(x);
        rect.1 = rect.1.min(y);
        rect.2 = rect.2.max(x);
        rect.3 = rect.3.max(y);
    }
    if rect.0.is_infinite() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    rect
}
