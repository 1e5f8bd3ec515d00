//! OCR engine that loads its models on first use, exactly once.

use std::path::PathBuf;
use std::sync::Arc;

use image::DynamicImage;
use once_cell::sync::OnceCell;
use tracing::info;

use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

use super::{OcrPage, OcrService};

type Loader = Box<dyn Fn() -> Result<Arc<dyn OcrService>, OcrError> + Send + Sync>;

/// Wraps an expensive OCR model behind a one-time initializer.
///
/// Concurrent first callers block on the same initialization; the loaded
/// engine is then shared read-only. A failed load is not cached, so a later
/// call may retry once the model files exist.
pub struct LazyOcrEngine {
    loader: Loader,
    engine: OnceCell<Arc<dyn OcrService>>,
}

impl LazyOcrEngine {
    /// Create from an arbitrary loader.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn OcrService>, OcrError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            engine: OnceCell::new(),
        }
    }

    /// Load the pure-Rust engine from `model_dir` on first use.
    pub fn from_model_dir(model_dir: PathBuf, models: ModelConfig, config: OcrConfig) -> Self {
        Self::new(move || load_engine(&model_dir, &models, &config))
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.engine.get().is_some()
    }

    fn engine(&self) -> Result<&Arc<dyn OcrService>, OcrError> {
        self.engine.get_or_try_init(|| {
            info!("Initializing OCR model");
            (self.loader)()
        })
    }
}

impl OcrService for LazyOcrEngine {
    fn recognize(&self, pages: &[DynamicImage]) -> Result<Vec<OcrPage>, OcrError> {
        self.engine()?.recognize(pages)
    }
}

#[cfg(feature = "native")]
fn load_engine(
    model_dir: &std::path::Path,
    models: &ModelConfig,
    config: &OcrConfig,
) -> Result<Arc<dyn OcrService>, OcrError> {
    let engine = super::PureOcrEngine::from_dir(model_dir, models, config.clone())?;
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "native"))]
fn load_engine(
    _model_dir: &std::path::Path,
    _models: &ModelConfig,
    _config: &OcrConfig,
) -> Result<Arc<dyn OcrService>, OcrError> {
    Err(OcrError::Unavailable(
        "built without the `native` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EmptyOcr;

    impl OcrService for EmptyOcr {
        fn recognize(&self, pages: &[DynamicImage]) -> Result<Vec<OcrPage>, OcrError> {
            Ok(vec![OcrPage::default(); pages.len()])
        }
    }

    #[test]
    fn test_loads_once_across_threads() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let lazy = Arc::new(LazyOcrEngine::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Arc::new(EmptyOcr) as Arc<dyn OcrService>)
        }));
        assert!(!lazy.is_loaded());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lazy = lazy.clone();
                std::thread::spawn(move || lazy.recognize(&[DynamicImage::new_rgb8(1, 1)]).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().len(), 1);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(lazy.is_loaded());
    }

    #[test]
    fn test_load_failure_is_reported() {
        let lazy = LazyOcrEngine::new(|| Err(OcrError::ModelLoad("missing det.onnx".to_string())));
        let err = lazy.recognize(&[]).unwrap_err();
        assert!(matches!(err, OcrError::ModelLoad(_)));
        assert!(!lazy.is_loaded());
    }

    #[test]
    fn test_missing_model_dir() {
        let lazy = LazyOcrEngine::from_model_dir(
            PathBuf::from("/nonexistent/models"),
            ModelConfig::default(),
            OcrConfig::default(),
        );
        assert!(lazy.recognize(&[DynamicImage::new_rgb8(1, 1)]).is_err());
    }
}
