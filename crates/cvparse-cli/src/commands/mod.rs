//! Subcommands and the wiring they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod models;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use console::style;
use tracing::debug;

use cvparse_core::models::config::CvConfig;
use cvparse_core::{GeminiClient, ResultValidator, ResumePipeline, ValidationReport};

/// `<config dir>/cvparse/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cvparse")
        .join("config.json")
}

/// Root for downloaded data, `<data dir>/cvparse`.
pub fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cvparse")
}

/// Load the explicit config file, else the default one, else defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<CvConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        debug!("Loading config from {}", path.display());
        return Ok(CvConfig::from_file(path)?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(CvConfig::from_file(&path)?)
    } else {
        Ok(CvConfig::default())
    }
}

/// OCR model directory: the flag wins, then `models.model_dir` (relative
/// paths are taken under the data root).
pub fn resolve_model_dir(flag: Option<PathBuf>, config: &CvConfig) -> PathBuf {
    flag.unwrap_or_else(|| data_root().join(&config.models.model_dir))
}

/// Pipeline with the Gemini extractor and a lazily loaded OCR engine.
pub fn build_pipeline(config: &CvConfig, model_dir: PathBuf) -> anyhow::Result<ResumePipeline> {
    let model = GeminiClient::for_extraction(config)?;
    Ok(ResumePipeline::from_config(config, model_dir, Arc::new(model)))
}

/// Validator, with the semantic check when enabled both in config and on
/// the command line.
pub fn build_validator(config: &CvConfig, no_semantic: bool) -> anyhow::Result<ResultValidator> {
    if no_semantic || !config.validation.semantic {
        return Ok(ResultValidator::without_semantic());
    }
    let model = GeminiClient::for_validation(config)?;
    Ok(ResultValidator::new(Arc::new(model)))
}

/// Print each check of a report to stderr.
pub fn print_report(report: &ValidationReport) {
    eprintln!("{}", style("Validation:").bold());
    for (name, outcome) in report.checks() {
        let mark = if outcome.passed {
            style("✓").green()
        } else {
            style("✗").red()
        };
        eprintln!("  {} {:<9} {}", mark, name, outcome.message);
    }
}
