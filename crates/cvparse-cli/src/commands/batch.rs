//! Batch command - extract records from many resumes.
//!
//! All workers share one pipeline, so the OCR models are loaded at most once
//! for the whole batch.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use cvparse_core::{DocumentSource, PipelineOutput, ResumePipeline};

use super::extract::{is_pdf, one_line};
use super::{build_pipeline, load_config, resolve_model_dir};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input PDFs
    #[arg(required = true)]
    input: String,

    /// Output directory for `<name>.json` records
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    output: Option<PipelineOutput>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = collect_files(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let model_dir = resolve_model_dir(args.model_dir.clone(), &config);
    let jobs = args.jobs;
    let continue_on_error = args.continue_on_error;
    let worker_pb = pb.clone();

    let results = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<FileResult>> {
        let pipeline = build_pipeline(&config, model_dir)?;
        Ok(process_files(&pipeline, &files, jobs, continue_on_error, &worker_pb))
    })
    .await??;

    pb.finish_and_clear();

    if !continue_on_error {
        if let Some(failed) = results.iter().find(|r| r.error.is_some()) {
            error!("Failed to process {}", failed.path.display());
            anyhow::bail!(
                "Processing failed for {}: {}",
                failed.path.display(),
                failed.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let successful: Vec<_> = results.iter().filter(|r| r.output.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    for result in &successful {
        let Some(output) = &result.output else { continue };
        match &args.output_dir {
            Some(output_dir) => {
                let output_path = output_dir.join(format!("{}.json", file_stem(&result.path)));
                fs::write(&output_path, &output.json)?;
                debug!("Wrote output to {}", output_path.display());
            }
            None => println!(
                "  {} {}: {}",
                style("✓").green(),
                result.path.display(),
                one_line(&output.record)
            ),
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// PDFs matching `pattern`, sorted.
fn collect_files(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| is_pdf(p))
        .collect();
    files.sort();
    Ok(files)
}

/// Run the pipeline over `files` on up to `jobs` threads. Results come back
/// in input order. Without `continue_on_error`, workers stop picking up new
/// files after the first failure.
fn process_files(
    pipeline: &ResumePipeline,
    files: &[PathBuf],
    jobs: usize,
    continue_on_error: bool,
    pb: &ProgressBar,
) -> Vec<FileResult> {
    let next = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let results = Mutex::new(Vec::with_capacity(files.len()));
    let workers = jobs.clamp(1, files.len().max(1));

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                while !stop.load(Ordering::SeqCst) {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(path) = files.get(index) else { break };

                    let result = process_file(pipeline, path);
                    if let Some(err) = &result.error {
                        warn!("Failed to process {}: {}", path.display(), err);
                        if !continue_on_error {
                            stop.store(true, Ordering::SeqCst);
                        }
                    }

                    results
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .push((index, result));
                    pb.inc(1);
                }
            });
        }
    });

    let mut results = results
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

fn process_file(pipeline: &ResumePipeline, path: &Path) -> FileResult {
    let start = Instant::now();
    let outcome = pipeline.run(DocumentSource::Path(path.to_path_buf()));
    let processing_time_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(output) => FileResult {
            path: path.to_path_buf(),
            output: Some(output),
            error: None,
            processing_time_ms,
        },
        Err(e) => FileResult {
            path: path.to_path_buf(),
            output: None,
            error: Some(e.to_string()),
            processing_time_ms,
        },
    }
}

fn file_stem(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("resume")
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "name",
        "email",
        "phone",
        "skills",
        "text_source",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = result.processing_time_ms.to_string();

        if let Some(output) = &result.output {
            let record = &output.record;
            wtr.write_record([
                filename,
                "success",
                record.name.as_deref().unwrap_or(""),
                record.email.as_deref().unwrap_or(""),
                record.phone.as_deref().unwrap_or(""),
                &record.skills.join("; "),
                &output.text_source.to_string(),
                &time,
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                &time,
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
