//! Extract command - structured record from a single resume.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use cvparse_core::{CanonicalRecord, DocumentSource, PipelineOutput, TextSource};

use super::{build_pipeline, build_validator, load_config, print_report, resolve_model_dir};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input resume (PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Validate the extracted record
    #[arg(long)]
    validate: bool,

    /// Skip the model-backed semantic check during validation
    #[arg(long)]
    no_semantic: bool,

    /// Also print the raw text the record was extracted from
    #[arg(long)]
    show_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Canonical JSON
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ExtractArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_pdf(&args.input) {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Extracting resume fields...");

    let model_dir = resolve_model_dir(args.model_dir.clone(), &config);
    let input = args.input.clone();
    let validate = args.validate;
    let no_semantic = args.no_semantic;

    // The pipeline and its HTTP client are blocking.
    let (output, report) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let pipeline = build_pipeline(&config, model_dir)?;
        let output = pipeline.run(DocumentSource::Path(input))?;
        let report = if validate {
            let validator = build_validator(&config, no_semantic)?;
            Some(validator.validate_all(&output.record, &output.raw_text))
        } else {
            None
        };
        Ok((output, report))
    })
    .await??;

    pb.finish_and_clear();

    if output.text_source == TextSource::Ocr {
        eprintln!("{} No embedded text, used OCR", style("ℹ").blue());
    }
    if let Some(report) = &report {
        print_report(report);
    }
    if args.show_text {
        eprintln!("{}", style("Raw text:").bold());
        eprintln!("{}", output.raw_text);
    }

    let rendered = match args.format {
        OutputFormat::Json => output.json.clone(),
        OutputFormat::Text => format_text(&output),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &rendered)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", rendered);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if report.is_some_and(|r| !r.passed()) {
        anyhow::bail!("Validation failed");
    }
    Ok(())
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

pub fn format_text(output: &PipelineOutput) -> String {
    let record = &output.record;
    let mut out = String::new();

    out.push_str(&format!("Name:  {}\n", record.name.as_deref().unwrap_or("-")));
    let email = record.email.as_deref().unwrap_or("-");
    if record.has_sentinel_email() {
        out.push_str(&format!("Email: {} (placeholder)\n", email));
    } else {
        out.push_str(&format!("Email: {}\n", email));
    }
    out.push_str(&format!("Phone: {}\n", record.phone.as_deref().unwrap_or("-")));
    out.push_str(&format!("Text:  {}\n", output.text_source));

    push_list(&mut out, "Skills", &record.skills);

    if !record.education.is_empty() {
        out.push_str("\nEducation:\n");
        for item in &record.education {
            out.push_str(&format!("  {}", item.degree));
            if let Some(institution) = &item.institution {
                out.push_str(&format!(", {}", institution));
            }
            if let Some(year) = &item.graduation_year {
                out.push_str(&format!(" ({})", year));
            }
            out.push('\n');
        }
    }

    if let Some(experience) = record.experience.as_ref().filter(|e| !e.is_empty()) {
        out.push_str("\nExperience:\n");
        for item in experience {
            out.push_str(&format!("  {} at {}", item.job_title, item.company_name));
            if let Some(years) = &item.years_worked {
                out.push_str(&format!(" ({})", years));
            }
            out.push('\n');
            if let Some(description) = &item.description {
                out.push_str(&format!("    {}\n", description));
            }
        }
    }

    push_list(&mut out, "Certification", optional(&record.certification));
    push_list(&mut out, "Languages", optional(&record.languages));
    out
}

fn optional(list: &Option<Vec<String>>) -> &[String] {
    list.as_deref().unwrap_or(&[])
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}:\n", title));
    for item in items {
        out.push_str(&format!("  - {}\n", item));
    }
}

/// Record summary line used by batch output.
pub fn one_line(record: &CanonicalRecord) -> String {
    format!(
        "{} <{}>",
        record.name.as_deref().unwrap_or("unknown"),
        record.email.as_deref().unwrap_or("-")
    )
}
