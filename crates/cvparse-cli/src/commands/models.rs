//! Models command - download and manage OCR model files.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use futures_util::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use cvparse_core::models::config::ModelConfig;

use super::{load_config, resolve_model_dir};

/// Where the default PP-OCR ONNX exports are published.
const DEFAULT_BASE_URL: &str = "https://github.com/jakubmatias/incr/raw/main/models/mobile";

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    /// Model directory (default: from config)
    #[arg(short, long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List the model files the OCR fallback needs
    List,

    /// Download models
    Download(DownloadArgs),

    /// Check model status
    Status,

    /// Remove downloaded models
    Clean,
}

#[derive(Args)]
struct DownloadArgs {
    /// Force re-download even if files exist
    #[arg(long)]
    force: bool,

    /// Base URL the files are fetched from
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

/// One file of the OCR model set.
struct ModelFile {
    /// Name on the download server.
    remote_name: &'static str,
    /// Name in the model directory, from config.
    local_name: String,
    size_bytes: u64,
    description: &'static str,
}

fn model_files(models: &ModelConfig) -> [ModelFile; 3] {
    [
        ModelFile {
            remote_name: "det.onnx",
            local_name: models.detection_model.clone(),
            size_bytes: 4_500_000,
            description: "PP-OCRv3 mobile text detection",
        },
        ModelFile {
            remote_name: "latin_rec.onnx",
            local_name: models.recognition_model.clone(),
            size_bytes: 7_500_000,
            description: "Latin text recognition",
        },
        ModelFile {
            remote_name: "latin_dict.txt",
            local_name: models.dictionary.clone(),
            size_bytes: 2_000,
            description: "Latin character dictionary",
        },
    ]
}

/// A file counts as present once it is at least half its expected size.
fn is_complete(path: &Path, expected: u64) -> bool {
    fs::metadata(path).is_ok_and(|m| m.len() > expected / 2)
}

pub async fn run(args: ModelsArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let model_dir = resolve_model_dir(args.model_dir, &config);
    let files = model_files(&config.models);

    match args.command {
        ModelsCommand::List => list_models(&files),
        ModelsCommand::Download(download_args) => {
            download_models(download_args, &files, &model_dir).await
        }
        ModelsCommand::Status => check_status(&files, &model_dir).map(|_| ()),
        ModelsCommand::Clean => clean_models(&files, &model_dir),
    }
}

fn list_models(files: &[ModelFile]) -> anyhow::Result<()> {
    println!("{}", style("OCR Model Files").bold());
    println!();

    let total: u64 = files.iter().map(|f| f.size_bytes).sum();
    for file in files {
        println!(
            "    {:<20} {:>10}  {}",
            file.local_name,
            format_size(file.size_bytes),
            file.description
        );
    }
    println!();
    println!("Total: {}", format_size(total));
    println!();
    println!("Commands:");
    println!("  cvparse models download    Download the model files");
    println!("  cvparse models status      Check what is installed");

    Ok(())
}

async fn download_models(args: DownloadArgs, files: &[ModelFile], output_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir)?;

    println!(
        "{} Downloading OCR models to {}",
        style("ℹ").blue(),
        output_dir.display()
    );
    println!();

    let client = reqwest::Client::builder()
        .user_agent(concat!("cvparse-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let multi_progress = MultiProgress::new();
    let style_template = ProgressStyle::default_bar()
        .template("  {spinner:.green} {msg:<30} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")?
        .progress_chars("=>-");
    let base_url = args.base_url.trim_end_matches('/');

    let mut downloaded = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for file in files {
        let path = output_dir.join(&file.local_name);

        if !args.force && is_complete(&path, file.size_bytes) {
            println!("  {} {} (already exists)", style("✓").green(), file.local_name);
            skipped += 1;
            continue;
        }

        let pb = multi_progress.add(ProgressBar::new(file.size_bytes));
        pb.set_style(style_template.clone());
        pb.set_message(file.local_name.clone());

        let url = format!("{}/{}", base_url, file.remote_name);
        match download_file(&client, &url, &path, &pb).await {
            Ok(()) => {
                pb.finish_with_message(format!("{} {}", style("✓").green(), file.local_name));
                downloaded += 1;
            }
            Err(e) => {
                pb.finish_with_message(format!("{} {} - {}", style("✗").red(), file.local_name, e));
                failed += 1;
            }
        }
    }

    println!();
    if failed == 0 {
        println!("{} OCR models ready", style("✓").green().bold());
        println!("   {} downloaded, {} already present", downloaded, skipped);
    } else {
        println!("{} Download completed with errors", style("⚠").yellow().bold());
        println!(
            "   {} downloaded, {} skipped, {} failed",
            downloaded, skipped, failed
        );
        println!("Retry with: cvparse models download --force");
    }

    println!();
    check_status(files, output_dir)?;
    if failed > 0 {
        anyhow::bail!("{} model files failed to download", failed);
    }
    Ok(())
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    // Write to a temp file so a broken download never looks complete.
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;

    let mut stream = response.bytes_stream();
    let mut received: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        received += chunk.len() as u64;
        pb.set_position(received);
    }

    file.flush()?;
    drop(file);
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Print the state of each file; returns whether the set is complete.
fn check_status(files: &[ModelFile], model_dir: &Path) -> anyhow::Result<bool> {
    println!("{}", style("Model Status").bold());
    println!("Directory: {}", model_dir.display());
    println!();

    let mut all_present = true;
    let mut total_size: u64 = 0;

    for file in files {
        let path = model_dir.join(&file.local_name);
        let (status, size_str) = match fs::metadata(&path) {
            Ok(metadata) => {
                let size = metadata.len();
                total_size += size;
                if is_complete(&path, file.size_bytes) {
                    (style("✓").green(), format_size(size))
                } else {
                    all_present = false;
                    (style("⚠").yellow(), format!("{} (incomplete?)", format_size(size)))
                }
            }
            Err(_) => {
                all_present = false;
                (style("✗").red(), "missing".to_string())
            }
        };

        println!("    {} {:<25} {:>10}", status, file.local_name, size_str);
    }

    if all_present {
        println!(
            "    {} Ready ({} total)",
            style("✓").green(),
            format_size(total_size)
        );
    } else {
        println!(
            "    {} Run 'cvparse models download' to download",
            style("⚠").yellow()
        );
    }

    Ok(all_present)
}

fn clean_models(files: &[ModelFile], model_dir: &Path) -> anyhow::Result<()> {
    if !model_dir.exists() {
        println!("{} No model files to remove.", style("ℹ").blue());
        return Ok(());
    }

    let mut removed = 0;
    let mut freed: u64 = 0;

    for file in files {
        let path = model_dir.join(&file.local_name);
        if let Ok(metadata) = fs::metadata(&path) {
            fs::remove_file(&path)?;
            removed += 1;
            freed += metadata.len();
            println!("  {} Removed {}", style("✓").green(), file.local_name);
        }
    }

    // Leftovers from interrupted downloads
    for entry in fs::read_dir(model_dir)?.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "tmp") {
            fs::remove_file(&path)?;
        }
    }

    if removed > 0 {
        println!();
        println!(
            "{} Removed {} files, freed {}",
            style("✓").green(),
            removed,
            format_size(freed)
        );
    } else {
        println!("{} No model files to remove.", style("ℹ").blue());
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(2_000), "2.0KB");
        assert_eq!(format_size(4_500_000), "4.5MB");
    }

    #[test]
    fn test_local_names_follow_config() {
        let models = ModelConfig {
            recognition_model: "en_rec.onnx".to_string(),
            ..Default::default()
        };
        let files = model_files(&models);
        assert_eq!(files[1].remote_name, "latin_rec.onnx");
        assert_eq!(files[1].local_name, "en_rec.onnx");
    }

    #[test]
    fn test_status_and_clean() {
        let dir = tempfile::tempdir().unwrap();
        let files = model_files(&ModelConfig::default());
        assert!(!check_status(&files, dir.path()).unwrap());

        for file in &files {
            fs::write(dir.path().join(&file.local_name), vec![0u8; file.size_bytes as usize]).unwrap();
        }
        fs::write(dir.path().join("det.tmp"), b"partial").unwrap();
        assert!(check_status(&files, dir.path()).unwrap());

        clean_models(&files, dir.path()).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
