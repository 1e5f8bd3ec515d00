//! Validate command - check an existing record against its source text.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use serde_json::Value;

use cvparse_core::models::record::CanonicalRecord;
use cvparse_core::ValidationOutcome;

use super::{build_validator, load_config, print_report};

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Record JSON produced by `extract`
    #[arg(required = true)]
    record: PathBuf,

    /// Plain text of the original resume, for the semantic check
    #[arg(short, long)]
    text: Option<PathBuf>,

    /// Skip the model-backed semantic check
    #[arg(long)]
    no_semantic: bool,

    /// Stop at the first failing check (email, phone, semantic)
    #[arg(long)]
    short_circuit: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ValidateArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let content = fs::read_to_string(&args.record)?;
    let value: Value = serde_json::from_str(&content)?;

    let raw_text = match &args.text {
        Some(path) => fs::read_to_string(path)?,
        None => String::new(),
    };
    let no_semantic = args.no_semantic || args.text.is_none();
    if args.text.is_none() && !args.no_semantic {
        eprintln!(
            "{} No --text given, skipping the semantic check",
            style("ℹ").blue()
        );
    }

    let short_circuit = args.short_circuit;
    let passed = tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
        let validator = build_validator(&config, no_semantic)?;

        // A record that cannot be typed cannot be checked field by field.
        let schema = validator.schema_check(&value);
        let record: CanonicalRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                let outcome = if schema.passed {
                    ValidationOutcome::fail(format!("Record does not match the canonical shape: {}", e))
                } else {
                    schema
                };
                print_outcome("schema", &outcome, args.json)?;
                return Ok(false);
            }
        };

        if short_circuit {
            let outcome = validator.run_validation(&record, &raw_text);
            print_outcome("validation", &outcome, args.json)?;
            Ok(outcome.passed)
        } else {
            let report = validator.validate_all(&record, &raw_text);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(report.passed())
        }
    })
    .await??;

    if !passed {
        anyhow::bail!("Validation failed");
    }
    println!("{} Record is valid", style("✓").green());
    Ok(())
}

fn print_outcome(name: &str, outcome: &ValidationOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        let mut value = serde_json::to_value(outcome)?;
        value["check"] = Value::from(name);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        let mark = if outcome.passed {
            style("✓").green()
        } else {
            style("✗").red()
        };
        eprintln!("{} {}: {}", mark, name, outcome.message);
    }
    Ok(())
}
