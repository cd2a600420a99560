//! Batch extraction of multiple documents.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{error, warn};

use rossum_core::{DocumentUpload, ErrorKind, ExtractRequest, ExtractionResult, default_output_path};

use super::{ApiArgs, FilterArg, build_client, ctrl_c_token, load_settings};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory (default: next to each document)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Locale hint, e.g. en_US
    #[arg(short, long)]
    locale: Option<String>,

    /// Do not extract table content
    #[arg(long)]
    no_tables: bool,

    /// Field quality filter
    #[arg(short, long, value_enum)]
    filter: Option<FilterArg>,

    /// Also write a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    api: ApiArgs,
}

/// One row of the summary CSV.
#[derive(Serialize)]
struct BatchRow {
    filename: String,
    status: &'static str,
    output: String,
    language: String,
    currency: String,
    fields: usize,
    processing_time_ms: u64,
    error: String,
}

impl BatchRow {
    fn success(path: &Path, output: &Path, result: &ExtractionResult, processing_time_ms: u64) -> Self {
        Self {
            filename: file_name(path),
            status: "success",
            output: output.display().to_string(),
            language: result.language.clone().unwrap_or_default(),
            currency: result.currency.clone().unwrap_or_default(),
            fields: result.fields.len(),
            processing_time_ms,
            error: String::new(),
        }
    }

    fn failure(path: &Path, error: String, processing_time_ms: u64) -> Self {
        Self {
            filename: file_name(path),
            status: "error",
            output: String::new(),
            language: String::new(),
            currency: String::new(),
            fields: 0,
            processing_time_ms,
            error,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string()
}

/// Output path of a document within an optional output directory.
fn output_path(document: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.join(format!("{}.json", file_name(document))),
        None => default_output_path(document),
    }
}

/// Output paths for all documents, refusing two documents that share one.
fn plan_outputs(files: &[PathBuf], output_dir: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::with_capacity(files.len());
    let mut outputs = Vec::with_capacity(files.len());

    for path in files {
        let output = output_path(path, output_dir);
        if let Some(previous) = seen.insert(output.clone(), path.as_path()) {
            anyhow::bail!(
                "{} and {} would both be written to {}",
                previous.display(),
                path.display(),
                output.display()
            );
        }
        outputs.push(output);
    }

    Ok(outputs)
}

pub async fn run(args: BatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let settings = load_settings(config_path)?;
    let client = build_client(&settings, &args.api)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && DocumentUpload::content_type_for(p).is_ok())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching documents found for pattern: {}", args.input);
    }

    let outputs = plan_outputs(&files, args.output_dir.as_deref())?;

    println!(
        "{} Found {} documents to extract",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents")?
            .progress_chars("=>-"),
    );

    let cancel = ctrl_c_token();
    let mut rows = Vec::with_capacity(files.len());

    for (path, output) in files.iter().zip(&outputs) {
        let file_start = Instant::now();

        let mut request = ExtractRequest::new(path).with_output(output);
        if let Some(locale) = &args.locale {
            request = request.with_locale(locale.as_str());
        }
        if args.no_tables {
            request = request.with_tables(false);
        }
        if let Some(filter) = args.filter {
            request = request.with_filter(filter.into());
        }

        let result = client.extract_with(&request, &cancel, |_| {}).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(result) => {
                rows.push(BatchRow::success(path, output, &result, processing_time_ms));
            }
            Err(e) if e.kind() == ErrorKind::Cancelled || !args.continue_on_error => {
                error!("Failed to extract {}: {}", path.display(), e);
                overall_pb.abandon();
                return Err(e).with_context(|| format!("failed to extract {}", path.display()));
            }
            Err(e) => {
                warn!("Failed to extract {}: {}", path.display(), e);
                rows.push(BatchRow::failure(path, e.to_string(), processing_time_ms));
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &rows)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = rows.iter().filter(|r| r.status == "error").collect();

    println!();
    println!(
        "{} Extracted {} documents in {:?}",
        style("✓").green(),
        rows.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(rows.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed documents:").red());
        for row in &failed {
            println!("  - {}: {}", row.filename, row.error);
        }
    }

    Ok(())
}

fn write_summary(path: &Path, rows: &[BatchRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
