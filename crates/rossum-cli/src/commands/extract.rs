//! Extract command - submit a single document and save its extraction.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::debug;

use rossum_core::summary::summary_lines;
use rossum_core::{ExtractRequest, default_output_path};

use super::{ApiArgs, FilterArg, build_client, ctrl_c_token, load_settings, spinner};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Document path (PDF/PNG/JPEG)
    #[arg(value_name = "DOCUMENT_PATH")]
    document: PathBuf,

    /// Path of output JSON (defaults to DOCUMENT_PATH + .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Locale hint, e.g. en_US (dates like 12. 6. 2018 depend on it)
    #[arg(short, long)]
    locale: Option<String>,

    /// Do not extract table content
    #[arg(long)]
    no_tables: bool,

    /// Field quality filter
    #[arg(short, long, value_enum)]
    filter: Option<FilterArg>,

    /// Do not print the field summary
    #[arg(long)]
    no_summary: bool,

    #[command(flatten)]
    api: ApiArgs,
}

impl ExtractArgs {
    fn request(&self, output: &Path) -> ExtractRequest {
        let mut request = ExtractRequest::new(&self.document).with_output(output);
        if let Some(locale) = &self.locale {
            request = request.with_locale(locale.as_str());
        }
        if self.no_tables {
            request = request.with_tables(false);
        }
        if let Some(filter) = self.filter {
            request = request.with_filter(filter.into());
        }
        request
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let settings = load_settings(config_path)?;
    let client = build_client(&settings, &args.api)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.document));
    let request = args.request(&output);

    println!("Extracting document: {}", args.document.display());

    let cancel = ctrl_c_token();
    let pb = spinner("Submitting document...")?;
    let mut previewed = false;

    let result = client
        .extract_with(&request, &cancel, |job| {
            if !previewed {
                previewed = true;
                pb.suspend(|| println!("Web preview: {}", client.document_preview_url(&job.id)));
            }
            pb.set_message(format!("Processing document (check {})", job.checks));
        })
        .await;

    let result = match result {
        Ok(result) => {
            pb.finish_with_message("Done");
            result
        }
        Err(err) => {
            pb.abandon_with_message("Failed");
            return Err(err)
                .with_context(|| format!("failed to extract {}", args.document.display()));
        }
    };

    if !args.no_summary {
        for line in summary_lines(&result, true) {
            println!("{}", line);
        }
    }

    println!(
        "{} Extracted to: {}",
        style("✓").green(),
        output.display()
    );

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
