//! Process command - extract fields from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docfield_core::models::DocumentClass;
use docfield_core::{DocumentReport, FixedTextRecognizer};

use super::{build_pipeline, load_config, load_pages, load_recognizer};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Page inputs of one document (images or PDF), in page order
    #[arg(required_unless_present = "text")]
    inputs: Vec<PathBuf>,

    /// Document class (identity_card, passport, invoice, contract, medical_record)
    #[arg(short = 'k', long)]
    class: Option<DocumentClass>,

    /// Extract from already recognised text instead of running OCR
    #[arg(long, conflicts_with = "inputs")]
    text: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Treat the input as a lone DNI card scan (800 px threshold, upper-case names)
    #[arg(long)]
    single_document: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let class = args.class.unwrap_or(config.extraction.default_class);

    let report = if let Some(text_path) = &args.text {
        info!("Extracting {} fields from text {}", class, text_path.display());
        let text = fs::read_to_string(text_path)?;
        build_pipeline(&config, FixedTextRecognizer::new(""), args.single_document).process_text(class, &text)
    } else {
        for input in &args.inputs {
            if !input.exists() {
                anyhow::bail!("Input file not found: {}", input.display());
            }
        }

        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")
                .unwrap()
                .progress_chars("##-"),
        );

        pb.set_message("Loading OCR models...");
        pb.set_position(10);
        let recognizer = load_recognizer(args.model_dir.as_ref(), &config)?;

        pb.set_message("Loading pages...");
        pb.set_position(30);
        let mut pages = Vec::new();
        for input in &args.inputs {
            info!("Loading {}", input.display());
            pages.extend(load_pages(input, &config)?);
        }
        debug!("{} page(s) to process", pages.len());

        pb.set_message(format!("Extracting {} fields...", class));
        pb.set_position(50);
        let report = build_pipeline(&config, recognizer, args.single_document).process_results(class, pages);

        pb.finish_with_message("Done");
        report
    };

    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    for warning in &report.result.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if let Some(reason) = &report.unavailable {
        anyhow::bail!("Document unavailable: {}", reason);
    }

    Ok(())
}

/// Format a report.
pub fn format_report(report: &DocumentReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

/// One row per field value; identity numbers carry their checksum verdict.
fn format_csv(report: &DocumentReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["field", "value", "valid"])?;

    for (name, value) in &report.result.fields {
        let checks = report.result.identity_checks.get(name);
        for (i, v) in value.values().into_iter().enumerate() {
            let valid = checks
                .and_then(|c| c.get(i))
                .map(|valid| valid.to_string())
                .unwrap_or_default();
            wtr.write_record([name.as_str(), v, valid.as_str()])?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &DocumentReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document class: {}\n", report.class));
    if let Some(reason) = &report.unavailable {
        output.push_str(&format!("Unavailable: {}\n", reason));
    }
    output.push_str(&format!(
        "Pages: {} ({} ok)\n",
        report.pages.len(),
        report.pages.iter().filter(|p| p.is_ok()).count()
    ));

    output.push_str("\nFields:\n");
    if report.result.fields.is_empty() {
        output.push_str("  (none)\n");
    }
    for (name, value) in &report.result.fields {
        output.push_str(&format!("  {}: {}\n", name, value.values().join(", ")));
    }

    let identity = report.result.identity_numbers();
    if !identity.is_empty() {
        output.push_str("\nIdentity numbers:\n");
        for (kind, number, valid) in identity {
            let verdict = if valid { "valid" } else { "INVALID" };
            output.push_str(&format!("  {} {} ({})\n", kind, number, verdict));
        }
    }

    if !report.result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &report.result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
