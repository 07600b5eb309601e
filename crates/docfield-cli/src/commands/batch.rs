//! Batch processing command - one document per file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use docfield_core::models::{DocfieldConfig, DocumentClass};
use docfield_core::{DocumentPipeline, DocumentReport, FixedTextRecognizer, PureOcrRecognizer};

use super::process::{format_report, OutputFormat};
use super::{build_pipeline, ensure_models, load_config, load_pages, load_recognizer, ocr_config, InputKind};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Document class of every file
    #[arg(short = 'k', long)]
    class: Option<DocumentClass>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Treat every file as a lone DNI card scan
    #[arg(long)]
    single_document: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    index: usize,
    path: PathBuf,
    report: Option<DocumentReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

/// Per-worker pipelines. The OCR pipeline loads on the first page input.
struct Worker {
    config: Arc<DocfieldConfig>,
    model_dir: Option<PathBuf>,
    class: DocumentClass,
    single_document: bool,
    text: DocumentPipeline<'static, FixedTextRecognizer>,
    ocr: Option<DocumentPipeline<'static, PureOcrRecognizer>>,
}

impl Worker {
    fn new(config: Arc<DocfieldConfig>, model_dir: Option<PathBuf>, class: DocumentClass, single_document: bool) -> Self {
        let text = build_pipeline(&config, FixedTextRecognizer::new(""), single_document);
        Self {
            config,
            model_dir,
            class,
            single_document,
            text,
            ocr: None,
        }
    }

    fn process_file(&mut self, path: &Path) -> anyhow::Result<DocumentReport> {
        let report = if InputKind::of(path) == Some(InputKind::Text) {
            let text = fs::read_to_string(path)?;
            self.text.process_text(self.class, &text)
        } else {
            let pages = load_pages(path, &self.config)?;
            let pipeline = match self.ocr.take() {
                Some(pipeline) => pipeline,
                None => {
                    let recognizer = load_recognizer(self.model_dir.as_ref(), &self.config)?;
                    build_pipeline(&self.config, recognizer, self.single_document)
                }
            };
            let report = pipeline.process_results(self.class, pages);
            self.ocr = Some(pipeline);
            report
        };

        if let Some(reason) = &report.unavailable {
            anyhow::bail!("{}", reason);
        }
        Ok(report)
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = Arc::new(load_config(config_path)?);
    let class = args.class.unwrap_or(config.extraction.default_class);

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| InputKind::of(p).is_some())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    // Fail early rather than once per file
    if files.iter().any(|f| InputKind::of(f) != Some(InputKind::Text)) {
        ensure_models(&ocr_config(args.model_dir.as_ref(), &config))?;
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    // Create output directory if specified
    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    // Set up progress bars
    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Deal files round-robin to at most `jobs` blocking workers
    let jobs = args.jobs.clamp(1, files.len());
    let mut queues: Vec<Vec<(usize, PathBuf)>> = vec![Vec::new(); jobs];
    for (index, path) in files.into_iter().enumerate() {
        queues[index % jobs].push((index, path));
    }
    debug!("Processing with {} worker(s)", jobs);

    let abort = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::with_capacity(jobs);

    for queue in queues {
        let config = Arc::clone(&config);
        let model_dir = args.model_dir.clone();
        let abort = Arc::clone(&abort);
        let pb = overall_pb.clone();
        let continue_on_error = args.continue_on_error;
        let single_document = args.single_document;

        handles.push(tokio::task::spawn_blocking(move || {
            let mut worker = Worker::new(config, model_dir, class, single_document);
            let mut results = Vec::with_capacity(queue.len());

            for (index, path) in queue {
                if abort.load(Ordering::Relaxed) {
                    break;
                }

                let file_start = Instant::now();
                let outcome = worker.process_file(&path);
                let processing_time_ms = file_start.elapsed().as_millis() as u64;

                let result = match outcome {
                    Ok(report) => ProcessResult {
                        index,
                        path,
                        report: Some(report),
                        error: None,
                        processing_time_ms,
                    },
                    Err(e) => {
                        if continue_on_error {
                            warn!("Failed to process {}: {}", path.display(), e);
                        } else {
                            error!("Failed to process {}: {}", path.display(), e);
                            abort.store(true, Ordering::Relaxed);
                        }
                        ProcessResult {
                            index,
                            path,
                            report: None,
                            error: Some(e.to_string()),
                            processing_time_ms,
                        }
                    }
                };

                results.push(result);
                pb.inc(1);
            }

            results
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.extend(handle.await?);
    }
    results.sort_by_key(|r| r.index);

    overall_pb.finish_with_message("Complete");

    if !args.continue_on_error {
        if let Some(failed) = results.iter().find(|r| r.error.is_some()) {
            anyhow::bail!(
                "Processing failed for {}: {}",
                failed.path.display(),
                failed.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    // Write outputs
    let successful: Vec<_> = results.iter().filter(|r| r.report.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(report) = &result.report {
                let output_path = output_dir.join(output_name(&result.path, args.format));
                fs::write(&output_path, format_report(report, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    // Generate summary if requested
    if args.summary {
        let summary_path = args.output_dir
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

    // Print summary
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

/// Report file name for `path`: the full input name plus the format's
/// extension, so `a.png` and `a.txt` do not overwrite each other.
fn output_name(path: &Path, format: OutputFormat) -> String {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    format!("{}.{}", name, format.extension())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "class",
        "pages",
        "fields",
        "identity_numbers",
        "identity_valid",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = result.processing_time_ms.to_string();

        if let Some(report) = &result.report {
            let identity = report.result.identity_numbers();
            let numbers: Vec<&str> = identity.iter().map(|(_, number, _)| *number).collect();
            let all_valid = if identity.is_empty() {
                String::new()
            } else {
                identity.iter().all(|(_, _, valid)| *valid).to_string()
            };

            wtr.write_record([
                filename,
                "success",
                report.class.as_str(),
                &report.pages.len().to_string(),
                &report.result.fields.len().to_string(),
                &numbers.join(" "),
                &all_valid,
                &report.result.warnings.join("; "),
                &time,
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "failed",
                "",
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
