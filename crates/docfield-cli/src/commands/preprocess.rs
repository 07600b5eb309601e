//! Preprocess command - write the conditioned page image OCR would see.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use docfield_core::models::{ClassProfile, DocumentClass};
use docfield_core::pdf::PageSource;
use docfield_core::{ImagePreprocessor, PdfPageExtractor};

use super::{load_config, InputKind};

/// Arguments for the preprocess command.
#[derive(Args)]
pub struct PreprocessArgs {
    /// Input file (image or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Document class whose profile to apply
    #[arg(short = 'k', long)]
    class: Option<DocumentClass>,

    /// Output image (format from the extension)
    #[arg(short, long)]
    output: PathBuf,

    /// PDF page to preprocess (1-indexed)
    #[arg(short, long, default_value = "1")]
    page: u32,

    /// Apply the DNI card profile instead of the class profile
    #[arg(long)]
    single_document: bool,
}

pub async fn run(args: PreprocessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let class = args.class.unwrap_or(config.extraction.default_class);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let image = match InputKind::of(&args.input) {
        Some(InputKind::Pdf) => {
            let extractor = PdfPageExtractor::open(&args.input)?;
            extractor.render_page(args.page, config.pdf.render_dpi)?
        }
        Some(InputKind::Image) => image::open(&args.input)?,
        _ => anyhow::bail!("Unsupported file format: {}", args.input.display()),
    };

    let preprocessor = ImagePreprocessor::from_config(&config.preprocess);
    let profile = if args.single_document {
        info!("Preprocessing {} as a single document", args.input.display());
        ClassProfile::SINGLE_DOCUMENT
    } else {
        info!("Preprocessing {} as {}", args.input.display(), class);
        class.profile()
    };
    let processed = preprocessor.preprocess_with_profile(&image, &profile)?;
    processed.save(&args.output)?;

    println!(
        "{} {}x{} -> {}x{} written to {}",
        style("✓").green(),
        image.width(),
        image.height(),
        processed.width(),
        processed.height(),
        args.output.display()
    );

    Ok(())
}
