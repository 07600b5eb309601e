//! CLI subcommands and the input helpers they share.

pub mod batch;
pub mod config;
pub mod preprocess;
pub mod process;
pub mod validate;

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::debug;

use docfield_core::models::config::OcrConfig;
use docfield_core::models::{ClassProfile, DocfieldConfig};
use docfield_core::pdf::PageSource;
use docfield_core::{DocumentPipeline, PdfPageExtractor, PureOcrRecognizer, TextRecognizer};

/// Image extensions accepted as page inputs.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "tif", "bmp", "webp"];

/// Kind of input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Scanned PDF, one image per page.
    Pdf,
    /// Single page image.
    Image,
    /// Already recognised text.
    Text,
}

impl InputKind {
    /// Classify `path` by extension.
    pub fn of(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Some(InputKind::Pdf),
            "txt" => Some(InputKind::Text),
            ext if IMAGE_EXTENSIONS.contains(&ext) => Some(InputKind::Image),
            _ => None,
        }
    }
}

/// Load the configuration from `config_path`, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocfieldConfig> {
    if let Some(path) = config_path {
        return Ok(DocfieldConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using configuration at {}", default_path.display());
        Ok(DocfieldConfig::from_file(&default_path)?)
    } else {
        Ok(DocfieldConfig::default())
    }
}

/// OCR configuration with `model_dir` overriding the configured directory.
pub fn ocr_config(model_dir: Option<&PathBuf>, config: &DocfieldConfig) -> OcrConfig {
    let mut ocr = config.ocr.clone();
    if let Some(dir) = model_dir {
        ocr.model_dir = dir.clone();
    }
    ocr
}

/// Fail with a hint when the OCR models are missing.
pub fn ensure_models(ocr: &OcrConfig) -> anyhow::Result<()> {
    if !ocr.models_present() {
        anyhow::bail!(
            "OCR models not found in {}.\n\n\
             Place {} and {} there, pass --model-dir, or use --text with already recognised text.",
            ocr.model_dir.display(),
            ocr.detection_model,
            ocr.recognition_model
        );
    }
    Ok(())
}

/// Load the OCR recognizer from `model_dir` or the configured directory.
pub fn load_recognizer(model_dir: Option<&PathBuf>, config: &DocfieldConfig) -> anyhow::Result<PureOcrRecognizer> {
    let ocr = ocr_config(model_dir, config);
    ensure_models(&ocr)?;

    debug!("Loading OCR models from {}", ocr.model_dir.display());
    PureOcrRecognizer::from_config(&ocr).map_err(|e| anyhow::anyhow!("Failed to load OCR models: {}", e))
}

/// Pipeline configured from `config`, using the DNI card profile for
/// every document when `single_document` is set.
pub fn build_pipeline<R: TextRecognizer>(
    config: &DocfieldConfig,
    recognizer: R,
    single_document: bool,
) -> DocumentPipeline<'static, R> {
    let pipeline = DocumentPipeline::from_config(config, recognizer);
    if single_document {
        pipeline.with_profile(ClassProfile::SINGLE_DOCUMENT)
    } else {
        pipeline
    }
}

/// Page images of one input file. Pages that fail to load are kept as errors.
pub fn load_pages(path: &Path, config: &DocfieldConfig) -> anyhow::Result<Vec<Result<DynamicImage, String>>> {
    match InputKind::of(path) {
        Some(InputKind::Pdf) => {
            let extractor = PdfPageExtractor::open(path)?;
            debug!("{} has {} pages", path.display(), extractor.page_count());

            Ok(extractor
                .render_pages(config.pdf.render_dpi, config.pdf.max_pages)
                .into_iter()
                .map(|page| page.map_err(|e| e.to_string()))
                .collect())
        }
        Some(InputKind::Image) => Ok(vec![image::open(path).map_err(|e| format!("{}: {}", path.display(), e))]),
        Some(InputKind::Text) => anyhow::bail!("{} is a text file, not a page image", path.display()),
        None => anyhow::bail!("Unsupported file format: {}", path.display()),
    }
}
