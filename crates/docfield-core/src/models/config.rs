//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::document::DocumentClass;

/// Page width below which the multi-class pipeline upscales.
pub const DEFAULT_UPSCALE_MIN_WIDTH: u32 = 1000;

/// Page width below which the single-document (identity card) scanner upscales.
pub const SINGLE_DOCUMENT_MIN_WIDTH: u32 = 800;

/// Main configuration for the docfield pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocfieldConfig {
    /// Image preprocessing configuration.
    pub preprocess: PreprocessConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF page extraction configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Pages narrower than this are upscaled.
    pub upscale_min_width: u32,

    /// Scale factor applied to both dimensions when upscaling.
    pub upscale_factor: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            upscale_min_width: DEFAULT_UPSCALE_MIN_WIDTH,
            upscale_factor: 2.0,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognised text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }

    /// Whether the detection and recognition models exist on disk.
    pub fn models_present(&self) -> bool {
        self.model_path(&self.detection_model).exists()
            && self.model_path(&self.recognition_model).exists()
    }
}

/// PDF page extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI requested when rendering PDF pages to images.
    pub render_dpi: u32,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            max_pages: 0,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Annotate NIF/NIE matches with checksum validity.
    pub validate_identity: bool,

    /// Document class used when the caller does not name one.
    pub default_class: DocumentClass,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            validate_identity: true,
            default_class: DocumentClass::IdentityCard,
        }
    }
}

impl DocfieldConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.preprocess.upscale_factor >= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "preprocess.upscale_factor".to_string(),
                reason: format!("must be >= 1.0, got {}", self.preprocess.upscale_factor),
            });
        }
        if self.pdf.render_dpi == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pdf.render_dpi".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
