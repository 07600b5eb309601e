//! Error types for the docfield-core library.

use thiserror::Error;

/// Main error type for the docfield library.
#[derive(Error, Debug)]
pub enum DocfieldError {
    /// Image preprocessing error.
    #[error("preprocessing error: {0}")]
    Preprocess(#[from] PreprocessError),

    /// OCR collaborator error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// PDF page source error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Invalid convolution kernel.
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the image preprocessor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    /// The image has no pixels.
    #[error("no image: input is {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to PDF page extraction.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// No raster image could be found for a page.
    #[error("failed to extract page image: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised when building a convolution kernel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// The weight count is not `side * side`.
    #[error("kernel of side {side} needs {expected} weights, got {actual}")]
    WrongWeightCount {
        side: usize,
        expected: usize,
        actual: usize,
    },

    /// Kernels need a centre pixel.
    #[error("kernel side must be odd and non-zero, got {0}")]
    EvenSide(usize),
}

/// Errors related to loading and saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value outside its allowed range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Result type for the docfield library.
pub type Result<T> = std::result::Result<T, DocfieldError>;
