//! Core library for field extraction from scanned documents.
//!
//! This crate provides:
//! - Scan conditioning (red-channel grayscale, contrast stretch, sharpen/denoise
//!   convolution, upscaling) tuned per document class
//! - An OCR seam with a pure Rust ONNX recognizer (feature `native`)
//! - Page image extraction from scanned PDFs
//! - A pattern registry and extraction engine for Spanish identity, invoice,
//!   contract and medical documents
//! - NIF/NIE check-letter validation

pub mod error;
pub mod extraction;
pub mod imaging;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod validation;

pub use error::{DocfieldError, Result};
pub use extraction::{ExtractionResult, FieldEngine, FieldExtractor, FieldValue, PatternRegistry, PatternRule};
pub use imaging::ImagePreprocessor;
pub use models::{ClassProfile, DocfieldConfig, DocumentClass};
pub use ocr::{FixedTextRecognizer, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrRecognizer;
pub use pdf::{PageSource, PdfPageExtractor};
pub use pipeline::{DocumentPipeline, DocumentReport, PageReport};
pub use validation::{validate_identity, validate_nie, validate_nif};
