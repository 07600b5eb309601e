//! Page images to extracted fields.
//!
//! Pages are preprocessed and recognised in ascending order, their texts
//! joined with a blank line, and the joined text handed to the extraction
//! engine once. A page that cannot be decoded, preprocessed or recognised is
//! omitted and reported. When no page survives the report is marked
//! unavailable instead of failing.

use std::borrow::Cow;
use std::time::Instant;

use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::extraction::{ExtractionResult, FieldEngine, PatternRegistry, STANDARD_REGISTRY};
use crate::imaging::ImagePreprocessor;
use crate::models::config::DocfieldConfig;
use crate::models::document::{ClassProfile, DocumentClass};
use crate::ocr::TextRecognizer;
use crate::pdf::PageSource;

/// Separator between page texts.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Outcome for one input page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    /// Page number (1-indexed).
    pub number: usize,

    /// Size of the supplied image, when it could be decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size: Option<(u32, u32)>,

    /// Size after preprocessing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_size: Option<(u32, u32)>,

    /// Characters recognised.
    pub chars: usize,

    /// Why the page was omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageReport {
    /// Whether the page contributed text.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Class chosen by the caller.
    pub class: DocumentClass,

    /// Extracted fields.
    pub result: ExtractionResult,

    /// Per-page outcomes, in input order.
    pub pages: Vec<PageReport>,

    /// Joined OCR text before whitespace normalization.
    pub raw_text: String,

    /// Set when no page could be processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<String>,

    /// Wall-clock processing time.
    pub processing_time_ms: u64,

    /// When processing finished.
    pub processed_at: DateTime<Utc>,
}

impl DocumentReport {
    /// Whether the document produced an extraction result.
    pub fn is_available(&self) -> bool {
        self.unavailable.is_none()
    }

    fn unavailable_report(class: DocumentClass, pages: Vec<PageReport>, reason: impl Into<String>, start: Instant) -> Self {
        Self {
            class,
            result: ExtractionResult::default(),
            pages,
            raw_text: String::new(),
            unavailable: Some(reason.into()),
            processing_time_ms: start.elapsed().as_millis() as u64,
            processed_at: Utc::now(),
        }
    }
}

/// Preprocess, recognise and extract over a page sequence.
pub struct DocumentPipeline<'r, R: TextRecognizer> {
    preprocessor: ImagePreprocessor,
    recognizer: R,
    engine: FieldEngine<'r>,
    profile: Option<ClassProfile>,
}

impl<R: TextRecognizer> DocumentPipeline<'static, R> {
    /// Pipeline with default settings and the standard registry.
    pub fn new(recognizer: R) -> Self {
        Self {
            preprocessor: ImagePreprocessor::new(),
            recognizer,
            engine: FieldEngine::standard(),
            profile: None,
        }
    }

    /// Pipeline configured from `config` with the standard registry.
    pub fn from_config(config: &DocfieldConfig, recognizer: R) -> Self {
        Self {
            preprocessor: ImagePreprocessor::from_config(&config.preprocess),
            recognizer,
            engine: FieldEngine::new(&STANDARD_REGISTRY)
                .with_identity_validation(config.extraction.validate_identity),
            profile: None,
        }
    }
}

impl<'r, R: TextRecognizer> DocumentPipeline<'r, R> {
    /// Replace the preprocessor.
    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Extract with `registry` instead of the standard one.
    pub fn with_registry<'a>(self, registry: &'a PatternRegistry) -> DocumentPipeline<'a, R> {
        DocumentPipeline {
            preprocessor: self.preprocessor,
            recognizer: self.recognizer,
            engine: FieldEngine::new(registry).with_identity_validation(self.engine.validates_identity()),
            profile: self.profile,
        }
    }

    /// Process every document with `profile` instead of its class profile.
    ///
    /// Reports still carry the caller's class.
    pub fn with_profile(mut self, profile: ClassProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Enable or disable checksum annotation.
    pub fn with_identity_validation(mut self, validate: bool) -> Self {
        self.engine = self.engine.with_identity_validation(validate);
        self
    }

    /// The recognizer.
    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    fn profile_for(&self, class: DocumentClass) -> ClassProfile {
        self.profile.unwrap_or_else(|| class.profile())
    }

    /// Process decoded page images.
    pub fn process(&self, class: DocumentClass, pages: &[DynamicImage]) -> DocumentReport {
        self.run(class, pages.iter().map(|page| Ok(Cow::Borrowed(page))))
    }

    /// Process encoded page images (PNG, JPEG, ...).
    pub fn process_encoded<B: AsRef<[u8]>>(&self, class: DocumentClass, pages: &[B]) -> DocumentReport {
        self.run(
            class,
            pages.iter().map(|bytes| {
                image::load_from_memory(bytes.as_ref())
                    .map(Cow::Owned)
                    .map_err(|e| format!("decode failed: {}", e))
            }),
        )
    }

    /// Process the pages of `source`, rendered at `dpi`.
    pub fn process_source<S: PageSource + ?Sized>(
        &self,
        class: DocumentClass,
        source: &S,
        dpi: u32,
        max_pages: usize,
    ) -> DocumentReport {
        self.run(
            class,
            source
                .render_pages(dpi, max_pages)
                .into_iter()
                .map(|page| page.map(Cow::Owned).map_err(|e| e.to_string())),
        )
    }

    /// Process pages that may already have failed upstream.
    pub fn process_results(
        &self,
        class: DocumentClass,
        pages: Vec<Result<DynamicImage, String>>,
    ) -> DocumentReport {
        self.run(class, pages.into_iter().map(|page| page.map(Cow::Owned)))
    }

    /// Extract from already-recognised text, skipping imaging and OCR.
    pub fn process_text(&self, class: DocumentClass, text: &str) -> DocumentReport {
        let start = Instant::now();
        let result = self.engine.extract_with_profile(text, &self.profile_for(class));
        DocumentReport {
            class,
            result,
            pages: Vec::new(),
            raw_text: text.to_string(),
            unavailable: None,
            processing_time_ms: start.elapsed().as_millis() as u64,
            processed_at: Utc::now(),
        }
    }

    fn run<'a, I>(&self, class: DocumentClass, pages: I) -> DocumentReport
    where
        I: Iterator<Item = Result<Cow<'a, DynamicImage>, String>>,
    {
        let start = Instant::now();
        let profile = self.profile_for(class);
        let mut reports = Vec::new();
        let mut texts = Vec::new();

        for (index, page) in pages.enumerate() {
            let number = index + 1;
            let report = match page {
                Ok(image) => match self.page_text(&image, &profile) {
                    Ok((text, processed_size)) => {
                        let report = PageReport {
                            number,
                            original_size: Some(image.dimensions()),
                            processed_size: Some(processed_size),
                            chars: text.chars().count(),
                            error: None,
                        };
                        texts.push(text);
                        report
                    }
                    Err(reason) => PageReport {
                        number,
                        original_size: Some(image.dimensions()),
                        processed_size: None,
                        chars: 0,
                        error: Some(reason),
                    },
                },
                Err(reason) => PageReport {
                    number,
                    original_size: None,
                    processed_size: None,
                    chars: 0,
                    error: Some(reason),
                },
            };

            if let Some(reason) = &report.error {
                warn!("Omitting page {}: {}", number, reason);
            }
            reports.push(report);
        }

        if reports.is_empty() {
            return DocumentReport::unavailable_report(class, reports, "no pages supplied", start);
        }
        if texts.is_empty() {
            let reason = format!("none of {} page(s) could be processed", reports.len());
            return DocumentReport::unavailable_report(class, reports, reason, start);
        }

        let raw_text = texts.join(PAGE_SEPARATOR);
        let mut result = self.engine.extract_with_profile(&raw_text, &profile);
        for page in reports.iter().filter(|p| !p.is_ok()) {
            result.warnings.push(format!(
                "page {} omitted: {}",
                page.number,
                page.error.as_deref().unwrap_or_default()
            ));
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Processed {} document: {}/{} page(s), {} field(s) in {}ms",
            class,
            texts.len(),
            reports.len(),
            result.fields.len(),
            processing_time_ms
        );

        DocumentReport {
            class,
            result,
            pages: reports,
            raw_text,
            unavailable: None,
            processing_time_ms,
            processed_at: Utc::now(),
        }
    }

    fn page_text(&self, image: &DynamicImage, profile: &ClassProfile) -> Result<(String, (u32, u32)), String> {
        let processed = self
            .preprocessor
            .preprocess_with_profile(image, profile)
            .map_err(|e| e.to_string())?;
        let size = processed.dimensions();

        let text = self.recognizer.recognize(&processed).map_err(|e| e.to_string())?;
        if text.trim().is_empty() {
            debug!("Recognizer returned no text for {}x{} page", size.0, size.1);
        }
        Ok((text, size))
    }
}
