//! WASM bindings for document field extraction.
//!
//! OCR runs on the JavaScript side; these bindings condition page images
//! before OCR and extract fields from the recognised text.

use std::io::Cursor;

use wasm_bindgen::prelude::*;

use docfield_core::extraction::ExtractionResult;
use docfield_core::imaging::ImagePreprocessor;
use docfield_core::models::DocumentClass;
use docfield_core::ocr::{join_lines, sort_by_reading_order, TextBox};
use docfield_core::FieldEngine;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn parse_class(class: &str) -> Result<DocumentClass, JsValue> {
    class.parse::<DocumentClass>().map_err(|e| JsValue::from_str(&e))
}

fn extract(text: &str, class: DocumentClass, validate: bool) -> ExtractionResult {
    FieldEngine::standard()
        .with_identity_validation(validate)
        .extract(text, class)
}

/// Extract fields from OCR text for a document class.
///
/// `class` is a class name such as `identity_card`, `invoice` or `dni`.
#[wasm_bindgen]
pub fn extract_fields_from_text(text: &str, class: &str) -> Result<JsValue, JsValue> {
    let result = extract(text, parse_class(class)?, true);
    serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Same as `extract_fields_from_text`, as a JSON string.
#[wasm_bindgen]
pub fn extract_fields_json(text: &str, class: &str) -> Result<String, JsValue> {
    let result = extract(text, parse_class(class)?, true);
    serde_json::to_string(&result).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Validate a Spanish NIF.
#[wasm_bindgen]
pub fn validate_nif(code: &str) -> bool {
    docfield_core::validate_nif(code)
}

/// Validate a Spanish NIE.
#[wasm_bindgen]
pub fn validate_nie(code: &str) -> bool {
    docfield_core::validate_nie(code)
}

/// Validate a NIF or NIE, chosen by the leading character.
#[wasm_bindgen]
pub fn validate_identity(code: &str) -> bool {
    docfield_core::validate_identity(code)
}

/// Condition an encoded page image for OCR and return it as PNG.
#[wasm_bindgen]
pub fn preprocess_image(data: &[u8], class: &str) -> Result<Vec<u8>, JsValue> {
    let class = parse_class(class)?;
    let image = image::load_from_memory(data).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let processed = ImagePreprocessor::new()
        .preprocess(&image, class)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let mut png = Vec::new();
    processed
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(png)
}

/// Field extractor class for browser use.
#[wasm_bindgen]
pub struct FieldExtractorJs {
    class: DocumentClass,
    validate_identity: bool,
}

#[wasm_bindgen]
impl FieldExtractorJs {
    /// Create an extractor for a document class.
    #[wasm_bindgen(constructor)]
    pub fn new(class: &str) -> Result<FieldExtractorJs, JsValue> {
        Ok(Self {
            class: parse_class(class)?,
            validate_identity: true,
        })
    }

    /// Canonical name of the document class.
    #[wasm_bindgen(getter)]
    pub fn document_class(&self) -> String {
        self.class.to_string()
    }

    /// Configure checksum annotation of identity numbers.
    #[wasm_bindgen]
    pub fn set_validate_identity(&mut self, validate: bool) {
        self.validate_identity = validate;
    }

    /// Extract fields from text.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        let result = extract(text, self.class, self.validate_identity);
        serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// OCR result from browser-side processing.
#[wasm_bindgen]
pub struct OcrResultJs {
    boxes: Vec<TextBox>,
}

#[wasm_bindgen]
impl OcrResultJs {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { boxes: Vec::new() }
    }

    /// Add a recognised line with its quadrilateral.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_box(
        &mut self,
        text: &str,
        x1: f32, y1: f32,
        x2: f32, y2: f32,
        x3: f32, y3: f32,
        x4: f32, y4: f32,
        confidence: f32,
    ) {
        self.boxes.push(TextBox {
            bbox: [x1, y1, x2, y2, x3, y3, x4, y4],
            text: text.to_string(),
            confidence,
        });
    }

    /// Full text in reading order.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        let mut boxes = self.boxes.clone();
        sort_by_reading_order(&mut boxes);
        join_lines(&boxes)
    }

    /// Extract fields from this OCR result.
    #[wasm_bindgen]
    pub fn extract_fields(&self, class: &str) -> Result<JsValue, JsValue> {
        extract_fields_from_text(&self.get_text(), class)
    }
}

impl Default for OcrResultJs {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the supported document classes.
#[wasm_bindgen]
pub fn document_classes() -> Vec<String> {
    DocumentClass::ALL.iter().map(|c| c.to_string()).collect()
}
