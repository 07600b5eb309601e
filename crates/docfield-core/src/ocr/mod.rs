//! OCR collaborator seam.
//!
//! The pipeline only needs image-in, text-out. [`TextRecognizer`] is that
//! contract; [`FixedTextRecognizer`] serves tests and pre-recognised text, and
//! `PureOcrRecognizer` (feature `native`) runs ONNX models in pure Rust.

mod recognizer;
#[cfg(feature = "native")]
mod pure_engine;

pub use recognizer::FixedTextRecognizer;
#[cfg(feature = "native")]
pub use pure_engine::PureOcrRecognizer;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Converts a page image to text.
///
/// Empty text is a valid result; callers must tolerate it.
pub trait TextRecognizer {
    /// Recognise all text on `image`.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }
}

/// A recognised text line with its quadrilateral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Sort boxes top-to-bottom, then left-to-right within 20px rows.
pub fn sort_by_reading_order(boxes: &mut [TextBox]) {
    boxes.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();

        let row_a = (ay / 20.0) as i32;
        let row_b = (by / 20.0) as i32;

        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
        }
    });
}

/// Join box texts, one per line.
pub fn join_lines(boxes: &[TextBox]) -> String {
    boxes
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 10.0, x, y + 10.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order() {
        let mut boxes = vec![
            text_box(10.0, 100.0, "NIF: 12345678Z"),
            text_box(200.0, 5.0, "PEREZ"),
            text_box(10.0, 2.0, "Nombre: JUAN"),
        ];
        sort_by_reading_order(&mut boxes);
        assert_eq!(join_lines(&boxes), "Nombre: JUAN\nPEREZ\nNIF: 12345678Z");
    }

    #[test]
    fn test_rect() {
        let b = text_box(3.0, 4.0, "x");
        assert_eq!(b.rect(), (3.0, 4.0, 53.0, 14.0));
    }
}
