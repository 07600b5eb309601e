//! Recognizer returning pre-set text.

use std::sync::atomic::{AtomicUsize, Ordering};

use image::DynamicImage;
use tracing::trace;

use super::TextRecognizer;
use crate::error::OcrError;

/// Returns fixed text instead of running OCR.
///
/// With several pages the n-th call returns the n-th text; calls past the
/// end return an empty string.
#[derive(Debug)]
pub struct FixedTextRecognizer {
    pages: Vec<String>,
    next: AtomicUsize,
    repeat: bool,
}

impl FixedTextRecognizer {
    /// Return `text` for every page.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            pages: vec![text.into()],
            next: AtomicUsize::new(0),
            repeat: true,
        }
    }

    /// Return one text per call, in order.
    pub fn pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
            repeat: false,
        }
    }

    /// Number of `recognize` calls so far.
    pub fn calls(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

impl TextRecognizer for FixedTextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        trace!("Fixed recognizer call {} on {}x{} image", index, image.width(), image.height());

        let text = if self.repeat {
            self.pages.first()
        } else {
            self.pages.get(index)
        };
        Ok(text.cloned().unwrap_or_default())
    }
}
