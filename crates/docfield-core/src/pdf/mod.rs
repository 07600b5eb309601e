//! PDF page source.
//!
//! Scanned PDFs carry one raster image per page. [`PdfPageExtractor`] pulls
//! that image out with lopdf and scales it to the requested DPI, standing in
//! for a full page renderer.

mod extractor;

pub use extractor::PdfPageExtractor;

use image::DynamicImage;
use tracing::warn;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Source of page images for the pipeline.
pub trait PageSource {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Render page `page` (1-indexed) at `dpi`.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;

    /// Render pages in ascending order, at most `max_pages` (0 = all).
    ///
    /// A page that fails to render is kept as an `Err` so callers can report it.
    fn render_pages(&self, dpi: u32, max_pages: usize) -> Vec<Result<DynamicImage>> {
        let count = match (self.page_count() as usize, max_pages) {
            (count, 0) => count,
            (count, max) => count.min(max),
        };

        (1..=count as u32)
            .map(|page| {
                let rendered = self.render_page(page, dpi);
                if let Err(e) = &rendered {
                    warn!("Failed to render page {}: {}", page, e);
                }
                rendered
            })
            .collect()
    }
}
