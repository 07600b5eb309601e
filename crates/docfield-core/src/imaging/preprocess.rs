//! Scan conditioning ahead of OCR.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use tracing::{debug, trace};

use crate::error::PreprocessError;
use crate::imaging::kernel::{convolve, Kernel};
use crate::models::config::{PreprocessConfig, DEFAULT_UPSCALE_MIN_WIDTH};
use crate::models::document::{ClassProfile, DocumentClass, FilterKind};

/// Image preprocessor: grayscale, contrast stretch, class filter, upscale.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Pages narrower than this are upscaled.
    upscale_min_width: u32,
    /// Scale applied to pages below the threshold.
    upscale_factor: f32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            upscale_min_width: DEFAULT_UPSCALE_MIN_WIDTH,
            upscale_factor: 2.0,
        }
    }

    /// Create a preprocessor from the `preprocess` configuration section.
    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self::new()
            .with_upscale_min_width(config.upscale_min_width)
            .with_upscale_factor(config.upscale_factor)
    }

    /// Set the width threshold below which pages are upscaled.
    pub fn with_upscale_min_width(mut self, width: u32) -> Self {
        self.upscale_min_width = width;
        self
    }

    /// Set the upscaling factor.
    pub fn with_upscale_factor(mut self, factor: f32) -> Self {
        self.upscale_factor = factor;
        self
    }

    /// Width threshold below which pages are upscaled.
    pub fn upscale_min_width(&self) -> u32 {
        self.upscale_min_width
    }

    /// Run the full conditioning pipeline for `class`.
    ///
    /// The input is never modified. The result is an RGB image whose three
    /// channels carry the same intensity.
    pub fn preprocess(
        &self,
        image: &DynamicImage,
        class: DocumentClass,
    ) -> Result<DynamicImage, PreprocessError> {
        trace!("Using {} profile", class);
        self.preprocess_with_profile(image, &class.profile())
    }

    /// Run the conditioning pipeline with an explicit profile.
    ///
    /// A profile carrying its own upscale threshold takes precedence over
    /// the preprocessor's.
    pub fn preprocess_with_profile(
        &self,
        image: &DynamicImage,
        profile: &ClassProfile,
    ) -> Result<DynamicImage, PreprocessError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PreprocessError::EmptyImage { width, height });
        }

        debug!(
            "Preprocessing {}x{} page (contrast {}, filter {:?})",
            width, height, profile.contrast_factor, profile.filter
        );

        let gray = to_grayscale(image);
        let stretched = stretch_contrast(&gray, profile.contrast_factor);
        let filtered = apply_filter(&stretched, profile.filter);
        let threshold = profile.upscale_min_width.unwrap_or(self.upscale_min_width);
        let upscaled = self.upscale_below(&filtered, threshold);

        trace!("Preprocessed page is {}x{}", upscaled.width(), upscaled.height());
        Ok(DynamicImage::ImageRgb8(upscaled))
    }

    /// Upscale pages narrower than the threshold.
    ///
    /// Both dimensions are multiplied by the upscale factor once and
    /// resampled with Catmull-Rom, so a very narrow page may still end up
    /// below the threshold. Pages at or above the threshold are returned as is.
    pub fn upscale(&self, image: &RgbImage) -> RgbImage {
        self.upscale_below(image, self.upscale_min_width)
    }

    fn upscale_below(&self, image: &RgbImage, threshold: u32) -> RgbImage {
        let (width, height) = image.dimensions();
        let factor = self.upscale_factor as f64;

        if width >= threshold || width == 0 || factor <= 1.0 {
            return image.clone();
        }

        let new_width = (width as f64 * factor).round() as u32;
        let new_height = ((height as f64 * factor).round() as u32).max(1);
        debug!(
            "Upscaling {}x{} -> {}x{} (threshold {})",
            width, height, new_width, new_height, threshold
        );

        image::imageops::resize(image, new_width, new_height, FilterType::CatmullRom)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Replicate the red channel of every pixel into all three channels.
///
/// Downstream steps are calibrated against red-channel intensity, not
/// perceptual luminance.
pub fn to_grayscale(image: &DynamicImage) -> RgbImage {
    let mut rgb = image.to_rgb8();
    for pixel in rgb.pixels_mut() {
        let value = pixel[0];
        *pixel = Rgb([value, value, value]);
    }
    rgb
}

/// `clamp(0, 255, round((in - 128) * factor + 128))` per pixel, on the red channel.
pub fn stretch_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let stretched = (pixel[0] as f32 - 128.0) * factor + 128.0;
        let value = stretched.round().clamp(0.0, 255.0) as u8;
        *pixel = Rgb([value, value, value]);
    }
    output
}

/// Apply the class-specific convolution filter.
pub fn apply_filter(image: &RgbImage, filter: FilterKind) -> RgbImage {
    match filter {
        FilterKind::None => image.clone(),
        FilterKind::Sharpen => convolve(image, &Kernel::sharpen()),
        FilterKind::Denoise => convolve(image, &Kernel::denoise()),
    }
}
