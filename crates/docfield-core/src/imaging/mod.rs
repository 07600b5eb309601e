//! Image conditioning: convolution kernels and the preprocessing pipeline.

pub mod kernel;
pub mod preprocess;

pub use kernel::{convolve, Kernel};
pub use preprocess::{apply_filter, stretch_contrast, to_grayscale, ImagePreprocessor};
