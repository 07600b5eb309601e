//! Square convolution kernels and the grayscale convolution engine.

use image::{Rgb, RgbImage};

use crate::error::KernelError;

/// A square matrix of weights with an odd side length.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    side: usize,
    /// Row-major weights.
    weights: Vec<f32>,
}

impl Kernel {
    /// Create a kernel from row-major weights.
    pub fn new(side: usize, weights: Vec<f32>) -> Result<Self, KernelError> {
        if side == 0 || side % 2 == 0 {
            return Err(KernelError::EvenSide(side));
        }
        if weights.len() != side * side {
            return Err(KernelError::WrongWeightCount {
                side,
                expected: side * side,
                actual: weights.len(),
            });
        }
        Ok(Self { side, weights })
    }

    /// Sharpen kernel `[[0,-1,0],[-1,5,-1],[0,-1,0]]`.
    pub fn sharpen() -> Self {
        Self {
            side: 3,
            weights: vec![
                0.0, -1.0, 0.0, //
                -1.0, 5.0, -1.0, //
                0.0, -1.0, 0.0,
            ],
        }
    }

    /// Gaussian-like denoise kernel `[[1,2,1],[2,4,2],[1,2,1]] / 16`.
    pub fn denoise() -> Self {
        let weights = [1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0]
            .iter()
            .map(|w| w / 16.0)
            .collect();
        Self { side: 3, weights }
    }

    /// Side length.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Distance from the centre to an edge of the kernel.
    pub fn radius(&self) -> usize {
        self.side / 2
    }

    /// Weight at `row`, `col`.
    pub fn weight(&self, row: usize, col: usize) -> f32 {
        self.weights[row * self.side + col]
    }
}

/// Convolve the red channel of `image` with `kernel`.
///
/// Interior pixels get the clamped, rounded weighted sum replicated into all
/// three channels. Pixels closer than the kernel radius to any edge are
/// copied unchanged.
pub fn convolve(image: &RgbImage, kernel: &Kernel) -> RgbImage {
    let (width, height) = image.dimensions();
    let radius = kernel.radius() as u32;
    let side = kernel.side();

    let mut output = image.clone();

    // No interior
    if width <= 2 * radius || height <= 2 * radius {
        return output;
    }

    for y in radius..height - radius {
        for x in radius..width - radius {
            let mut sum = 0.0f32;

            for ky in 0..side {
                for kx in 0..side {
                    let px = x - radius + kx as u32;
                    let py = y - radius + ky as u32;
                    sum += image.get_pixel(px, py)[0] as f32 * kernel.weight(ky, kx);
                }
            }

            let value = sum.clamp(0.0, 255.0).round() as u8;
            output.put_pixel(x, y, Rgb([value, value, value]));
        }
    }

    output
}
