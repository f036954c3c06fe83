//! Shared types for the imgeval metric engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `Rgb32FImage` so downstream crates can hand decoded HDR
/// buffers to [`HdrImage::from_rgb32f`] without depending on `image`
/// directly.
pub use image::Rgb32FImage;

/// Re-export `Rgba32FImage`, the output type of the false-color mappers.
pub use image::Rgba32FImage;

/// Re-export `RgbaImage` so downstream crates can write LDR artifacts
/// without depending on `image` directly.
pub use image::RgbaImage;

/// Shape of an image array: height × width × channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    /// Number of rows.
    pub height: usize,
    /// Number of columns.
    pub width: usize,
    /// Values per pixel (1 for a 2D array).
    pub channels: usize,
}

impl Shape {
    /// Create a new shape.
    #[must_use]
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Total number of pixel-channel values.
    #[must_use]
    pub const fn len(self) -> usize {
        self.height * self.width * self.channels
    }

    /// Returns `true` if the shape holds no values.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Number of pixels (`height * width`).
    #[must_use]
    pub const fn pixel_count(self) -> usize {
        self.height * self.width
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// A high dynamic range image: row-major `f64` values, channels
/// interleaved.
///
/// Values are never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct HdrImage {
    shape: Shape,
    data: Vec<f64>,
}

impl HdrImage {
    /// Wrap raw row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidData`] if `data.len()` does not
    /// equal `shape.len()`.
    pub fn new(shape: Shape, data: Vec<f64>) -> Result<Self, MetricError> {
        if data.len() != shape.len() {
            return Err(MetricError::InvalidData {
                expected: shape.len(),
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Build an image by evaluating `f(row, column, channel)` for every
    /// value.
    #[must_use]
    pub fn from_fn(shape: Shape, mut f: impl FnMut(usize, usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(shape.len());
        for y in 0..shape.height {
            for x in 0..shape.width {
                for c in 0..shape.channels {
                    data.push(f(y, x, c));
                }
            }
        }
        Self { shape, data }
    }

    /// An image with every value set to `value`.
    #[must_use]
    pub fn filled(shape: Shape, value: f64) -> Self {
        Self {
            shape,
            data: vec![value; shape.len()],
        }
    }

    /// Widen a decoded 32-bit float RGB buffer to double precision.
    #[must_use]
    pub fn from_rgb32f(image: &Rgb32FImage) -> Self {
        let shape = Shape::new(image.height() as usize, image.width() as usize, 3);
        let data = image.as_raw().iter().map(|&v| f64::from(v)).collect();
        Self { shape, data }
    }

    /// The image shape.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// All values, row-major with interleaved channels.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Value at `(row, column, channel)`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, y: usize, x: usize, c: usize) -> Option<f64> {
        if y >= self.shape.height || x >= self.shape.width || c >= self.shape.channels {
            return None;
        }
        self.data
            .get((y * self.shape.width + x) * self.shape.channels + c)
            .copied()
    }

    /// Iterate over pixels as channel slices, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.shape.channels.max(1))
    }
}

/// Per pixel-channel error values between a reference and a test image.
///
/// Same shape as its inputs. Only the mean and the false-color rendering
/// of an error map are ever persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMap {
    shape: Shape,
    data: Vec<f64>,
}

impl ErrorMap {
    pub(crate) const fn from_parts(shape: Shape, data: Vec<f64>) -> Self {
        Self { shape, data }
    }

    /// The error map shape (identical to the compared images).
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// All error values, row-major with interleaved channels.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Arithmetic mean over every pixel-channel value.
    ///
    /// Returns `NaN` for an empty map; report builds reject empty images
    /// before a mean could be stored.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Smallest error value, or `NaN` for an empty map.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.data.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
    }

    /// Largest error value, or `NaN` for an empty map.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.data.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
    }

    /// Population variance over every pixel-channel value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.data
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / self.data.len() as f64
    }

    /// Per-pixel mean across the channel axis, row-major.
    #[allow(clippy::cast_precision_loss)]
    pub fn channel_means(&self) -> impl Iterator<Item = f64> + '_ {
        let channels = self.shape.channels.max(1);
        self.data
            .chunks_exact(channels)
            .map(move |px| px.iter().sum::<f64>() / channels as f64)
    }

    /// Summary statistics of the map.
    #[must_use]
    pub fn summary(&self) -> ErrorSummary {
        ErrorSummary {
            mean: self.mean(),
            min: self.min(),
            max: self.max(),
            variance: self.variance(),
        }
    }
}

/// Scalar summary of an [`ErrorMap`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    /// Mean error.
    pub mean: f64,
    /// Minimum error.
    pub min: f64,
    /// Maximum error.
    pub max: f64,
    /// Population variance.
    pub variance: f64,
}

/// Errors produced by the metric engine.
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    /// A metric identifier outside the supported set.
    #[error("invalid metric: {0:?} (expected one of l1, l2, mrse, mape, smape)")]
    InvalidMetric(String),

    /// Reference and test arrays have different shapes.
    #[error("shape mismatch: reference is {reference}, test is {test}")]
    ShapeMismatch {
        /// Shape of the reference image.
        reference: Shape,
        /// Shape of the test image.
        test: Shape,
    },

    /// Raw data length does not match the declared shape.
    #[error("image data has {actual} values, shape requires {expected}")]
    InvalidData {
        /// Values required by the shape.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },
}
