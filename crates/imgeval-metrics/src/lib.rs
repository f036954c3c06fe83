//! imgeval-metrics: Pure per-pixel error metrics and false-color mapping
//! (sans-IO).
//!
//! Compares a test image against a reference image:
//! metric -> mean error -> false-color heatmap, plus gamma tonemapping
//! for LDR previews and the scene thumbnail.
//!
//! This crate has **no I/O dependencies** -- it operates on decoded
//! in-memory arrays and returns images and scalars. Decoding HDR files
//! and writing PNGs lives in `imgeval-io`.

pub mod colormap;
pub mod falsecolor;
pub mod metric;
pub mod tonemap;
pub mod types;

pub use falsecolor::{Clip, falsecolor, falsecolor_np, to_rgba8};
pub use metric::{Metric, compute_metric, format_error};
pub use tonemap::{thumbnail, tonemap};
pub use types::{
    ErrorMap, ErrorSummary, HdrImage, MetricError, Rgb32FImage, Rgba32FImage, RgbaImage, Shape,
};

/// Mean error of `test` against `reference` for `metric`.
///
/// Shorthand for [`compute_metric`] followed by [`ErrorMap::mean`].
///
/// # Errors
///
/// Returns [`MetricError::ShapeMismatch`] if the images differ in shape.
pub fn mean_error(
    reference: &HdrImage,
    test: &HdrImage,
    metric: Metric,
    epsilon: f64,
) -> Result<f64, MetricError> {
    Ok(compute_metric(reference, test, metric, epsilon)?.mean())
}
