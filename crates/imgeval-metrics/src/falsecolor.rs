//! False-color heatmaps of error maps.
//!
//! [`falsecolor`] reduces an [`ErrorMap`] to one value per pixel (mean
//! across channels), normalizes it into the clip range and maps it
//! through [`viridis`](crate::colormap::viridis).
//!
//! Normalization is
//!
//! ```text
//! (mean - clip.min) / (clip.max - clip.min + ε)
//! ```
//!
//! `ε` is added for every range, not only the degenerate
//! `clip.min == clip.max` one.
//!
//! [`falsecolor_np`] renders the signed SMAPE instead: red where the
//! test image is darker than the reference, green where it is brighter.

use serde::{Deserialize, Serialize};

use crate::colormap::viridis;
use crate::types::{ErrorMap, HdrImage, MetricError, Rgba32FImage, RgbaImage};

/// Error range mapped onto the colormap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Error value mapped to the lowest color.
    pub min: f64,
    /// Error value mapped to the highest color.
    pub max: f64,
}

impl Clip {
    /// Create a clip range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Normalize `value` into `[0, 1]`; `NaN` maps to 0.
    #[must_use]
    pub fn normalize(self, value: f64, epsilon: f64) -> f64 {
        let t = (value - self.min) / (self.max - self.min + epsilon);
        if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
    }
}

impl Default for Clip {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Render `error` as a viridis heatmap with RGBA components in `[0, 1]`.
#[must_use]
pub fn falsecolor(error: &ErrorMap, clip: Clip, epsilon: f64) -> Rgba32FImage {
    let shape = error.shape();
    let colors: Vec<[f32; 4]> = error
        .channel_means()
        .map(|mean| viridis(clip.normalize(mean, epsilon)))
        .collect();
    build_rgba(shape.width, shape.height, &colors)
}

/// Render the signed ("negative/positive") SMAPE between `reference`
/// and `test`.
///
/// Per pixel, the channel mean `s` of `2d / (reference + test + ε)` is
/// computed. Its magnitude, `min(|s| / 2, 1)`, sets the intensity; the
/// sign picks red (`d > 0`, test darker) or green (`d < 0`, test
/// brighter).
///
/// # Errors
///
/// Returns [`MetricError::ShapeMismatch`] if the images differ in shape.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn falsecolor_np(
    reference: &HdrImage,
    test: &HdrImage,
    epsilon: f64,
) -> Result<Rgba32FImage, MetricError> {
    if reference.shape() != test.shape() {
        return Err(MetricError::ShapeMismatch {
            reference: reference.shape(),
            test: test.shape(),
        });
    }

    let shape = reference.shape();
    let channels = shape.channels.max(1) as f64;
    let colors: Vec<[f32; 4]> = reference
        .pixels()
        .zip(test.pixels())
        .map(|(r, t)| {
            let signed = r
                .iter()
                .zip(t)
                .map(|(&r, &t)| 2.0 * (r - t) / (r + t + epsilon))
                .sum::<f64>()
                / channels;
            let intensity = if signed.is_nan() {
                0.0
            } else {
                (signed.abs() / 2.0).min(1.0) as f32
            };
            if signed > 0.0 {
                [intensity, 0.0, 0.0, 1.0]
            } else {
                [0.0, intensity, 0.0, 1.0]
            }
        })
        .collect();
    Ok(build_rgba(shape.width, shape.height, &colors))
}

/// Quantize a `[0, 1]` float RGBA image to 8 bits per channel.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_rgba8(image: &Rgba32FImage) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y).0;
        image::Rgba(px.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
    })
}

#[allow(clippy::cast_possible_truncation)]
fn build_rgba(width: usize, height: usize, colors: &[[f32; 4]]) -> Rgba32FImage {
    Rgba32FImage::from_fn(width as u32, height as u32, |x, y| {
        let idx = y as usize * width + x as usize;
        image::Rgba(colors.get(idx).copied().unwrap_or([0.0, 0.0, 0.0, 1.0]))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::metric::{Metric, compute_metric};
    use crate::types::Shape;

    fn in_unit_range(img: &Rgba32FImage) -> bool {
        img.as_raw().iter().all(|v| (0.0..=1.0).contains(v))
    }

    #[test]
    fn huge_errors_are_clamped() {
        let reference = HdrImage::filled(Shape::new(3, 4, 3), 0.0);
        let test = HdrImage::filled(Shape::new(3, 4, 3), 1e9_f64.sqrt());
        let err = compute_metric(&reference, &test, Metric::L2, 0.01).unwrap();
        assert!((err.mean() - 1e9).abs() < 1.0);

        let fc = falsecolor(&err, Clip::default(), 0.01);
        assert!(in_unit_range(&fc));
        assert_eq!(fc.get_pixel(0, 0).0, viridis(1.0));
    }

    #[test]
    fn zero_error_maps_to_lowest_color() {
        let img = HdrImage::filled(Shape::new(2, 2, 3), 0.7);
        let err = compute_metric(&img, &img, Metric::L1, 0.01).unwrap();
        let fc = falsecolor(&err, Clip::default(), 0.01);
        assert!(fc.pixels().all(|p| p.0 == viridis(0.0)));
    }

    #[test]
    fn output_dimensions_follow_error_map() {
        let img = HdrImage::filled(Shape::new(5, 7, 3), 0.2);
        let err = compute_metric(&img, &img, Metric::L1, 0.01).unwrap();
        let fc = falsecolor(&err, Clip::default(), 0.01);
        assert_eq!((fc.width(), fc.height()), (7, 5));
    }

    #[test]
    fn normalization_includes_epsilon() {
        let clip = Clip::new(0.0, 1.0);
        assert!((clip.normalize(0.5, 0.01) - 0.5 / 1.01).abs() < 1e-12);
    }

    #[test]
    fn degenerate_clip_stays_finite() {
        let clip = Clip::new(0.5, 0.5);
        assert!((clip.normalize(0.5, 0.01)).abs() < 1e-12);
        assert!((clip.normalize(0.6, 0.01) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn channels_are_averaged_before_mapping() {
        // One pixel with channel errors 0, 0.5, 1.0 -> mean 0.5.
        let reference = HdrImage::new(Shape::new(1, 1, 3), vec![0.0, 0.5, 1.0]).unwrap();
        let test = HdrImage::filled(Shape::new(1, 1, 3), 0.0);
        let err = compute_metric(&reference, &test, Metric::L1, 0.0).unwrap();
        let fc = falsecolor(&err, Clip::default(), 0.0);
        assert_eq!(fc.get_pixel(0, 0).0, viridis(0.5));
    }

    #[test]
    fn negpos_polarity() {
        let reference = HdrImage::new(Shape::new(1, 3, 1), vec![1.0, 0.0, 0.5]).unwrap();
        let test = HdrImage::new(Shape::new(1, 3, 1), vec![0.0, 1.0, 0.5]).unwrap();
        let np = falsecolor_np(&reference, &test, 0.0).unwrap();
        // Test darker than reference: full red.
        assert_eq!(np.get_pixel(0, 0).0, [1.0, 0.0, 0.0, 1.0]);
        // Test brighter than reference: full green.
        assert_eq!(np.get_pixel(1, 0).0, [0.0, 1.0, 0.0, 1.0]);
        // Identical: black.
        assert_eq!(np.get_pixel(2, 0).0, [0.0, 0.0, 0.0, 1.0]);
        assert!(in_unit_range(&np));
    }

    #[test]
    fn negpos_rejects_shape_mismatch() {
        let a = HdrImage::filled(Shape::new(1, 3, 3), 0.0);
        let b = HdrImage::filled(Shape::new(3, 1, 3), 0.0);
        assert!(matches!(
            falsecolor_np(&a, &b, 0.01),
            Err(MetricError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn to_rgba8_quantizes() {
        let img = Rgba32FImage::from_fn(1, 1, |_, _| image::Rgba([0.0, 0.5, 1.0, 2.0]));
        assert_eq!(to_rgba8(&img).get_pixel(0, 0).0, [0, 128, 255, 255]);
    }
}
