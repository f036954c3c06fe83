//! Perceptually uniform colormap for error heatmaps.
//!
//! Viridis as a 256-entry lookup table: `t` in `[0, 1]` selects bin
//! `floor(t * 256)`, with `t = 1` falling into the last bin. Dark purple
//! marks low error, yellow marks high error.

/// Number of discrete colormap entries.
pub const VIRIDIS_LEVELS: usize = 256;

/// Map `t` to an RGBA color with components in `[0, 1]`.
///
/// `t` is clamped to `[0, 1]` first; `NaN` maps to the lowest color.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn viridis(t: f64) -> [f32; 4] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let bin = ((t * VIRIDIS_LEVELS as f64) as usize).min(VIRIDIS_LEVELS - 1);
    let color = colorous::VIRIDIS.eval_rational(bin, VIRIDIS_LEVELS);
    [
        f32::from(color.r) / 255.0,
        f32::from(color.g) / 255.0,
        f32::from(color.b) / 255.0,
        1.0,
    ]
}
