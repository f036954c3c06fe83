//! HDR to LDR conversion for web display.
//!
//! [`tonemap`] applies a plain gamma curve and clips to `[0, 1]` before
//! quantizing to 8 bits (truncating, like a `uint8` cast). No exposure
//! or filmic operator is applied, so the LDR previews of every test are
//! directly comparable.

use image::imageops::{self, FilterType};

use crate::types::{HdrImage, RgbaImage};

/// Display gamma used for LDR previews.
pub const DEFAULT_GAMMA: f64 = 2.2;

/// Width of the scene thumbnail.
pub const THUMBNAIL_WIDTH: u32 = 640;

/// Height of the scene thumbnail.
pub const THUMBNAIL_HEIGHT: u32 = 360;

/// Tonemap an HDR image to 8-bit RGBA.
///
/// Each value becomes `clip(v^(1/gamma), 0, 1) * 255`, truncated.
/// Single-channel images are replicated to gray; a fourth channel is
/// used as alpha; anything beyond is ignored. Negative and `NaN` values
/// map to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn tonemap(image: &HdrImage, gamma: f64) -> RgbaImage {
    let shape = image.shape();
    let inv_gamma = 1.0 / gamma;
    let pixels: Vec<[u8; 4]> = image
        .pixels()
        .map(|px| {
            let at = |c: usize| px.get(c).map_or(0, |&v| quantize(v, inv_gamma));
            match px.len() {
                0 => [0, 0, 0, 255],
                1 | 2 => {
                    let g = at(0);
                    [g, g, g, 255]
                }
                3 => [at(0), at(1), at(2), 255],
                _ => [at(0), at(1), at(2), at(3)],
            }
        })
        .collect();

    let width = shape.width;
    RgbaImage::from_fn(shape.width as u32, shape.height as u32, |x, y| {
        let idx = y as usize * width + x as usize;
        image::Rgba(pixels.get(idx).copied().unwrap_or([0, 0, 0, 255]))
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(value: f64, inv_gamma: f64) -> u8 {
    let v = value.powf(inv_gamma);
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

/// Build the scene thumbnail: the tonemapped reference scaled with a
/// bicubic filter to fit inside a black 640×360 canvas, centered.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn thumbnail(reference: &HdrImage) -> RgbaImage {
    let ldr = tonemap(reference, DEFAULT_GAMMA);
    let mut canvas = RgbaImage::from_pixel(
        THUMBNAIL_WIDTH,
        THUMBNAIL_HEIGHT,
        image::Rgba([0, 0, 0, 255]),
    );
    let (w, h) = (ldr.width(), ldr.height());
    if w == 0 || h == 0 {
        return canvas;
    }

    let ratio = (f64::from(THUMBNAIL_WIDTH) / f64::from(w))
        .min(f64::from(THUMBNAIL_HEIGHT) / f64::from(h));
    let scaled_w = ((f64::from(w) * ratio) as u32).clamp(1, THUMBNAIL_WIDTH);
    let scaled_h = ((f64::from(h) * ratio) as u32).clamp(1, THUMBNAIL_HEIGHT);
    let scaled = imageops::resize(&ldr, scaled_w, scaled_h, FilterType::CatmullRom);

    let x = i64::from((THUMBNAIL_WIDTH - scaled_w) / 2);
    let y = i64::from((THUMBNAIL_HEIGHT - scaled_h) / 2);
    imageops::overlay(&mut canvas, &scaled, x, y);
    canvas
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Shape;

    #[test]
    fn gamma_curve_and_truncation() {
        let img = HdrImage::new(Shape::new(1, 1, 3), vec![0.0, 0.25, 4.0]).unwrap();
        let ldr = tonemap(&img, 2.0);
        // sqrt(0.25) = 0.5 -> 127.5 truncated to 127; 4.0 clips to 255.
        assert_eq!(ldr.get_pixel(0, 0).0, [0, 127, 255, 255]);
    }

    #[test]
    fn negative_and_nan_values_map_to_black() {
        let img = HdrImage::new(Shape::new(1, 1, 3), vec![-1.0, f64::NAN, 0.0]).unwrap();
        assert_eq!(tonemap(&img, 2.2).get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn single_channel_is_gray() {
        let img = HdrImage::filled(Shape::new(2, 3, 1), 1.0);
        let ldr = tonemap(&img, 2.2);
        assert_eq!((ldr.width(), ldr.height()), (3, 2));
        assert!(ldr.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn thumbnail_has_fixed_size() {
        let wide = HdrImage::filled(Shape::new(100, 400, 3), 1.0);
        let thumb = thumbnail(&wide);
        assert_eq!((thumb.width(), thumb.height()), (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT));
        // 400x100 scales to 640x160: centered vertically, bars above and below.
        assert_eq!(thumb.get_pixel(320, 0).0, [0, 0, 0, 255]);
        assert!(thumb.get_pixel(320, 180).0[..3].iter().all(|&v| v >= 250));
    }

    #[test]
    fn tall_thumbnail_is_pillarboxed() {
        let tall = HdrImage::filled(Shape::new(400, 100, 3), 1.0);
        let thumb = thumbnail(&tall);
        // 100x400 scales to 90x360: bars left and right.
        assert_eq!(thumb.get_pixel(0, 180).0, [0, 0, 0, 255]);
        assert!(thumb.get_pixel(320, 180).0[..3].iter().all(|&v| v >= 250));
    }
}
