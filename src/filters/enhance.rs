//! Factor-based enhancements: brightness, contrast, saturation, sharpness.
//!
//! Each one interpolates (or extrapolates) between the image and a
//! "degenerate" version of it: black, flat mean gray, grayscale, and a
//! smoothed copy respectively. A factor of 1.0 returns the image itself.

use image::{Rgba, RgbaImage};

use super::kernel::{self, SMOOTH};

/// ITU-R 601-2 luma in 16-bit fixed point, rounded
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Collapse to luminance, then re-expand so every pixel keeps three equal
/// color channels. Alpha is preserved.
pub fn grayscale(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let l = luma(r, g, b);
        *pixel = Rgba([l, l, l, a]);
    }
    out
}

pub fn brightness(image: &RgbaImage, factor: f32) -> RgbaImage {
    blend_towards(image, factor, |_| [0.0; 3])
}

pub fn contrast(image: &RgbaImage, factor: f32) -> RgbaImage {
    let mean = mean_luma(image);
    blend_towards(image, factor, |_| [mean; 3])
}

pub fn saturation(image: &RgbaImage, factor: f32) -> RgbaImage {
    blend_towards(image, factor, |px| {
        let l = luma(px[0], px[1], px[2]) as f32;
        [l; 3]
    })
}

pub fn sharpness(image: &RgbaImage, factor: f32) -> RgbaImage {
    let smoothed = kernel::convolve(image, &SMOOTH);
    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let degenerate = smoothed.get_pixel(x, y).0;
        let src = pixel.0;
        for c in 0..3 {
            pixel.0[c] = mix(degenerate[c] as f32, src[c], factor);
        }
    }
    out
}

/// Mean luma rounded to the nearest integer level
fn mean_luma(image: &RgbaImage) -> f32 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let total: u64 = image
        .pixels()
        .map(|p| luma(p.0[0], p.0[1], p.0[2]) as u64)
        .sum();
    (total as f64 / count as f64 + 0.5).floor() as f32
}

fn blend_towards<F>(image: &RgbaImage, factor: f32, degenerate: F) -> RgbaImage
where
    F: Fn(&[u8; 4]) -> [f32; 3],
{
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let src = pixel.0;
        let base = degenerate(&src);
        for c in 0..3 {
            pixel.0[c] = mix(base[c], src[c], factor);
        }
    }
    out
}

fn mix(base: f32, value: u8, factor: f32) -> u8 {
    (base + (value as f32 - base) * factor).round().clamp(0.0, 255.0) as u8
}
