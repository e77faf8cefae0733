//! Per-pixel tone mappings. All of them leave alpha alone.

use image::RgbaImage;

const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

pub fn invert(image: &RgbaImage) -> RgbaImage {
    map_channels(image, |c| 255 - c)
}

pub fn sepia(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let rgb = [pixel.0[0] as f32, pixel.0[1] as f32, pixel.0[2] as f32];
        for (c, row) in SEPIA.iter().enumerate() {
            let value = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2];
            pixel.0[c] = value.clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Keep the top `bits` bits of each channel
pub fn posterize(image: &RgbaImage, bits: u8) -> RgbaImage {
    let mask = !((1u16 << (8 - bits as u16)) - 1) as u8;
    map_channels(image, |c| c & mask)
}

/// Invert every channel value at or above `threshold`
pub fn solarize(image: &RgbaImage, threshold: u8) -> RgbaImage {
    map_channels(image, |c| if c < threshold { c } else { 255 - c })
}

fn map_channels<F: Fn(u8) -> u8>(image: &RgbaImage, f: F) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            pixel.0[c] = f(pixel.0[c]);
        }
    }
    out
}
