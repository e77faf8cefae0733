//! Fixed 3x3 convolution filters.
//!
//! Border pixels are copied through unchanged, only the interior is
//! convolved. Alpha is never touched.

use image::RgbaImage;

/// A 3x3 kernel with its divisor and the offset added after division
#[derive(Debug, Clone, Copy)]
pub struct Kernel3 {
    pub name: &'static str,
    pub weights: [i32; 9],
    pub scale: i32,
    pub offset: i32,
}

pub const SMOOTH: Kernel3 = Kernel3 {
    name: "smooth",
    weights: [1, 1, 1, 1, 5, 1, 1, 1, 1],
    scale: 13,
    offset: 0,
};

pub const EMBOSS: Kernel3 = Kernel3 {
    name: "emboss",
    weights: [-1, 0, 0, 0, 1, 0, 0, 0, 0],
    scale: 1,
    offset: 128,
};

pub const CONTOUR: Kernel3 = Kernel3 {
    name: "contour",
    weights: [-1, -1, -1, -1, 8, -1, -1, -1, -1],
    scale: 1,
    offset: 255,
};

pub const DETAIL: Kernel3 = Kernel3 {
    name: "detail",
    weights: [0, -1, 0, -1, 10, -1, 0, -1, 0],
    scale: 6,
    offset: 0,
};

pub const EDGE_ENHANCE: Kernel3 = Kernel3 {
    name: "edge_enhance",
    weights: [-1, -1, -1, -1, 10, -1, -1, -1, -1],
    scale: 2,
    offset: 0,
};

pub fn convolve(image: &RgbaImage, kernel: &Kernel3) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0i32; 3];
            for ky in 0..3u32 {
                for kx in 0..3u32 {
                    let weight = kernel.weights[(ky * 3 + kx) as usize];
                    if weight == 0 {
                        continue;
                    }
                    let src = image.get_pixel(x + kx - 1, y + ky - 1).0;
                    for c in 0..3 {
                        sums[c] += weight * src[c] as i32;
                    }
                }
            }

            let target = out.get_pixel_mut(x, y);
            for c in 0..3 {
                let value = sums[c] as f32 / kernel.scale as f32 + kernel.offset as f32;
                target.0[c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_kernels_preserve_flat_regions() {
        let flat = RgbaImage::from_pixel(5, 5, Rgba([90, 90, 90, 255]));
        // Weights summing to the scale leave flat areas alone
        assert_eq!(convolve(&flat, &SMOOTH), flat);
        assert_eq!(convolve(&flat, &DETAIL), flat);
        assert_eq!(convolve(&flat, &EDGE_ENHANCE).get_pixel(2, 2).0, [90, 90, 90, 255]);
    }

    #[test]
    fn test_contour_turns_flat_white() {
        let flat = RgbaImage::from_pixel(4, 4, Rgba([30, 60, 90, 255]));
        let out = convolve(&flat, &CONTOUR);
        assert_eq!(out.get_pixel(1, 1).0, [255, 255, 255, 255]);
        // border untouched
        assert_eq!(out.get_pixel(0, 0).0, [30, 60, 90, 255]);
    }

    #[test]
    fn test_emboss_flat_is_mid_gray() {
        let flat = RgbaImage::from_pixel(3, 3, Rgba([200, 10, 70, 128]));
        assert_eq!(convolve(&flat, &EMBOSS).get_pixel(1, 1).0, [128, 128, 128, 128]);
    }

    #[test]
    fn test_tiny_images_pass_through() {
        let tiny = RgbaImage::from_pixel(2, 7, Rgba([1, 2, 3, 4]));
        assert_eq!(convolve(&tiny, &CONTOUR), tiny);
    }
}
