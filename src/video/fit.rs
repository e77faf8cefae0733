use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};
use crate::video::types::Color;

/// How an image of arbitrary aspect ratio is mapped onto the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMethod {
    /// Scale to fit inside the frame and pad with the background color
    #[default]
    Contain,
    /// Scale to fill the frame and center-crop the overflow
    Cover,
    /// Resample straight to the frame size, ignoring aspect ratio
    Stretch,
}

/// Resize `image` to exactly `target` (width, height)
///
/// All crop rectangles, sizes and offsets are computed in integer
/// arithmetic and rounded down, so identical inputs always land on
/// identical pixels.
pub fn fit(
    image: &RgbaImage,
    target: (u32, u32),
    method: FitMethod,
    background: Color,
) -> Result<RgbaImage> {
    let (tw, th) = target;
    if tw == 0 || th == 0 {
        return Err(ReelError::invalid(
            "settings.resolution",
            format!("must be positive, got {}x{}", tw, th),
        ));
    }

    let (iw, ih) = image.dimensions();
    if iw == 0 || ih == 0 {
        return Err(ReelError::invalid("image", "source image has no pixels"));
    }

    let fitted = match method {
        FitMethod::Stretch => resample(image, tw, th),
        FitMethod::Cover => {
            let (left, top, cw, ch) = cover_crop((iw, ih), target);
            let cropped = imageops::crop_imm(image, left, top, cw, ch).to_image();
            resample(&cropped, tw, th)
        }
        FitMethod::Contain => {
            let (nw, nh) = contain_size((iw, ih), target);
            let scaled = resample(image, nw, nh);
            let mut canvas = RgbaImage::from_pixel(tw, th, Rgba(background.0));
            let left = (tw - nw) / 2;
            let top = (th - nh) / 2;
            imageops::replace(&mut canvas, &scaled, left as i64, top as i64);
            canvas
        }
    };

    Ok(fitted)
}

/// Centered source rectangle (left, top, width, height) with the target's
/// aspect ratio
///
/// Cropping first keeps the intermediate buffer no larger than the source,
/// whatever the aspect ratios involved.
fn cover_crop((iw, ih): (u32, u32), (tw, th): (u32, u32)) -> (u32, u32, u32, u32) {
    let (iw64, ih64, tw64, th64) = (iw as u64, ih as u64, tw as u64, th as u64);
    if iw64 * th64 > tw64 * ih64 {
        // wider than the target: keep full height
        let cw = u32::try_from(ih64 * tw64 / th64).unwrap_or(iw).clamp(1, iw);
        ((iw - cw) / 2, 0, cw, ih)
    } else {
        let ch = u32::try_from(iw64 * th64 / tw64).unwrap_or(ih).clamp(1, ih);
        (0, (ih - ch) / 2, iw, ch)
    }
}

/// Largest uniform scale that fits inside the target on both axes
fn contain_size((iw, ih): (u32, u32), (tw, th): (u32, u32)) -> (u32, u32) {
    let (iw, ih, tw64, th64) = (iw as u64, ih as u64, tw as u64, th as u64);
    if iw * th64 > tw64 * ih {
        // wider than the target: match width
        let nh = u32::try_from(ih * tw64 / iw).unwrap_or(th);
        (tw, nh.clamp(1, th))
    } else {
        let nw = u32::try_from(iw * th64 / ih).unwrap_or(tw);
        (nw.clamp(1, tw), th)
    }
}

fn resample(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Color = Color([0, 0, 255, 255]);

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, RED)
    }

    #[test]
    fn test_every_method_hits_target_size() {
        let sources = [(1, 1), (7, 3), (3, 7), (640, 480), (1080, 1920), (1921, 1079)];
        let targets = [(1, 1), (9, 16), (1080, 1920), (100, 100), (33, 17)];
        let methods = [FitMethod::Contain, FitMethod::Cover, FitMethod::Stretch];

        for &(w, h) in &sources {
            let image = solid(w, h);
            for &target in &targets {
                for &method in &methods {
                    let out = fit(&image, target, method, BLUE).unwrap();
                    assert_eq!(out.dimensions(), target, "{w}x{h} -> {target:?} via {method:?}");
                }
            }
        }
    }

    #[test]
    fn test_cover_never_pads() {
        for (w, h) in [(400, 100), (100, 400), (333, 250)] {
            let out = fit(&solid(w, h), (90, 160), FitMethod::Cover, BLUE).unwrap();
            let (tw, th) = out.dimensions();
            for x in 0..tw {
                assert_ne!(out.get_pixel(x, 0).0, BLUE.0);
                assert_ne!(out.get_pixel(x, th - 1).0, BLUE.0);
            }
            for y in 0..th {
                assert_ne!(out.get_pixel(0, y).0, BLUE.0);
                assert_ne!(out.get_pixel(tw - 1, y).0, BLUE.0);
            }
        }
    }

    #[test]
    fn test_contain_letterboxes_wide_image() {
        // 2:1 image into a 100x100 frame -> 100x50 band centered vertically
        let out = fit(&solid(200, 100), (100, 100), FitMethod::Contain, BLUE).unwrap();
        assert_eq!(out.get_pixel(50, 0).0, BLUE.0);
        assert_eq!(out.get_pixel(50, 24).0, BLUE.0);
        assert_eq!(out.get_pixel(50, 25).0, RED.0);
        assert_eq!(out.get_pixel(50, 74).0, RED.0);
        assert_eq!(out.get_pixel(50, 75).0, BLUE.0);
    }

    #[test]
    fn test_contain_keeps_marked_corners() {
        // Distinct corner blocks must all survive: nothing is cropped
        let mut image = RgbaImage::from_pixel(60, 20, Rgba([128, 128, 128, 255]));
        for (cx, cy) in [(0, 0), (50, 0), (0, 10), (50, 10)] {
            for y in cy..cy + 10 {
                for x in cx..cx + 10 {
                    image.put_pixel(x, y, Rgba([0, 255, 0, 255]));
                }
            }
        }
        let out = fit(&image, (30, 30), FitMethod::Contain, BLUE).unwrap();
        // 60x20 -> 30x10, placed at y = 10
        for (x, y) in [(1, 11), (28, 11), (1, 18), (28, 18)] {
            let px = out.get_pixel(x, y).0;
            assert!(px[1] > 200 && px[2] < 60, "corner at ({x},{y}) lost: {px:?}");
        }
    }

    #[test]
    fn test_fit_sizes_match_reference_math() {
        assert_eq!(cover_crop((1920, 1080), (1080, 1920)), (656, 0, 607, 1080));
        assert_eq!(cover_crop((1080, 1920), (1920, 1080)), (0, 656, 1080, 607));
        assert_eq!(cover_crop((1080, 1920), (1080, 1920)), (0, 0, 1080, 1920));
        assert_eq!(contain_size((1920, 1080), (1080, 1920)), (1080, 607));
        assert_eq!(contain_size((1080, 1920), (1920, 1080)), (607, 1080));
    }

    #[test]
    fn test_extreme_aspect_sources_fit_without_blowup() {
        let strip = solid(20_000, 1);
        for method in [FitMethod::Cover, FitMethod::Contain] {
            let out = fit(&strip, (1080, 1920), method, BLUE).unwrap();
            assert_eq!(out.dimensions(), (1080, 1920), "{method:?}");
        }
        let cover = fit(&strip, (1080, 1920), FitMethod::Cover, BLUE).unwrap();
        assert_eq!(cover.get_pixel(540, 960).0, RED.0);

        assert_eq!(cover_crop((3_000_000, 1), (1080, 1920)), (1_499_999, 0, 1, 1));
        assert_eq!(cover_crop((1, 3_000_000), (1920, 1080)), (0, 1_499_999, 1, 1));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let image = RgbaImage::from_fn(37, 23, |x, y| Rgba([(x * 7) as u8, (y * 11) as u8, 90, 255]));
        for method in [FitMethod::Contain, FitMethod::Cover, FitMethod::Stretch] {
            let a = fit(&image, (50, 80), method, BLUE).unwrap();
            let b = fit(&image, (50, 80), method, BLUE).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_zero_target_rejected() {
        let result = fit(&solid(4, 4), (0, 10), FitMethod::Cover, BLUE);
        assert!(matches!(result, Err(ReelError::InvalidParameter { .. })));
    }

    #[test]
    fn test_fit_method_names() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            fit: FitMethod,
        }
        let parsed: Wrapper = toml::from_str("fit = \"cover\"").unwrap();
        assert_eq!(parsed.fit, FitMethod::Cover);
    }
}
