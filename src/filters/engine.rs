use image::{imageops, RgbaImage};
use tracing::debug;

use crate::error::Result;
use crate::filters::kernel::{self, CONTOUR, DETAIL, EDGE_ENHANCE, EMBOSS};
use crate::filters::params::{FilterParams, Rotation};
use crate::filters::{enhance, tone};

/// Apply every enabled adjustment in `params` to `image`
///
/// The stage order is fixed and matters for the result:
///
/// 1. rotation (canvas grows to the rotated bounds)
/// 2. brightness, contrast, saturation, sharpness
/// 3. grayscale
/// 4. invert
/// 5. sepia
/// 6. gaussian blur
/// 7. emboss, contour, detail, edge enhance
/// 8. posterize
/// 9. solarize
///
/// Stages at their neutral value are skipped entirely, so
/// `FilterParams::default()` returns a pixel-identical copy.
pub fn apply_filters(image: &RgbaImage, params: &FilterParams) -> Result<RgbaImage> {
    params.validate()?;

    let mut img = image.clone();
    if params.is_identity() {
        return Ok(img);
    }

    img = match params.rotation {
        Rotation::None => img,
        Rotation::Cw90 => imageops::rotate90(&img),
        Rotation::Cw180 => imageops::rotate180(&img),
        Rotation::Cw270 => imageops::rotate270(&img),
    };

    if params.brightness != 1.0 {
        img = enhance::brightness(&img, params.brightness);
    }
    if params.contrast != 1.0 {
        img = enhance::contrast(&img, params.contrast);
    }
    if params.saturation != 1.0 {
        img = enhance::saturation(&img, params.saturation);
    }
    if params.sharpness != 1.0 {
        img = enhance::sharpness(&img, params.sharpness);
    }

    if params.grayscale {
        img = enhance::grayscale(&img);
    }
    if params.invert {
        img = tone::invert(&img);
    }
    if params.sepia {
        img = tone::sepia(&img);
    }

    if params.blur > 0.0 {
        img = imageops::blur(&img, params.blur);
    }

    let kernels = [
        (params.emboss, &EMBOSS),
        (params.contour, &CONTOUR),
        (params.detail, &DETAIL),
        (params.edge_enhance, &EDGE_ENHANCE),
    ];
    for (enabled, k) in kernels {
        if enabled {
            debug!("Applying {} kernel", k.name);
            img = kernel::convolve(&img, k);
        }
    }

    if let Some(bits) = params.posterize {
        img = tone::posterize(&img, bits);
    }
    if let Some(threshold) = params.solarize {
        // validated to 0-255 above
        img = tone::solarize(&img, threshold as u8);
    }

    Ok(img)
}
