use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::video::font::{PlacedGlyph, TextFace};
use crate::video::types::Color;

/// Caption drawn over one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOverlay {
    pub text: String,

    /// Font size in points, rendered 1pt = 1px
    #[serde(alias = "fontsize")]
    pub font_size: u32,

    pub color: Color,

    #[serde(alias = "align")]
    pub alignment: Alignment,

    /// Font file for this overlay; falls back when missing
    pub font: Option<PathBuf>,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 50,
            color: Color::WHITE,
            alignment: Alignment::Center,
            font: None,
        }
    }
}

impl TextOverlay {
    /// Whether this overlay produces a layer at all
    pub fn is_visible(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Vertical placement of the caption; it is always centered horizontally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Ink box centered on the frame
    #[default]
    Center,
    /// Line top at 10% of the frame height
    Top,
    /// Line top at 80% of the frame height
    Bottom,
}

/// Render `text` onto a fully transparent layer of `target` size
///
/// The measured ink box of the laid-out glyphs drives placement, so
/// centering follows the real font metrics.
pub fn rasterize_text(
    text: &str,
    font_size: u32,
    color: Color,
    target: (u32, u32),
    alignment: Alignment,
    face: &TextFace,
) -> RgbaImage {
    let (width, height) = target;
    let mut layer = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    if text.trim().is_empty() || font_size == 0 {
        return layer;
    }

    let glyphs = face.layout(text, font_size as f32);
    let Some((min_x, min_y, max_x, max_y)) = ink_bounds(&glyphs) else {
        return layer;
    };
    let ink_w = max_x - min_x;
    let ink_h = max_y - min_y;

    let dx = (width as i32 - ink_w).div_euclid(2) - min_x;
    let dy = match alignment {
        Alignment::Top => (height as f32 * 0.1).round() as i32,
        Alignment::Bottom => (height as f32 * 0.8).round() as i32,
        Alignment::Center => (height as i32 - ink_h).div_euclid(2) - min_y,
    };

    let [r, g, b, a] = color.0;
    for glyph in &glyphs {
        for gy in 0..glyph.height {
            let y = glyph.y + dy + gy as i32;
            if y < 0 || y >= height as i32 {
                continue;
            }
            for gx in 0..glyph.width {
                let x = glyph.x + dx + gx as i32;
                if x < 0 || x >= width as i32 {
                    continue;
                }
                let coverage = glyph.coverage[gy * glyph.width + gx] as u32;
                if coverage == 0 {
                    continue;
                }
                let alpha = ((coverage * a as u32 + 127) / 255) as u8;
                let pixel = layer.get_pixel_mut(x as u32, y as u32);
                if alpha > pixel.0[3] {
                    *pixel = Rgba([r, g, b, alpha]);
                }
            }
        }
    }

    layer
}

/// Alpha-over `layer` onto `base`, both the same size
pub fn composite_over(base: &mut RgbaImage, layer: &RgbaImage) {
    for (dst, src) in base.pixels_mut().zip(layer.pixels()) {
        let sa = src.0[3] as u32;
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            *dst = *src;
            continue;
        }
        let da = dst.0[3] as u32;
        let out_a = sa * 255 + da * (255 - sa);
        for c in 0..3 {
            let value = src.0[c] as u32 * sa * 255 + dst.0[c] as u32 * da * (255 - sa);
            dst.0[c] = ((value + out_a / 2) / out_a.max(1)) as u8;
        }
        dst.0[3] = ((out_a + 127) / 255) as u8;
    }
}

/// Tight box around every non-zero coverage sample, in layout coordinates
fn ink_bounds(glyphs: &[PlacedGlyph]) -> Option<(i32, i32, i32, i32)> {
    let mut bounds: Option<(i32, i32, i32, i32)> = None;
    for glyph in glyphs {
        for gy in 0..glyph.height {
            let row = &glyph.coverage[gy * glyph.width..(gy + 1) * glyph.width];
            let Some(first) = row.iter().position(|&c| c > 0) else {
                continue;
            };
            let last = row.iter().rposition(|&c| c > 0).unwrap_or(first);
            let (x0, x1) = (glyph.x + first as i32, glyph.x + last as i32 + 1);
            let (y0, y1) = (glyph.y + gy as i32, glyph.y + gy as i32 + 1);
            bounds = Some(match bounds {
                None => (x0, y0, x1, y1),
                Some((a, b, c, d)) => (a.min(x0), b.min(y0), c.max(x1), d.max(y1)),
            });
        }
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_box(layer: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, p) in layer.enumerate_pixels() {
            if p.0[3] == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x + 1, y + 1),
                Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x + 1), d.max(y + 1)),
            });
        }
        bounds
    }

    #[test]
    fn test_empty_text_is_fully_transparent() {
        let layer = rasterize_text("   ", 40, Color::WHITE, (64, 32), Alignment::Center, &TextFace::Builtin);
        assert_eq!(layer.dimensions(), (64, 32));
        assert!(layer.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_builtin_center_alignment_is_exact() {
        // "HI" at scale 2: inked area is 20x14, so 100x60 leaves 40 px each side and 23 px above
        let layer = rasterize_text("HI", 16, Color::WHITE, (100, 60), Alignment::Center, &TextFace::Builtin);
        assert_eq!(ink_box(&layer), Some((40, 23, 60, 37)));
    }

    #[test]
    fn test_top_and_bottom_anchor_line_top() {
        let top = rasterize_text("T", 8, Color::WHITE, (50, 200), Alignment::Top, &TextFace::Builtin);
        assert_eq!(ink_box(&top).map(|b| b.1), Some(20));

        let bottom = rasterize_text("T", 8, Color::WHITE, (50, 200), Alignment::Bottom, &TextFace::Builtin);
        assert_eq!(ink_box(&bottom).map(|b| b.1), Some(160));
    }

    #[test]
    fn test_text_takes_overlay_color() {
        let color = Color([10, 200, 30, 255]);
        let layer = rasterize_text("X", 8, color, (20, 20), Alignment::Center, &TextFace::Builtin);
        let inked: Vec<_> = layer.pixels().filter(|p| p.0[3] > 0).collect();
        assert!(!inked.is_empty());
        assert!(inked.iter().all(|p| p.0 == [10, 200, 30, 255]));
    }

    #[test]
    fn test_text_is_horizontally_centered_with_any_face() {
        let book = crate::video::font::FontBook::default();
        let face = book.resolve(None);
        let layer = rasterize_text("Reel", 40, Color::WHITE, (400, 200), Alignment::Center, &face);
        let (x0, _, x1, _) = ink_box(&layer).expect("text should leave ink");
        let left = x0 as i32;
        let right = 400 - x1 as i32;
        assert!((left - right).abs() <= 2, "left margin {left}, right margin {right}");
    }

    #[test]
    fn test_oversized_text_is_clipped_not_panicking() {
        let layer = rasterize_text("WIDE TEXT", 80, Color::WHITE, (30, 10), Alignment::Bottom, &TextFace::Builtin);
        assert_eq!(layer.dimensions(), (30, 10));
    }

    #[test]
    fn test_composite_over_opaque_base() {
        let mut base = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        let mut layer = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        layer.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        layer.put_pixel(1, 0, Rgba([255, 255, 255, 128]));

        composite_over(&mut base, &layer);
        assert_eq!(base.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(base.get_pixel(1, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn test_overlay_defaults_from_toml() {
        let overlay: TextOverlay = toml::from_str("text = \"Hello\"\nalign = \"bottom\"\n").unwrap();
        assert_eq!(overlay.font_size, 50);
        assert_eq!(overlay.color, Color::WHITE);
        assert_eq!(overlay.alignment, Alignment::Bottom);
        assert!(overlay.is_visible());
    }
}
