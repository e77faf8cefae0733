use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use tracing::{debug, warn};

/// Fonts tried when neither the overlay nor the configuration names one
const SYSTEM_FONT_CANDIDATES: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// A laid-out glyph with its coverage bitmap, in layout coordinates
/// (origin at the top-left of the first line, y growing downwards)
#[derive(Debug, Clone)]
pub struct PlacedGlyph {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<u8>,
}

/// A face text can be drawn with
pub enum TextFace {
    /// A TrueType/OpenType font rasterized at the requested pixel size
    Outline(Font),
    /// Built-in 5x7 bitmap face, scaled in whole pixels; always available
    Builtin,
}

impl TextFace {
    /// Parse a font file
    pub fn from_file(path: &Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        match Font::from_bytes(bytes, FontSettings::default()) {
            Ok(font) => Some(TextFace::Outline(font)),
            Err(e) => {
                warn!("Font {:?} could not be parsed: {}", path, e);
                None
            }
        }
    }

    /// Lay out `text` at `px` pixels and rasterize every visible glyph
    pub fn layout(&self, text: &str, px: f32) -> Vec<PlacedGlyph> {
        match self {
            TextFace::Outline(font) => layout_outline(font, text, px),
            TextFace::Builtin => layout_builtin(text, px),
        }
    }
}

fn layout_outline(font: &Font, text: &str, px: f32) -> Vec<PlacedGlyph> {
    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings {
        x: 0.0,
        y: 0.0,
        ..LayoutSettings::default()
    });
    layout.append(&[font], &TextStyle::new(text, px, 0));

    layout
        .glyphs()
        .iter()
        .filter(|glyph| glyph.width > 0 && glyph.height > 0)
        .map(|glyph| {
            let (_, coverage) = font.rasterize_config(glyph.key);
            PlacedGlyph {
                x: glyph.x.round() as i32,
                y: glyph.y.round() as i32,
                width: glyph.width,
                height: glyph.height,
                coverage,
            }
        })
        .collect()
}

fn layout_builtin(text: &str, px: f32) -> Vec<PlacedGlyph> {
    let scale = ((px / 8.0).round() as usize).max(1);
    let mut glyphs = Vec::new();

    for (line_index, line) in text.lines().enumerate() {
        for (column, ch) in line.chars().enumerate() {
            let Some(rows) = builtin_glyph(ch) else {
                continue;
            };

            let width = 5 * scale;
            let height = 7 * scale;
            let mut coverage = vec![0u8; width * height];
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..5 {
                    if bits & (0x10 >> col) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            coverage[(row * scale + sy) * width + col * scale + sx] = 255;
                        }
                    }
                }
            }

            glyphs.push(PlacedGlyph {
                x: (column * 6 * scale) as i32,
                y: (line_index * 9 * scale) as i32,
                width,
                height,
                coverage,
            });
        }
    }

    glyphs
}

/// Rows of a 5x7 glyph, bit 4 is the leftmost column. `None` for blanks.
fn builtin_glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch.to_ascii_uppercase() {
        ' ' | '\t' => return None,
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '\'' => [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        // '?' doubles as the replacement glyph
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    };
    Some(rows)
}

/// Resolves and caches the faces overlays ask for
///
/// Lookup order: the overlay's own font, the configured default font,
/// common system fonts, then the built-in bitmap face. A missing font is
/// logged and substituted, it never fails a render.
pub struct FontBook {
    default_font: Option<PathBuf>,
    cache: Mutex<HashMap<Option<PathBuf>, Arc<TextFace>>>,
}

impl FontBook {
    pub fn new(default_font: Option<PathBuf>) -> Self {
        Self {
            default_font,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, requested: Option<&Path>) -> Arc<TextFace> {
        let key = requested.map(Path::to_path_buf);
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(face) = cache.get(&key) {
            return Arc::clone(face);
        }

        let face = Arc::new(self.load(requested));
        cache.insert(key, Arc::clone(&face));
        face
    }

    fn load(&self, requested: Option<&Path>) -> TextFace {
        for path in requested.into_iter().chain(self.default_font.as_deref()) {
            if let Some(face) = TextFace::from_file(path) {
                debug!("Using font {:?}", path);
                return face;
            }
            warn!("Font {:?} is unavailable, falling back", path);
        }

        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if path.is_file() {
                if let Some(face) = TextFace::from_file(path) {
                    debug!("Using system font {:?}", path);
                    return face;
                }
            }
        }

        warn!("No usable font found, using the built-in bitmap face");
        TextFace::Builtin
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_layout_advances_and_scales() {
        let glyphs = TextFace::Builtin.layout("AB", 16.0);
        assert_eq!(glyphs.len(), 2);
        assert_eq!((glyphs[0].width, glyphs[0].height), (10, 14));
        assert_eq!(glyphs[1].x, 12);
        assert!(glyphs[0].coverage.iter().any(|&c| c == 255));
    }

    #[test]
    fn test_builtin_skips_spaces_and_breaks_lines() {
        let glyphs = TextFace::Builtin.layout("A B\nC", 8.0);
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[1].x, 12);
        assert_eq!((glyphs[2].x, glyphs[2].y), (0, 9));
    }

    #[test]
    fn test_unknown_characters_get_replacement_glyph() {
        assert_eq!(builtin_glyph('~'), builtin_glyph('?'));
        assert_eq!(builtin_glyph('a'), builtin_glyph('A'));
    }

    #[test]
    fn test_missing_font_falls_back() {
        let book = FontBook::new(Some(PathBuf::from("/nope/missing-default.ttf")));
        let face = book.resolve(Some(Path::new("/nope/missing.ttf")));
        // Whatever it resolves to, it must be able to draw text
        assert!(!face.layout("Hi", 24.0).is_empty());
    }

    #[test]
    fn test_resolve_is_cached() {
        let book = FontBook::default();
        let a = book.resolve(None);
        let b = book.resolve(None);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
