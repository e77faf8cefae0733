use std::fmt;
use std::str::FromStr;

use image::{ImageBuffer, Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// One fully composed output frame
///
/// Wraps an opaque RGB buffer at the render resolution. Everything that
/// reaches the encoder has already been flattened to this form.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb(color));
        Self { buffer }
    }

    /// Flatten an RGBA image onto an opaque background color
    pub fn flatten(image: &RgbaImage, background: Color) -> Self {
        let [br, bg, bb, _] = background.0;
        let buffer = ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
            let px = image.get_pixel(x, y).0;
            let a = px[3] as u32;
            let mix = |c: u8, b: u8| ((c as u32 * a + b as u32 * (255 - a) + 127) / 255) as u8;
            Rgb([mix(px[0], br), mix(px[1], bg), mix(px[2], bb)])
        });
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save_with_format(path, image::ImageFormat::Png)
    }
}

/// A frame paired with how long it stays on screen
#[derive(Clone, Debug)]
pub struct TimedFrame {
    pub frame: Frame,

    /// Seconds, always > 0
    pub duration: f64,
}

/// RGBA color parsed from `#RRGGBB`, `#RRGGBBAA`, `#RGB` or a basic name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const TRANSPARENT: Color = Color([0, 0, 0, 0]);
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let named = match s.trim().to_ascii_lowercase().as_str() {
            "white" => Some(Color::WHITE),
            "black" => Some(Color::BLACK),
            "red" => Some(Color([255, 0, 0, 255])),
            "green" => Some(Color([0, 128, 0, 255])),
            "blue" => Some(Color([0, 0, 255, 255])),
            "yellow" => Some(Color([255, 255, 0, 255])),
            "transparent" => Some(Color::TRANSPARENT),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let hex = s.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_string(),
            _ => return Err(format!("unrecognised color '{}'", s)),
        };

        let mut rgba = [255u8; 4];
        for (i, chunk) in expanded.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| format!("unrecognised color '{}'", s))?;
            rgba[i] = u8::from_str_radix(pair, 16).map_err(|_| format!("unrecognised color '{}'", s))?;
        }
        Ok(Color(rgba))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!("#000000".parse::<Color>().unwrap(), Color::BLACK);
        assert_eq!("#FF8000".parse::<Color>().unwrap(), Color([255, 128, 0, 255]));
        assert_eq!("ff800080".parse::<Color>().unwrap(), Color([255, 128, 0, 128]));
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
    }

    #[test]
    fn test_parse_named_colors() {
        assert_eq!("White".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("transparent".parse::<Color>().unwrap(), Color::TRANSPARENT);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("#12345".parse::<Color>().is_err());
        assert!("#GGHHII".parse::<Color>().is_err());
        assert!("mauve-ish".parse::<Color>().is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        let color = Color([10, 20, 30, 40]);
        assert_eq!(color.to_string(), "#0A141E28");
        assert_eq!(color.to_string().parse::<Color>().unwrap(), color);
        assert_eq!(Color::WHITE.to_string(), "#FFFFFF");
    }

    #[test]
    fn test_flatten_blends_over_background() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([200, 100, 50, 255]));
        image.put_pixel(1, 0, Rgba([200, 100, 50, 0]));

        let frame = Frame::flatten(&image, Color([0, 0, 255, 255]));
        assert_eq!(frame.get_pixel(0, 0), [200, 100, 50]);
        assert_eq!(frame.get_pixel(1, 0), [0, 0, 255]);
    }
}
