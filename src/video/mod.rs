//! # Frame Construction and Encoding
//!
//! Everything between a decoded still image and the encoder: fitting to
//! the output resolution, caption rasterization, per-entry frame building
//! and the ffmpeg boundary.

pub mod builder;
pub mod encoder;
pub mod fit;
pub mod font;
pub mod text;
pub mod types;

pub use builder::build_frame;
pub use encoder::{EncodeRequest, FfmpegEncoder, FrameEncoder};
pub use fit::{fit, FitMethod};
pub use font::{FontBook, TextFace};
pub use text::{composite_over, rasterize_text, Alignment, TextOverlay};
pub use types::{Color, Frame, TimedFrame};
