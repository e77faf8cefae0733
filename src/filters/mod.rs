//! # Filter Engine
//!
//! Pure per-image adjustments applied before an image is fitted to the
//! frame: rotation, enhancement factors, tone mappings, blur and 3x3
//! convolution effects.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reel_compositor::filters::{apply_filters, FilterParams};
//!
//! # fn main() -> anyhow::Result<()> {
//! let image = image::open("photo.jpg")?.to_rgba8();
//! let params = FilterParams { sepia: true, brightness: 1.2, ..Default::default() };
//! let filtered = apply_filters(&image, &params)?;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod enhance;
pub mod kernel;
pub mod params;
pub mod tone;

pub use engine::apply_filters;
pub use params::{FilterParams, Rotation};
