//! # Reel-Compositor
//!
//! Assemble short vertical videos ("reels") from still images.
//!
//! Each image gets its own filters, is fitted to the output resolution,
//! optionally captioned, and shown for its own duration. Background music
//! is trimmed, looped and leveled to match the video, and the result is
//! encoded through ffmpeg.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reel_compositor::{Config, RenderEngine, RenderJob};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let job = RenderJob::from_file("project.toml")?;
//! let engine = RenderEngine::new(Config::default());
//!
//! let output = engine
//!     .render(&job, "reel.mp4".as_ref(), &|p| println!("{:.0}%", p * 100.0))
//!     .await?;
//! println!("{} frames, {:.1}s", output.frame_count, output.duration);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`filters`] - Per-image adjustments in a fixed order
//! - [`video`] - Fit, captions, frame building and the encoder boundary
//! - [`audio`] - Decoding and reconciling background music
//! - [`composition`] - Timeline assembly and the render engine
//! - [`project`] - The render job and its TOML project format
//! - [`config`] - Tool configuration
//!
//! ## Custom Encoders
//!
//! Anything that can turn a frame list into a file can stand in for ffmpeg
//! by implementing [`FrameEncoder`](video::FrameEncoder):
//!
//! ```rust,no_run
//! use reel_compositor::video::{EncodeRequest, FrameEncoder};
//! use reel_compositor::Result;
//!
//! struct DryRun;
//!
//! impl FrameEncoder for DryRun {
//!     fn name(&self) -> &str {
//!         "dry-run"
//!     }
//!
//!     fn encode(&self, request: &EncodeRequest) -> Result<()> {
//!         println!("would encode {} frames", request.frame_count);
//!         Ok(())
//!     }
//! }
//! ```

pub mod audio;
pub mod composition;
pub mod config;
pub mod error;
pub mod filters;
pub mod project;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{RenderEngine, RenderOutput},
    config::Config,
    error::{ReelError, Result},
    filters::FilterParams,
    project::{AudioConfig, GlobalSettings, ImageEntry, ImageSource, RenderJob},
};
