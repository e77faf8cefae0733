//! # Composition
//!
//! Turns a [`RenderJob`](crate::project::RenderJob) into a video: frames are
//! assembled in timeline order, audio is reconciled to the video length,
//! and the encoder produces the output file.

pub mod engine;
pub mod timeline;

pub use engine::{AudioSummary, RenderEngine, RenderOutput};
pub use timeline::{assemble, Timeline};
