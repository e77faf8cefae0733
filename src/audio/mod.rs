//! # Audio Track Reconciliation
//!
//! Decodes the background music (WAV through hound, compressed formats
//! through symphonia) and fits it to the video's length.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reel_compositor::audio::load_and_reconcile;
//! use reel_compositor::project::AudioConfig;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = AudioConfig { loop_enabled: true, ..AudioConfig::from_source("song.mp3") };
//! if let Some(track) = load_and_reconcile(Some(&config), 12.5).await? {
//!     println!("{:.2}s of audio, looped: {}", track.duration(), track.looped);
//! }
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod reconciler;
pub mod types;

pub use loader::AudioLoader;
pub use reconciler::{load_and_reconcile, reconcile, AudioTrack};
pub use types::{AudioData, AudioFormat};
