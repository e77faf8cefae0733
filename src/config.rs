use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Tool configuration for the Reel-Compositor
///
/// This is separate from the per-render project: it describes how renders
/// are executed (encoder binary and codecs, worker threads, fonts), not
/// what is rendered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External encoder settings
    pub encoder: EncoderConfig,

    /// Frame construction settings
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.encoder.validate()?;
        self.render.validate()?;
        Ok(())
    }
}

/// Parameters handed to the external encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// ffmpeg executable (name on PATH or absolute path)
    pub ffmpeg_path: String,

    /// Container format passed to `-f`
    pub container: String,

    /// Video codec identifier
    pub video_codec: String,

    /// Audio codec identifier, used only when the render has audio
    pub audio_codec: String,

    /// Encoder speed preset
    pub preset: String,

    /// Parallelism hint for the encoder
    pub threads: usize,

    /// Output pixel format
    pub pixel_format: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            container: "mp4".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "ultrafast".to_string(),
            threads: 4,
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl EncoderConfig {
    fn validate(&self) -> Result<()> {
        let required = [
            ("encoder.ffmpeg_path", &self.ffmpeg_path),
            ("encoder.container", &self.container),
            ("encoder.video_codec", &self.video_codec),
            ("encoder.audio_codec", &self.audio_codec),
            ("encoder.preset", &self.preset),
            ("encoder.pixel_format", &self.pixel_format),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                }.into());
            }
        }

        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "encoder.threads".to_string(),
                value: self.threads.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Frame construction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Build frames on a worker pool instead of one by one
    pub parallel_frames: bool,

    /// Number of worker threads for frame construction
    pub processing_threads: usize,

    /// Font used by overlays that do not name their own
    pub default_font: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            parallel_frames: true,
            processing_threads: num_cpus::get(),
            default_font: None,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.processing_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.processing_threads".to_string(),
                value: self.processing_threads.to_string()
            }.into());
        }

        Ok(())
    }
}
