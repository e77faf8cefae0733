//! # Render Projects
//!
//! A [`RenderJob`] is everything one render needs: the ordered images with
//! their filters, durations and captions, the shared frame settings, and
//! the optional background audio. It is built once per render (in code or
//! from a TOML project file) and only read by the pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, RgbaImage};
use serde::Deserialize;

use crate::error::{ConfigError, ReelError, Result};
use crate::filters::FilterParams;
use crate::video::fit::FitMethod;
use crate::video::text::TextOverlay;
use crate::video::types::Color;

/// One render's worth of input
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderJob {
    /// Timeline order is the order of this list
    #[serde(default)]
    pub images: Vec<ImageEntry>,

    #[serde(default)]
    pub settings: GlobalSettings,

    /// `None` renders a silent video
    #[serde(default)]
    pub audio: Option<AudioConfig>,
}

impl RenderJob {
    pub fn new(images: Vec<ImageEntry>, settings: GlobalSettings, audio: Option<AudioConfig>) -> Self {
        Self { images, settings, audio }
    }

    /// Load a project from a TOML file. Relative asset paths are resolved
    /// against the directory holding the project file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let mut job: RenderJob = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if let Some(base) = path.parent() {
            job.resolve_paths(base);
        }
        Ok(job)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        for entry in &mut self.images {
            if let ImageSource::Path(p) = &mut entry.source {
                resolve(p);
            }
            if let Some(font) = entry.text.as_mut().and_then(|t| t.font.as_mut()) {
                resolve(font);
            }
        }
        if let Some(source) = self.audio.as_mut().and_then(|a| a.source.as_mut()) {
            resolve(source);
        }
    }

    /// Check every documented range before any expensive work starts
    pub fn validate(&self) -> Result<()> {
        if self.images.is_empty() {
            return Err(ReelError::EmptyProject);
        }

        self.settings.validate()?;

        for (index, entry) in self.images.iter().enumerate() {
            entry.validate().map_err(|e| e.within(&format!("image[{}]", index)))?;
        }

        if let Some(audio) = &self.audio {
            audio.validate()?;
        }

        Ok(())
    }

    /// Sum of all entry durations in seconds
    pub fn total_duration(&self) -> f64 {
        self.images.iter().map(|entry| entry.duration).sum()
    }
}

/// One still image on the timeline
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageEntry {
    pub source: ImageSource,

    #[serde(default)]
    pub filters: FilterParams,

    /// Seconds on screen, must be > 0
    #[serde(default = "default_duration")]
    pub duration: f64,

    /// Caption; absent or empty text draws nothing
    #[serde(default, alias = "text_overlay")]
    pub text: Option<TextOverlay>,
}

fn default_duration() -> f64 {
    3.0
}

impl ImageEntry {
    pub fn new(source: ImageSource, duration: f64) -> Self {
        Self {
            source,
            filters: FilterParams::default(),
            duration,
            text: None,
        }
    }

    pub fn with_filters(mut self, filters: FilterParams) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_text(mut self, text: TextOverlay) -> Self {
        self.text = Some(text);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ReelError::invalid(
                "duration",
                format!("must be > 0 seconds, got {}", self.duration),
            ));
        }
        self.filters.validate()
    }
}

/// Where an entry's pixels come from
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    /// Image file on disk
    Path(PathBuf),

    /// Encoded PNG/JPEG bytes
    #[serde(skip)]
    Encoded(Arc<[u8]>),

    /// Already decoded pixels
    #[serde(skip)]
    Pixels(Arc<RgbaImage>),
}

impl ImageSource {
    /// Short label for logs and errors
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Encoded(bytes) => format!("<{} encoded bytes>", bytes.len()),
            ImageSource::Pixels(image) => format!("<{}x{} pixels>", image.width(), image.height()),
        }
    }

    /// Decode to RGBA with the alpha channel discarded (every pixel opaque)
    pub fn load(&self) -> std::result::Result<RgbaImage, String> {
        let decoded = match self {
            ImageSource::Path(path) => image::open(path).map_err(|e| e.to_string())?,
            ImageSource::Encoded(bytes) => image::load_from_memory(bytes).map_err(|e| e.to_string())?,
            ImageSource::Pixels(image) => DynamicImage::ImageRgba8(image.as_ref().clone()),
        };
        Ok(DynamicImage::ImageRgb8(decoded.to_rgb8()).to_rgba8())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

impl From<RgbaImage> for ImageSource {
    fn from(image: RgbaImage) -> Self {
        ImageSource::Pixels(Arc::new(image))
    }
}

/// Settings shared by every frame of one render
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalSettings {
    /// Output (width, height) in pixels
    pub resolution: (u32, u32),

    /// Output frame rate, typically 24, 30 or 60
    pub fps: u32,

    /// Padding color for `contain`
    #[serde(alias = "bg_color")]
    pub background: Color,

    #[serde(alias = "fit_method")]
    pub fit: FitMethod,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            resolution: (1080, 1920),
            fps: 30,
            background: Color::BLACK,
            fit: FitMethod::Contain,
        }
    }
}

impl GlobalSettings {
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.resolution;
        if width == 0 || height == 0 {
            return Err(ReelError::invalid(
                "settings.resolution",
                format!("must be positive, got {}x{}", width, height),
            ));
        }
        if self.fps == 0 {
            return Err(ReelError::invalid("settings.fps", "must be > 0"));
        }
        Ok(())
    }
}

/// Background music for the whole reel
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// `None` behaves like no audio at all
    #[serde(alias = "path")]
    pub source: Option<PathBuf>,

    /// Linear gain, 0 = silent, 1 = unchanged
    pub volume: f32,

    /// Repeat the trimmed clip when it is shorter than the video
    #[serde(rename = "loop")]
    pub loop_enabled: bool,

    /// Trim start in seconds
    #[serde(alias = "start_time")]
    pub start: f64,

    /// Trim end in seconds; `None` means the end of the source
    #[serde(alias = "end_time")]
    pub end: Option<f64>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            source: None,
            volume: 1.0,
            loop_enabled: false,
            start: 0.0,
            end: None,
        }
    }
}

impl AudioConfig {
    pub fn from_source<P: Into<PathBuf>>(source: P) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(ReelError::invalid(
                "audio.volume",
                format!("must be >= 0, got {}", self.volume),
            ));
        }
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(ReelError::invalid(
                "audio.start",
                format!("must be >= 0 seconds, got {}", self.start),
            ));
        }
        if let Some(end) = self.end {
            if !end.is_finite() || end <= self.start {
                return Err(ReelError::invalid(
                    "audio.end",
                    format!("must be greater than start ({}), got {}", self.start, end),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PROJECT: &str = r##"
[settings]
resolution = [1920, 1080]
fps = 24
background = "#102030"
fit = "cover"

[audio]
source = "music/track.wav"
volume = 0.5
loop = true
start = 1.5

[[images]]
source = "a.png"
duration = 2.0

[[images]]
source = "/abs/b.jpg"
[images.filters]
sepia = true
posterize = 3
[images.text]
text = "Hello"
align = "top"
"##;

    #[test]
    fn test_project_file_parses_and_resolves_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("project.toml");
        std::fs::write(&path, PROJECT).unwrap();

        let job = RenderJob::from_file(&path).unwrap();
        assert_eq!(job.settings.resolution, (1920, 1080));
        assert_eq!(job.settings.fps, 24);
        assert_eq!(job.settings.background, Color([0x10, 0x20, 0x30, 255]));
        assert_eq!(job.settings.fit, FitMethod::Cover);

        assert_eq!(job.images.len(), 2);
        match &job.images[0].source {
            ImageSource::Path(p) => assert_eq!(p, &dir.path().join("a.png")),
            other => panic!("unexpected source {other:?}"),
        }
        match &job.images[1].source {
            ImageSource::Path(p) => assert_eq!(p, &PathBuf::from("/abs/b.jpg")),
            other => panic!("unexpected source {other:?}"),
        }
        assert_eq!(job.images[1].duration, 3.0);
        assert!(job.images[1].filters.sepia);
        assert_eq!(job.images[1].filters.posterize, Some(3));

        let audio = job.audio.as_ref().unwrap();
        assert_eq!(audio.source.as_deref(), Some(dir.path().join("music/track.wav").as_path()));
        assert!(audio.loop_enabled);
        assert_eq!(audio.end, None);

        assert!(job.validate().is_ok());
        assert_eq!(job.total_duration(), 5.0);
    }

    #[test]
    fn test_empty_project_is_reported() {
        let job = RenderJob::new(vec![], GlobalSettings::default(), None);
        assert!(matches!(job.validate(), Err(ReelError::EmptyProject)));
    }

    #[test]
    fn test_non_positive_duration_names_the_entry() {
        let job = RenderJob::new(
            vec![ImageEntry::new("a.png".into(), 1.0), ImageEntry::new("b.png".into(), 0.0)],
            GlobalSettings::default(),
            None,
        );
        match job.validate() {
            Err(ReelError::InvalidParameter { context, .. }) => assert_eq!(context, "image[1].duration"),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_filter_errors_carry_index_and_filter() {
        let bad = FilterParams { posterize: Some(0), ..Default::default() };
        let job = RenderJob::new(
            vec![ImageEntry::new("a.png".into(), 1.0).with_filters(bad)],
            GlobalSettings::default(),
            None,
        );
        match job.validate() {
            Err(ReelError::InvalidParameter { context, .. }) => {
                assert_eq!(context, "image[0].filters.posterize")
            }
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let settings = GlobalSettings { resolution: (0, 1920), ..Default::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_audio_ranges() {
        let mut audio = AudioConfig::from_source("a.wav");
        assert!(audio.validate().is_ok());

        audio.end = Some(0.0);
        assert!(audio.validate().is_err());

        audio.end = None;
        audio.volume = -1.0;
        assert!(audio.validate().is_err());

        audio.volume = 0.0;
        audio.start = -0.5;
        assert!(audio.validate().is_err());
    }

    #[test]
    fn test_pixel_source_drops_alpha() {
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 0]));
        let loaded = ImageSource::from(image).load().unwrap();
        assert!(loaded.pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }

    #[test]
    fn test_unreadable_path_reports_reason() {
        let source = ImageSource::from("/definitely/missing.png");
        assert!(source.load().is_err());
    }
}
