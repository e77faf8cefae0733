use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, warn};

use crate::audio::load_and_reconcile;
use crate::composition::timeline::{assemble, Timeline, FRAME_PROGRESS_SHARE};
use crate::config::Config;
use crate::error::{ReelError, Result};
use crate::project::RenderJob;
use crate::video::builder::build_frame;
use crate::video::encoder::{write_frame_list, EncodeRequest, FfmpegEncoder, FrameEncoder, OutputLock};
use crate::video::font::FontBook;

/// Summary of a finished render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub path: PathBuf,

    /// Seconds of video
    pub duration: f64,

    pub frame_count: u64,

    pub audio: Option<AudioSummary>,
}

/// What happened to the background audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSummary {
    pub duration: f64,
    pub looped: bool,
    pub silence_padding: f64,
}

/// Runs render jobs from images to an encoded video file
///
/// The pipeline per job:
/// 1. Validate - Reject empty or out-of-range projects before any work
/// 2. Frames - Build every entry into a frame (first half of progress)
/// 3. Sequence - Write frames and the concat list to a scratch directory
/// 4. Audio - Load and reconcile the music to the video length
/// 5. Encode - Hand everything to the encoder, then move the result into place
///
/// Scratch files live in a temporary directory removed on every exit path,
/// and the output file only appears once encoding succeeded.
pub struct RenderEngine {
    config: Config,
    encoder: Arc<dyn FrameEncoder>,
    fonts: FontBook,
}

impl RenderEngine {
    /// Engine encoding through ffmpeg as configured in `config.encoder`
    pub fn new(config: Config) -> Self {
        let encoder = Arc::new(FfmpegEncoder::new(config.encoder.clone()));
        Self::with_encoder(config, encoder)
    }

    /// Engine using a custom encoder backend
    pub fn with_encoder(config: Config, encoder: Arc<dyn FrameEncoder>) -> Self {
        let fonts = FontBook::new(config.render.default_font.clone());
        Self { config, encoder, fonts }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render `job` to a video file at `output`
    ///
    /// `progress` receives non-decreasing values in [0, 1], at least once per
    /// image and exactly 1.0 on success.
    pub async fn render(
        &self,
        job: &RenderJob,
        output: &Path,
        progress: &(dyn Fn(f32) + Sync),
    ) -> Result<RenderOutput> {
        if job.images.is_empty() {
            return Err(ReelError::EmptyProject);
        }
        job.validate()?;
        self.config.validate()?;
        if (job.total_duration() * job.settings.fps as f64).round() < 1.0 {
            return Err(ReelError::invalid(
                "images",
                format!("total duration {}s is shorter than one frame", job.total_duration()),
            ));
        }

        let _lock = OutputLock::acquire(output)?;
        let settings = &job.settings;
        self.encoder.check_available()?;

        info!(
            "Rendering {} images at {}x{} {} fps via {} to {:?}",
            job.images.len(),
            settings.resolution.0,
            settings.resolution.1,
            settings.fps,
            self.encoder.name(),
            output
        );

        let workdir = tempfile::Builder::new()
            .prefix("reel-compositor-")
            .tempdir()?;
        debug!("Scratch directory {:?}", workdir.path());

        let frame_list = workdir.path().join("frames.txt");
        let timeline = off_executor(|| {
            let timeline = assemble(&job.images, settings, &self.config.render, &self.fonts, progress)?;
            self.write_sequence(&timeline, settings.fps, workdir.path(), &frame_list)?;
            Ok::<_, ReelError>(timeline)
        })?;
        progress(FRAME_PROGRESS_SHARE + 0.1);

        let frame_count = timeline.frame_count(settings.fps);
        let video_duration = frame_count as f64 / settings.fps as f64;

        let audio = load_and_reconcile(job.audio.as_ref(), video_duration).await?;
        let audio_path = match &audio {
            Some(track) => {
                let path = workdir.path().join("audio.wav");
                track.write_wav(&path)?;
                info!(
                    "Audio reconciled: {:.2}s (looped: {}, silence: {:.2}s)",
                    track.duration(),
                    track.looped,
                    track.silence_padding
                );
                Some(path)
            }
            None => None,
        };
        progress(FRAME_PROGRESS_SHARE + 0.2);

        let staged = tempfile::Builder::new()
            .prefix(".reel-")
            .suffix(&format!(".{}", self.config.encoder.container))
            .tempfile_in(output_dir(output))?;

        let request = EncodeRequest {
            frame_list,
            audio: audio_path,
            fps: settings.fps,
            frame_count,
            output: staged.path().to_path_buf(),
        };

        let encoder = Arc::clone(&self.encoder);
        tokio::task::spawn_blocking(move || encoder.encode(&request))
            .await
            .map_err(|e| ReelError::encode(format!("encoder task failed: {}", e)))??;

        staged.persist(output).map_err(|e| ReelError::Io(e.error))?;
        progress(1.0);

        let result = RenderOutput {
            path: output.to_path_buf(),
            duration: video_duration,
            frame_count,
            audio: audio.map(|track| AudioSummary {
                duration: track.duration(),
                looped: track.looped,
                silence_padding: track.silence_padding,
            }),
        };

        info!(
            "Render complete: {:?}, {:.2}s, {} frames",
            result.path, result.duration, result.frame_count
        );
        Ok(result)
    }

    /// Build a single entry's frame and save it as PNG, for previews
    pub fn render_frame(&self, job: &RenderJob, index: usize, output: &Path) -> Result<PathBuf> {
        let entry = job.images.get(index).ok_or_else(|| {
            ReelError::invalid(
                "frame",
                format!("index {} is out of range for {} images", index, job.images.len()),
            )
        })?;
        job.settings.validate()?;

        let timed = build_frame(index, entry, &job.settings, &self.fonts)?;
        timed
            .frame
            .save_png(output)
            .map_err(|e| ReelError::encode(format!("writing {:?}: {}", output, e)))?;

        info!("Saved frame {} to {:?}", index, output);
        Ok(output.to_path_buf())
    }

    /// Save each frame once and list it with its on-screen time
    fn write_sequence(&self, timeline: &Timeline, fps: u32, dir: &Path, list: &Path) -> Result<()> {
        let spans = timeline.frame_spans(fps);
        let mut entries = Vec::with_capacity(timeline.len());

        for (index, (timed, span)) in timeline.frames.iter().zip(spans).enumerate() {
            if span == 0 {
                warn!(
                    "Image {} ({:.4}s) is shorter than half an output frame at {} fps and will not appear",
                    index, timed.duration, fps
                );
                continue;
            }
            let path = dir.join(format!("frame_{:06}.png", index));
            timed
                .frame
                .save_png(&path)
                .map_err(|e| ReelError::encode(format!("writing frame {}: {}", index, e)))?;
            entries.push((path, span as f64 / fps as f64));
        }

        write_frame_list(list, &entries)?;
        debug!("Wrote {} frames to {:?}", entries.len(), dir);
        Ok(())
    }
}

/// Run CPU and file heavy work without stalling other tasks on the runtime
///
/// On a multi-threaded runtime the current worker hands its other tasks off
/// first. A current-thread runtime has nowhere to hand them, so the work
/// runs inline there.
fn off_executor<T>(work: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

fn output_dir(output: &Path) -> &Path {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
