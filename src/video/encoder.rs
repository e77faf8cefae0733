use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Mutex, OnceLock};

use tracing::{debug, info};

use crate::config::EncoderConfig;
use crate::error::{ReelError, Result};

/// Everything the external encoder needs for one render
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    /// ffmpeg concat-demuxer list of frame images with display durations
    pub frame_list: PathBuf,

    /// Reconciled audio track, already exactly as long as the video
    pub audio: Option<PathBuf>,

    pub fps: u32,

    /// Total number of output frames at `fps`
    pub frame_count: u64,

    /// Where the encoded file is written
    pub output: PathBuf,
}

/// Boundary to the external encoding facility
///
/// Implementations marshal parameters and report failure with the
/// underlying diagnostic. They are called from a blocking thread.
pub trait FrameEncoder: Send + Sync {
    fn name(&self) -> &str;

    /// Fail before any frame work if the backend cannot run at all
    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    fn encode(&self, request: &EncodeRequest) -> Result<()>;
}

/// Encoder backed by the `ffmpeg` command line tool
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn check_ffmpeg_available(&self) -> bool {
        Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Full ffmpeg argument list for `request`
    pub fn arguments(&self, request: &EncodeRequest) -> Vec<String> {
        let config = &self.config;
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            request.frame_list.display().to_string(),
        ];

        if let Some(audio) = &request.audio {
            args.push("-i".into());
            args.push(audio.display().to_string());
        }

        args.extend([
            "-c:v".into(),
            config.video_codec.clone(),
            "-preset".into(),
            config.preset.clone(),
            "-threads".into(),
            config.threads.to_string(),
            "-r".into(),
            request.fps.to_string(),
            "-pix_fmt".into(),
            config.pixel_format.clone(),
            "-frames:v".into(),
            request.frame_count.to_string(),
        ]);

        if request.audio.is_some() {
            args.extend([
                "-map".into(),
                "0:v:0".into(),
                "-map".into(),
                "1:a:0".into(),
                "-c:a".into(),
                config.audio_codec.clone(),
            ]);
        } else {
            args.push("-an".into());
        }

        args.extend([
            "-f".into(),
            config.container.clone(),
            "-y".into(),
            request.output.display().to_string(),
        ]);
        args
    }
}

impl FrameEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn check_available(&self) -> Result<()> {
        if self.check_ffmpeg_available() {
            Ok(())
        } else {
            Err(ReelError::encode(format!(
                "ffmpeg not found or not runnable at '{}'",
                self.config.ffmpeg_path
            )))
        }
    }

    fn encode(&self, request: &EncodeRequest) -> Result<()> {
        let args = self.arguments(request);
        debug!("{} {}", self.config.ffmpeg_path, args.join(" "));

        let output = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ReelError::encode(format!(
                "could not run '{}': {}", self.config.ffmpeg_path, e
            )))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::encode(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        info!("Encoded {} frames at {} fps", request.frame_count, request.fps);
        Ok(())
    }
}

/// Write an ffmpeg concat list for `entries` of (image path, seconds)
///
/// The last file is repeated without a duration so the demuxer honors the
/// final entry's duration.
pub fn write_frame_list(list_path: &Path, entries: &[(PathBuf, f64)]) -> Result<()> {
    let mut file = BufWriter::new(File::create(list_path)?);
    writeln!(file, "ffconcat version 1.0")?;

    for (path, seconds) in entries {
        writeln!(file, "file '{}'", escape_concat_path(path))?;
        writeln!(file, "duration {:.6}", seconds)?;
    }
    if let Some((last, _)) = entries.last() {
        writeln!(file, "file '{}'", escape_concat_path(last))?;
    }

    file.flush()?;
    Ok(())
}

fn escape_concat_path(path: &Path) -> String {
    path.display().to_string().replace('\'', "'\\''")
}

fn in_flight() -> &'static Mutex<HashSet<PathBuf>> {
    static OUTPUTS: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
    OUTPUTS.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Exclusive claim on an output path for the lifetime of one render
#[derive(Debug)]
pub struct OutputLock {
    path: PathBuf,
}

impl OutputLock {
    pub fn acquire(output: &Path) -> Result<Self> {
        let path = normalize(output);
        let mut outputs = in_flight().lock().unwrap_or_else(|p| p.into_inner());
        if !outputs.insert(path.clone()) {
            return Err(ReelError::encode(format!(
                "another render is already writing {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        let mut outputs = in_flight().lock().unwrap_or_else(|p| p.into_inner());
        outputs.remove(&self.path);
    }
}

fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}
