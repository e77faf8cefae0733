use std::path::Path;

use tracing::{debug, info, warn};

use crate::audio::loader::AudioLoader;
use crate::audio::types::AudioData;
use crate::error::{ReelError, Result};
use crate::project::AudioConfig;

/// Audio whose length matches the video exactly
#[derive(Debug, Clone)]
pub struct AudioTrack {
    pub data: AudioData,

    /// Whether the trimmed clip had to be repeated
    pub looped: bool,

    /// Seconds of trailing silence added because the clip ran out
    pub silence_padding: f64,
}

impl AudioTrack {
    pub fn duration(&self) -> f64 {
        self.data.duration()
    }

    /// Write the track as a 32-bit float WAV file
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.data.channels,
            sample_rate: self.data.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let wav_err = |e: hound::Error| ReelError::encode(format!("writing audio track: {}", e));
        let mut writer = hound::WavWriter::create(path, spec).map_err(wav_err)?;
        for &sample in &self.data.samples {
            writer.write_sample(sample).map_err(wav_err)?;
        }
        writer.finalize().map_err(wav_err)?;
        Ok(())
    }
}

/// Load the configured source and fit it to `video_duration`
///
/// Returns `None` when there is no audio config or it names no source.
pub async fn load_and_reconcile(
    config: Option<&AudioConfig>,
    video_duration: f64,
) -> Result<Option<AudioTrack>> {
    let Some(config) = config else {
        return Ok(None);
    };
    let Some(source) = config.source.as_ref() else {
        return Ok(None);
    };

    config.validate()?;
    let audio = AudioLoader::load(source).await?;
    info!(
        "Loaded audio {:?} ({}, {:.2}s)",
        source,
        audio.format.extension,
        audio.duration()
    );

    reconcile(&audio, config, video_duration).map(Some)
}

/// Trim, loop, apply gain, then truncate or pad to `video_duration`
///
/// The steps run in exactly that order: gain after looping keeps every
/// repeat at the same volume, and the final truncate/pad guarantees the
/// track length.
pub fn reconcile(audio: &AudioData, config: &AudioConfig, video_duration: f64) -> Result<AudioTrack> {
    config.validate()?;
    if !video_duration.is_finite() || video_duration < 0.0 {
        return Err(ReelError::invalid(
            "audio",
            format!("video duration must be >= 0, got {}", video_duration),
        ));
    }

    let channels = audio.channels.max(1) as usize;
    let total_frames = audio.frame_count();
    let target_frames = audio.frame_at(video_duration);

    // 1. trim
    let start = audio.frame_at(config.start).min(total_frames);
    let end = config
        .end
        .map(|end| audio.frame_at(end))
        .unwrap_or(total_frames)
        .clamp(start, total_frames);
    let trimmed = &audio.samples[start * channels..end * channels];
    let trimmed_frames = end - start;

    if trimmed_frames == 0 {
        warn!("Audio trim window [{}s, {:?}) is past the end of the source", config.start, config.end);
    }

    // 2. loop
    let mut samples: Vec<f32> = trimmed.to_vec();
    let mut looped = false;
    if config.loop_enabled && trimmed_frames > 0 && trimmed_frames < target_frames {
        let target_len = target_frames * channels;
        samples = trimmed.iter().copied().cycle().take(target_len).collect();
        looped = true;
        debug!(
            "Looped {} sample frames to {} ({} repeats)",
            trimmed_frames,
            target_frames,
            target_frames.div_ceil(trimmed_frames)
        );
    }

    // 3. gain
    if config.volume != 1.0 {
        for sample in &mut samples {
            *sample *= config.volume;
        }
    }

    // 4. truncate or pad
    let produced_frames = samples.len() / channels;
    let padded_frames = target_frames.saturating_sub(produced_frames);
    samples.resize(target_frames * channels, 0.0);

    let silence_padding = padded_frames as f64 / audio.sample_rate.max(1) as f64;
    if padded_frames > 0 {
        warn!(
            "Audio ends {:.2}s before the video; the remainder is silent",
            silence_padding
        );
    }

    Ok(AudioTrack {
        data: AudioData {
            samples,
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            file_path: audio.file_path.clone(),
            format: audio.format.clone(),
        },
        looped,
        silence_padding,
    })
}
