use std::path::PathBuf;

/// Decoded audio as interleaved `f32` samples in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    /// Interleaved samples, `channels` per sample frame
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Where the samples were decoded from, if anywhere
    pub file_path: Option<PathBuf>,

    pub format: AudioFormat,
}

impl AudioData {
    /// In-memory audio with no backing file
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
            file_path: None,
            format: AudioFormat::default(),
        }
    }

    /// Number of sample frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Sample frame index for a time in seconds, rounded to nearest
    pub fn frame_at(&self, seconds: f64) -> usize {
        (seconds.max(0.0) * self.sample_rate as f64).round() as usize
    }
}

/// Source file format information, for logging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFormat {
    /// File extension (wav, mp3, flac, etc.)
    pub extension: String,

    /// Bit depth (16, 24, 32, etc.)
    pub bit_depth: Option<u16>,

    /// Codec description for compressed formats
    pub compression: Option<String>,
}
