use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::RenderConfig;
use crate::error::Result;
use crate::project::{GlobalSettings, ImageEntry};
use crate::video::builder::build_frame;
use crate::video::font::FontBook;
use crate::video::types::TimedFrame;

/// Share of overall progress spent building frames
pub const FRAME_PROGRESS_SHARE: f32 = 0.5;

/// Built frames in timeline order
#[derive(Debug, Clone)]
pub struct Timeline {
    pub frames: Vec<TimedFrame>,
}

impl Timeline {
    /// Sum of frame durations in seconds
    pub fn total_duration(&self) -> f64 {
        self.frames.iter().map(|f| f.duration).sum()
    }

    /// Output frames for the whole timeline at `fps`
    pub fn frame_count(&self, fps: u32) -> u64 {
        (self.total_duration() * fps as f64).round() as u64
    }

    /// Output frames covered by each entry at `fps`
    ///
    /// Boundaries are rounded on the cumulative time, so the spans always
    /// add up to [`Timeline::frame_count`] and rounding never drifts.
    pub fn frame_spans(&self, fps: u32) -> Vec<u64> {
        let mut elapsed = 0.0;
        let mut previous = 0u64;
        self.frames
            .iter()
            .map(|frame| {
                elapsed += frame.duration;
                let boundary = (elapsed * fps as f64).round() as u64;
                let span = boundary.saturating_sub(previous);
                previous = boundary;
                span
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Reports frame completion in index order, whatever order frames finish in
struct OrderedProgress<'a> {
    sink: &'a (dyn Fn(f32) + Sync),
    total: usize,
    state: Mutex<(Vec<bool>, usize)>,
}

impl<'a> OrderedProgress<'a> {
    fn new(total: usize, sink: &'a (dyn Fn(f32) + Sync)) -> Self {
        Self {
            sink,
            total,
            state: Mutex::new((vec![false; total], 0)),
        }
    }

    fn complete(&self, index: usize) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let (done, next) = &mut *state;
        done[index] = true;
        while *next < self.total && done[*next] {
            *next += 1;
            (self.sink)(*next as f32 / self.total as f32 * FRAME_PROGRESS_SHARE);
        }
    }
}

/// Build every entry into a frame, keeping input order
///
/// Frames are built on a rayon pool when `render.parallel_frames` is set.
/// Progress reaches [`FRAME_PROGRESS_SHARE`] once every frame is built. On
/// failure the error of the lowest failing index is returned.
pub fn assemble(
    images: &[ImageEntry],
    settings: &GlobalSettings,
    render: &RenderConfig,
    fonts: &FontBook,
    progress: &(dyn Fn(f32) + Sync),
) -> Result<Timeline> {
    let progress = OrderedProgress::new(images.len(), progress);
    let build = |(index, entry): (usize, &ImageEntry)| {
        let frame = build_frame(index, entry, settings, fonts);
        if frame.is_ok() {
            progress.complete(index);
        }
        frame
    };

    let results: Vec<Result<TimedFrame>> = if render.parallel_frames && images.len() > 1 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(render.processing_threads)
            .build()
        {
            Ok(pool) => {
                debug!("Building {} frames on {} threads", images.len(), render.processing_threads);
                pool.install(|| images.par_iter().enumerate().map(build).collect())
            }
            Err(e) => {
                warn!("Could not start frame worker pool ({}), building sequentially", e);
                images.iter().enumerate().map(build).collect()
            }
        }
    } else {
        images.iter().enumerate().map(build).collect()
    };

    let frames = results.into_iter().collect::<Result<Vec<_>>>()?;
    let timeline = Timeline { frames };
    info!(
        "Built {} frames, {:.2}s total",
        timeline.len(),
        timeline.total_duration()
    );
    Ok(timeline)
}
