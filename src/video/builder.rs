use tracing::debug;

use crate::error::{ReelError, Result};
use crate::filters::apply_filters;
use crate::project::{GlobalSettings, ImageEntry};
use crate::video::fit::fit;
use crate::video::font::FontBook;
use crate::video::text::{composite_over, rasterize_text};
use crate::video::types::{Frame, TimedFrame};

/// Turn one timeline entry into a finished frame
///
/// Load, filter, fit to the frame, draw the caption, then flatten onto the
/// background. `index` only labels errors and log lines.
pub fn build_frame(
    index: usize,
    entry: &ImageEntry,
    settings: &GlobalSettings,
    fonts: &FontBook,
) -> Result<TimedFrame> {
    let label = format!("image[{}]", index);

    if !entry.duration.is_finite() || entry.duration <= 0.0 {
        return Err(ReelError::invalid(
            format!("{}.duration", label),
            format!("must be > 0 seconds, got {}", entry.duration),
        ));
    }

    let source = entry
        .source
        .load()
        .map_err(|reason| ReelError::unreadable(label.as_str(), entry.source.describe(), reason))?;

    let filtered = apply_filters(&source, &entry.filters).map_err(|e| e.within(&label))?;
    let mut canvas = fit(&filtered, settings.resolution, settings.fit, settings.background)
        .map_err(|e| e.within(&label))?;

    if let Some(overlay) = entry.text.as_ref().filter(|t| t.is_visible()) {
        let face = fonts.resolve(overlay.font.as_deref());
        let layer = rasterize_text(
            &overlay.text,
            overlay.font_size,
            overlay.color,
            settings.resolution,
            overlay.alignment,
            &face,
        );
        composite_over(&mut canvas, &layer);
    }

    debug!(
        "Built frame {} from {} ({:.2}s)",
        index,
        entry.source.describe(),
        entry.duration
    );

    Ok(TimedFrame {
        frame: Frame::flatten(&canvas, settings.background),
        duration: entry.duration,
    })
}
