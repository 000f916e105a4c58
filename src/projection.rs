use serde::Serialize;

use crate::options::PreviewOptions;
use crate::stats::TrackStatistics;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// A track projected into canvas pixels, y growing downwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPath {
    pub width: f64,
    pub height: f64,
    /// Pixels per degree, shared by both axes.
    pub scale: f64,
    pub points: Vec<PixelPoint>,
    pub start: PixelPoint,
    pub end: PixelPoint,
}

/// Equirectangular projection of the track onto a `width` x `height` canvas.
///
/// Both axes use the same scale so the shape is not stretched; the track is
/// anchored at the bottom-left padding corner. Returns `None` when there is
/// nothing to draw or no room to draw it.
pub fn project(stats: &TrackStatistics, opts: &PreviewOptions) -> Option<PreviewPath> {
    if !stats.is_renderable() {
        return None;
    }
    let bounds = stats.bounds?;

    let inner_width = opts.width - opts.padding * 2.0;
    let inner_height = opts.height - opts.padding * 2.0;
    if inner_width <= 0.0 || inner_height <= 0.0 {
        return None;
    }

    let lat_range = (bounds.max_lat - bounds.min_lat).max(opts.min_span_deg);
    let lon_range = (bounds.max_lon - bounds.min_lon).max(opts.min_span_deg);
    let scale = (inner_width / lon_range).min(inner_height / lat_range);
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }

    let points: Vec<PixelPoint> = stats
        .points
        .iter()
        .map(|p| PixelPoint {
            x: opts.padding + (p.lon - bounds.min_lon) * scale,
            y: opts.height - opts.padding - (p.lat - bounds.min_lat) * scale,
        })
        .collect();

    let start = *points.first()?;
    let end = *points.last()?;

    Some(PreviewPath {
        width: opts.width,
        height: opts.height,
        scale,
        points,
        start,
        end,
    })
}
