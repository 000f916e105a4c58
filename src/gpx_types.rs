use serde::Serialize;

use crate::stats::TrackStatistics;

/// Track data read from a GPX document. Waypoints and routes are not kept.
#[derive(Debug, Default)]
pub struct GpxDocument {
    pub tracks: Vec<GpxTrack>,
}

impl GpxDocument {
    /// All track points of all tracks and segments, in file order.
    pub fn track_points(&self) -> impl Iterator<Item = &TrackPoint> + '_ {
        self.tracks
            .iter()
            .flat_map(|trk| trk.segments.iter())
            .flat_map(|seg| seg.points.iter())
    }

    /// Name of the first track that carries one.
    pub fn name(&self) -> Option<&str> {
        self.tracks.iter().find_map(|trk| trk.name.as_deref())
    }

    /// Number of `<trkpt>` elements dropped for unreadable coordinates.
    pub fn dropped_points(&self) -> usize {
        self.tracks
            .iter()
            .flat_map(|trk| trk.segments.iter())
            .map(|seg| seg.dropped)
            .sum()
    }

    /// Segments are flattened into one continuous path.
    pub fn statistics(&self) -> TrackStatistics {
        TrackStatistics::from_points(self.track_points().copied().collect())
    }
}

/// A single GPS fix (`<trkpt>`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon, ele: None }
    }

    pub fn with_ele(lat: f64, lon: f64, ele: f64) -> Self {
        Self {
            lat,
            lon,
            ele: Some(ele),
        }
    }
}

/// A GPX track (<trk>).
#[derive(Debug, Default)]
pub struct GpxTrack {
    pub name: Option<String>,
    pub segments: Vec<GpxSegment>,
}

/// A GPX track segment (<trkseg>).
#[derive(Debug, Default)]
pub struct GpxSegment {
    pub points: Vec<TrackPoint>,
    pub dropped: usize,
}
