use serde::Serialize;

pub use crate::gpx_types::TrackPoint;

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Climbs of this size or less between consecutive fixes are sensor noise.
pub const ELEVATION_NOISE_THRESHOLD_M: f64 = 1.0;

/// Axis-aligned lat/lon envelope of a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// `None` for an empty slice. Longitudes are folded naively, so a track
    /// crossing the antimeridian gets a box spanning most of the globe.
    pub fn enclosing(points: &[TrackPoint]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };

        Some(points.iter().fold(init, |acc, p| Self {
            min_lat: acc.min_lat.min(p.lat),
            max_lat: acc.max_lat.max(p.lat),
            min_lon: acc.min_lon.min(p.lon),
            max_lon: acc.max_lon.max(p.lon),
        }))
    }

    /// Edges are inclusive, so every point the box was built from is inside it.
    pub fn contains(&self, point: &TrackPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }
}

/// Summary of one GPX file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackStatistics {
    pub points: Vec<TrackPoint>,
    pub distance_km: f64,
    pub elevation_gain_meters: u32,
    pub bounds: Option<Bounds>,
}

impl TrackStatistics {
    /// The "no data" result returned for unreadable files.
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            distance_km: 0.0,
            elevation_gain_meters: 0,
            bounds: None,
        }
    }

    pub fn from_points(points: Vec<TrackPoint>) -> Self {
        let distance_km = round_to_cents(distance_meters(&points) / 1000.0);
        let elevation_gain_meters = elevation_gain_meters(&points).round() as u32;
        let bounds = Bounds::enclosing(&points);

        Self {
            points,
            distance_km,
            elevation_gain_meters,
            bounds,
        }
    }

    /// True for the "no data" result: an unreadable file or one without track points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A path needs at least two points to be drawn or measured.
    pub fn is_renderable(&self) -> bool {
        self.points.len() > 1
    }
}

/// Great-circle distance between two fixes, in meters.
pub fn haversine_distance(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let sin_d_phi = (d_phi / 2.0).sin();
    let sin_d_lambda = (d_lambda / 2.0).sin();

    let h = (sin_d_phi * sin_d_phi + phi1.cos() * phi2.cos() * sin_d_lambda * sin_d_lambda)
        .clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Sum of consecutive haversine distances, unrounded, in meters.
pub fn distance_meters(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance(&pair[0], &pair[1]))
        .sum()
}

/// Sum of climbs above the noise threshold between consecutive points that
/// both carry an elevation. Unrounded, in meters.
pub fn elevation_gain_meters(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .filter_map(|pair| match (pair[0].ele, pair[1].ele) {
            (Some(prev), Some(curr)) => Some(curr - prev),
            _ => None,
        })
        .filter(|delta| *delta > ELEVATION_NOISE_THRESHOLD_M)
        .sum()
}

/// Two decimals, rounded on the exact binary value with ties upwards, the way
/// JS `toFixed(2)` does: 21.665 is stored as 21.66499.. and becomes 21.66.
fn round_to_cents(value: f64) -> f64 {
    // Only multiples of 1/8 land exactly on a half cent.
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths.rem_euclid(2.0) == 1.0 {
        return (value * 100.0).ceil() / 100.0;
    }
    format!("{value:.2}").parse().unwrap_or(value)
}
