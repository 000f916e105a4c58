use serde::Deserialize;

use crate::error::TrackStatsError;

/// Canvas geometry for the track preview.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOptions {
    /// Canvas width in pixels (default: 480)
    #[serde(default = "default_width")]
    pub width: f64,

    /// Canvas height in pixels (default: 260)
    #[serde(default = "default_height")]
    pub height: f64,

    /// Empty margin kept on every side (default: 28)
    #[serde(default = "default_padding")]
    pub padding: f64,

    /// Smallest lat/lon span used for scaling, so straight north-south or
    /// east-west tracks do not divide by zero (default: 0.0001 degrees)
    #[serde(default = "default_min_span")]
    pub min_span_deg: f64,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            padding: default_padding(),
            min_span_deg: default_min_span(),
        }
    }
}

impl PreviewOptions {
    /// Sizes must be finite and positive, padding finite and not negative.
    pub fn validate(&self) -> Result<(), TrackStatsError> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("minSpanDeg", self.min_span_deg),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TrackStatsError::InvalidOptions(format!(
                    "{field} must be a positive number, got {value}"
                )));
            }
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(TrackStatsError::InvalidOptions(format!(
                "padding must be zero or more, got {}",
                self.padding
            )));
        }
        Ok(())
    }
}

/// Options for GeoJSON export.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureOptions {
    /// Include elevation as the 3rd coordinate value (default: true)
    #[serde(default = "default_true")]
    pub include_elevation: bool,

    /// Include distanceKm, elevationGainMeters and pointCount in properties (default: true)
    #[serde(default = "default_true")]
    pub include_summary: bool,
}

impl Default for FeatureOptions {
    fn default() -> Self {
        Self {
            include_elevation: true,
            include_summary: true,
        }
    }
}

/// Values typed into the admin form next to the detected ones.
///
/// `None` means the field was left untouched; an empty string means it was cleared.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    #[serde(default)]
    pub distance_km: Option<String>,

    #[serde(default)]
    pub elevation_gain: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_width() -> f64 {
    480.0
}

fn default_height() -> f64 {
    260.0
}

fn default_padding() -> f64 {
    28.0
}

fn default_min_span() -> f64 {
    0.0001
}
