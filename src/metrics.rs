use serde::Serialize;

use crate::error::TrackStatsError;
use crate::options::ManualEntry;
use crate::stats::TrackStatistics;

/// Distance and climb stored with a track. Either may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_gain: Option<f64>,
}

impl TrackMetrics {
    /// Values read from the file, only trusted when there is a path to measure.
    pub fn detected(stats: &TrackStatistics) -> Option<Self> {
        stats.is_renderable().then(|| Self {
            distance_km: Some(stats.distance_km),
            elevation_gain: Some(f64::from(stats.elevation_gain_meters)),
        })
    }

    /// Manual values win over detected ones; a cleared field stays empty.
    pub fn resolve(detected: Option<Self>, manual: &ManualEntry) -> Result<Self, TrackStatsError> {
        let detected = detected.unwrap_or_default();

        Ok(Self {
            distance_km: resolve_field("distanceKm", detected.distance_km, &manual.distance_km)?,
            elevation_gain: resolve_field(
                "elevationGain",
                detected.elevation_gain,
                &manual.elevation_gain,
            )?,
        })
    }
}

fn resolve_field(
    field: &'static str,
    detected: Option<f64>,
    manual: &Option<String>,
) -> Result<Option<f64>, TrackStatsError> {
    let Some(raw) = manual else {
        return Ok(detected);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(TrackStatsError::InvalidManualValue {
            field,
            value: raw.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TrackPoint;

    fn renderable() -> TrackStatistics {
        TrackStatistics::from_points(vec![
            TrackPoint::with_ele(0.0, 0.0, 100.0),
            TrackPoint::with_ele(0.0, 0.01, 103.0),
            TrackPoint::with_ele(0.0, 0.02, 101.0),
        ])
    }

    fn entry(distance: Option<&str>, elevation: Option<&str>) -> ManualEntry {
        ManualEntry {
            distance_km: distance.map(str::to_string),
            elevation_gain: elevation.map(str::to_string),
        }
    }

    #[test]
    fn test_detected_requires_two_points() {
        assert_eq!(
            TrackMetrics::detected(&renderable()),
            Some(TrackMetrics {
                distance_km: Some(2.22),
                elevation_gain: Some(3.0),
            })
        );

        let single = TrackStatistics::from_points(vec![TrackPoint::new(1.0, 1.0)]);
        assert!(TrackMetrics::detected(&single).is_none());
        assert!(TrackMetrics::detected(&TrackStatistics::empty()).is_none());
    }

    #[test]
    fn test_untouched_fields_use_detected() {
        let detected = TrackMetrics::detected(&renderable());
        let metrics = TrackMetrics::resolve(detected, &ManualEntry::default()).unwrap();
        assert_eq!(metrics, detected.unwrap());
    }

    #[test]
    fn test_manual_overrides_and_clears() {
        let detected = TrackMetrics::detected(&renderable());
        let metrics = TrackMetrics::resolve(detected, &entry(Some(" 21.1 "), Some(""))).unwrap();
        assert_eq!(metrics.distance_km, Some(21.1));
        assert_eq!(metrics.elevation_gain, None);
    }

    #[test]
    fn test_manual_without_detection() {
        let metrics = TrackMetrics::resolve(None, &entry(None, Some("850"))).unwrap();
        assert_eq!(metrics.distance_km, None);
        assert_eq!(metrics.elevation_gain, Some(850.0));
    }

    #[test]
    fn test_invalid_manual_value() {
        let err = TrackMetrics::resolve(None, &entry(Some("doce"), None)).unwrap_err();
        match err {
            TrackStatsError::InvalidManualValue { field, value } => {
                assert_eq!(field, "distanceKm");
                assert_eq!(value, "doce");
            }
            other => panic!("Expected InvalidManualValue, got {other:?}"),
        }
        assert!(TrackMetrics::resolve(None, &entry(None, Some("NaN"))).is_err());
    }

    #[test]
    fn test_serialized_shape_omits_unknown() {
        let json = serde_json::to_value(TrackMetrics {
            distance_km: Some(10.0),
            elevation_gain: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "distanceKm": 10.0 }));
    }
}
