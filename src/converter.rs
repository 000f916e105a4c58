use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::options::FeatureOptions;
use crate::stats::{Bounds, TrackPoint, TrackStatistics};

/// Convert track statistics to a GeoJSON FeatureCollection.
///
/// An empty track yields an empty collection, a single fix a Point Feature,
/// anything longer one LineString Feature.
pub fn to_feature_collection(
    stats: &TrackStatistics,
    name: Option<&str>,
    opts: &FeatureOptions,
) -> FeatureCollection {
    let bbox = stats.bounds.as_ref().map(bbox);

    let features = match stats.points.as_slice() {
        [] => Vec::new(),
        [pt] => vec![track_feature(
            Value::Point(point_coords(pt, opts.include_elevation)),
            stats,
            name,
            opts,
        )],
        points => vec![track_feature(
            Value::LineString(
                points
                    .iter()
                    .map(|pt| point_coords(pt, opts.include_elevation))
                    .collect(),
            ),
            stats,
            name,
            opts,
        )],
    };

    FeatureCollection {
        bbox,
        features,
        foreign_members: None,
    }
}

fn track_feature(
    value: Value,
    stats: &TrackStatistics,
    name: Option<&str>,
    opts: &FeatureOptions,
) -> Feature {
    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String("track".to_string()),
    );
    if let Some(name) = name {
        props.insert("name".to_string(), JsonValue::String(name.to_string()));
    }

    if opts.include_summary {
        props.insert(
            "distanceKm".to_string(),
            serde_json::Number::from_f64(stats.distance_km)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
        );
        props.insert(
            "elevationGainMeters".to_string(),
            JsonValue::Number(stats.elevation_gain_meters.into()),
        );
        props.insert(
            "pointCount".to_string(),
            JsonValue::Number(stats.points.len().into()),
        );
    }

    Feature {
        bbox: stats.bounds.as_ref().map(bbox),
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// GeoJSON bbox order: [west, south, east, north].
fn bbox(bounds: &Bounds) -> Vec<f64> {
    vec![bounds.min_lon, bounds.min_lat, bounds.max_lon, bounds.max_lat]
}

/// Build [lon, lat] or [lon, lat, ele] coordinate array.
fn point_coords(pt: &TrackPoint, include_elevation: bool) -> Vec<f64> {
    match (include_elevation, pt.ele) {
        (true, Some(ele)) => vec![pt.lon, pt.lat, ele],
        _ => vec![pt.lon, pt.lat],
    }
}
