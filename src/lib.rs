pub mod converter;
pub mod error;
pub mod gpx_types;
pub mod metrics;
pub mod options;
pub mod parser;
pub mod projection;
pub mod stats;

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::error::TrackStatsError;
use crate::gpx_types::GpxDocument;
use crate::metrics::TrackMetrics;
use crate::options::{FeatureOptions, ManualEntry, PreviewOptions};
use crate::stats::TrackStatistics;

/// Compute distance, elevation gain and bounds for a GPX document.
///
/// Never fails: an unreadable file yields [`TrackStatistics::empty`], and
/// callers check [`TrackStatistics::is_renderable`] before trusting the numbers.
pub fn parse(raw_text: &str) -> TrackStatistics {
    load_document(raw_text).statistics()
}

fn load_document(raw_text: &str) -> GpxDocument {
    match parser::parse_document(raw_text) {
        Ok(doc) => {
            let dropped = doc.dropped_points();
            if dropped > 0 {
                log::debug!("{dropped} track points dropped while reading GPX");
            }
            doc
        }
        Err(e) => {
            log::warn!("could not read GPX document: {e}");
            GpxDocument::default()
        }
    }
}

/// Parse GPX text into track statistics, returned as a JS object.
#[wasm_bindgen(js_name = parseGpxText)]
pub fn parse_gpx_text(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    to_js(&parse(gpx_string))
}

/// Convert the track of a GPX string to GeoJSON, returned as a JS object.
#[wasm_bindgen(js_name = trackToGeoJson)]
pub fn track_to_geojson(gpx_string: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: FeatureOptions = parse_options(options)?;
    let doc = load_document(gpx_string);
    let fc = converter::to_feature_collection(&doc.statistics(), doc.name(), &opts);
    to_js(&fc)
}

/// Convert the track of a GPX string to GeoJSON, returned as a JSON string.
#[wasm_bindgen(js_name = trackToGeoJsonString)]
pub fn track_to_geojson_string(gpx_string: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts: FeatureOptions = parse_options(options)?;
    let doc = load_document(gpx_string);
    let fc = converter::to_feature_collection(&doc.statistics(), doc.name(), &opts);
    serde_json::to_string(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Project the track onto a preview canvas; `null` when there is nothing to draw.
#[wasm_bindgen(js_name = projectTrackPreview)]
pub fn project_track_preview(gpx_string: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: PreviewOptions = parse_options(options)?;
    opts.validate()?;
    match projection::project(&parse(gpx_string), &opts) {
        Some(path) => to_js(&path),
        None => Ok(JsValue::NULL),
    }
}

/// Combine the metrics detected in a GPX string with values typed by hand.
#[wasm_bindgen(js_name = resolveTrackMetrics)]
pub fn resolve_track_metrics(gpx_string: &str, manual: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let manual: ManualEntry = parse_options(manual)?;
    let detected = TrackMetrics::detected(&parse(gpx_string));
    let metrics = TrackMetrics::resolve(detected, &manual)?;
    to_js(&metrics)
}

fn parse_options<T: DeserializeOwned + Default>(options: JsValue) -> Result<T, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(T::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| {
            log::debug!("rejected options: {e}");
            TrackStatsError::InvalidOptions(e.to_string()).into()
        })
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}
