use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum TrackStatsError {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("Document has no <gpx> root element")]
    MissingRoot,

    #[error("Expected <gpx> root element, found <{0}>")]
    UnexpectedRoot(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Invalid value '{value}' for {field}")]
    InvalidManualValue { field: &'static str, value: String },
}

impl From<TrackStatsError> for JsValue {
    fn from(e: TrackStatsError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}
