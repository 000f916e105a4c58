use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};

use crate::error::TrackStatsError;
use crate::gpx_types::*;

type Result<T> = std::result::Result<T, TrackStatsError>;

/// Parse a GPX XML string into its tracks.
///
/// The first element must be `<gpx>`; anything else is rejected so callers
/// never mistake an unrelated XML file for an empty track.
pub fn parse_document(xml: &str) -> Result<GpxDocument> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                return match e.local_name().as_ref() {
                    b"gpx" => parse_gpx_body(&mut reader),
                    other => Err(unexpected_root(other)),
                };
            }
            Ok(Event::Empty(e)) => {
                return match e.local_name().as_ref() {
                    b"gpx" => Ok(GpxDocument::default()),
                    other => Err(unexpected_root(other)),
                };
            }
            Ok(Event::Eof) => return Err(TrackStatsError::MissingRoot),
            Err(e) => return Err(TrackStatsError::XmlParse(e)),
            _ => {}
        }
    }
}

fn unexpected_root(name: &[u8]) -> TrackStatsError {
    TrackStatsError::UnexpectedRoot(String::from_utf8_lossy(name).into_owned())
}

/// Parse the children of <gpx>, keeping only <trk>.
fn parse_gpx_body<'a>(reader: &mut Reader<&'a [u8]>) -> Result<GpxDocument> {
    let mut doc = GpxDocument::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trk" => doc.tracks.push(parse_track(reader)?),
                _ => {
                    // wpt, rte, metadata and extensions
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"gpx" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(TrackStatsError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(doc)
}

/// Parse a <trk> element.
fn parse_track<'a>(reader: &mut Reader<&'a [u8]>) -> Result<GpxTrack> {
    let mut track = GpxTrack::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => track.name = Some(read_element_text(reader, &e)?),
                b"trkseg" => track.segments.push(parse_segment(reader)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trk" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(TrackStatsError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(track)
}

/// Parse a <trkseg> element.
fn parse_segment<'a>(reader: &mut Reader<&'a [u8]>) -> Result<GpxSegment> {
    let mut segment = GpxSegment::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => match parse_point(&e, reader)? {
                    Some(pt) => segment.points.push(pt),
                    None => segment.dropped += 1,
                },
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    match parse_lat_lon(&e) {
                        Some((lat, lon)) => segment.points.push(TrackPoint::new(lat, lon)),
                        None => segment.dropped += 1,
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(TrackStatsError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(segment)
}

/// Parse a <trkpt> and its children. Called after Event::Start for the point.
///
/// The element is always consumed; `None` means its coordinates were unusable.
fn parse_point<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
) -> Result<Option<TrackPoint>> {
    let coords = parse_lat_lon(start);
    let end_name = start.name().0.to_vec();
    let mut ele = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"ele" => {
                    let text = read_element_text(reader, &e)?;
                    ele = parse_number(&text);
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(TrackStatsError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(coords.map(|(lat, lon)| TrackPoint { lat, lon, ele }))
}

/// Read lat/lon attributes from a point's start tag.
fn parse_lat_lon(e: &BytesStart<'_>) -> Option<(f64, f64)> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr in e.attributes().flatten() {
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = parse_number(val),
            b"lon" => lon = parse_number(val),
            _ => {}
        }
    }

    Some((lat?, lon?))
}

/// Finite numbers only; "NaN", "inf" and garbage are rejected.
fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Text of a `<name>` or `<ele>` element. Character references and the five
/// predefined entities are resolved; any other entity is dropped.
fn read_element_text<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => match e.resolve_char_ref() {
                Ok(Some(ch)) => text.push(ch),
                _ => {
                    let entity = String::from_utf8_lossy(&e);
                    text.push_str(resolve_predefined_entity(&entity).unwrap_or_default());
                }
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(TrackStatsError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(doc: &GpxDocument) -> Vec<TrackPoint> {
        doc.track_points().copied().collect()
    }

    #[test]
    fn test_simple_track() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <name>Morning Run</name>
    <trkseg>
      <trkpt lat="35.0" lon="139.0"><ele>10.0</ele></trkpt>
      <trkpt lat="35.001" lon="139.001"><ele>11.0</ele></trkpt>
      <trkpt lat="35.002" lon="139.002"><ele>12.0</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.tracks.len(), 1);
        assert_eq!(doc.name(), Some("Morning Run"));
        let pts = points(&doc);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[0], TrackPoint::with_ele(35.0, 139.0, 10.0));
        assert_eq!(pts[2].ele, Some(12.0));
    }

    #[test]
    fn test_single_segment_single_point_is_a_list() {
        let xml = r#"<gpx><trk><trkseg><trkpt lat="1.5" lon="2.5"/></trkseg></trk></gpx>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.tracks[0].segments.len(), 1);
        assert_eq!(points(&doc), vec![TrackPoint::new(1.5, 2.5)]);
    }

    #[test]
    fn test_multi_segment_order() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <trkseg>
      <trkpt lat="1.0" lon="1.0"/>
      <trkpt lat="2.0" lon="2.0"/>
    </trkseg>
    <trkseg>
      <trkpt lat="3.0" lon="3.0"/>
    </trkseg>
  </trk>
  <trk>
    <trkseg>
      <trkpt lat="4.0" lon="4.0"/>
    </trkseg>
  </trk>
</gpx>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.tracks.len(), 2);
        let lats: Vec<f64> = points(&doc).iter().map(|p| p.lat).collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_bad_coordinates_dropped() {
        let xml = r#"<gpx>
  <trk><trkseg>
    <trkpt lat="1.0" lon="1.0"/>
    <trkpt lat="north" lon="1.0"><ele>5</ele></trkpt>
    <trkpt lon="1.0"/>
    <trkpt lat="NaN" lon="1.0"/>
    <trkpt lat="2.0" lon="inf"/>
    <trkpt lat=" 3.0 " lon="3.0"/>
  </trkseg></trk>
</gpx>"#;
        let doc = parse_document(xml).unwrap();
        let lats: Vec<f64> = points(&doc).iter().map(|p| p.lat).collect();
        assert_eq!(lats, vec![1.0, 3.0]);
        assert_eq!(doc.dropped_points(), 4);
    }

    #[test]
    fn test_bad_elevation_kept_as_absent() {
        let xml = r#"<gpx><trk><trkseg>
  <trkpt lat="1.0" lon="1.0"><ele>high</ele></trkpt>
  <trkpt lat="2.0" lon="2.0"><ele> 42.5 </ele></trkpt>
</trkseg></trk></gpx>"#;
        let doc = parse_document(xml).unwrap();
        let pts = points(&doc);
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[0].ele, None);
        assert_eq!(pts[1].ele, Some(42.5));
    }

    #[test]
    fn test_waypoints_and_routes_ignored() {
        let xml = r#"<?xml version="1.0"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1">
  <metadata><name>Club</name></metadata>
  <wpt lat="35.0" lon="139.0"><name>Start</name></wpt>
  <rte><rtept lat="35.0" lon="139.0"/><rtept lat="36.0" lon="140.0"/></rte>
  <trk><trkseg><trkpt lat="10.0" lon="20.0"/></trkseg></trk>
</gpx>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(points(&doc), vec![TrackPoint::new(10.0, 20.0)]);
    }

    #[test]
    fn test_extensions_skipped() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <trkseg>
      <trkpt lat="35.0" lon="139.0">
        <ele>12</ele>
        <extensions>
          <gpxtpx:TrackPointExtension xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v1">
            <gpxtpx:hr>150</gpxtpx:hr>
          </gpxtpx:TrackPointExtension>
        </extensions>
      </trkpt>
    </trkseg>
  </trk>
</gpx>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(points(&doc), vec![TrackPoint::with_ele(35.0, 139.0, 12.0)]);
    }

    #[test]
    fn test_prefixed_elements() {
        let xml = r#"<g:gpx xmlns:g="http://www.topografix.com/GPX/1/1">
  <g:trk><g:trkseg><g:trkpt lat="1.0" lon="2.0"><g:ele>3</g:ele></g:trkpt></g:trkseg></g:trk>
</g:gpx>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(points(&doc), vec![TrackPoint::with_ele(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_track_name_with_entities() {
        let xml = r#"<gpx><trk><name>Sierra &amp; Lago</name></trk></gpx>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.name(), Some("Sierra & Lago"));
    }

    #[test]
    fn test_track_name_references() {
        let xml = r#"<gpx><trk><name>Caf&#233; &lt;Norte&gt; &eacute;<![CDATA[ & Sur]]></name></trk></gpx>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.name(), Some("Café <Norte>  & Sur"));
    }

    #[test]
    fn test_elevation_with_reference() {
        let xml = r#"<gpx><trk><trkseg><trkpt lat="1" lon="1"><ele>&#49;2.5</ele></trkpt></trkseg></trk></gpx>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.tracks[0].segments[0].points[0].ele, Some(12.5));
    }

    #[test]
    fn test_empty_gpx() {
        let doc = parse_document(r#"<?xml version="1.0"?><gpx version="1.1"></gpx>"#).unwrap();
        assert!(doc.tracks.is_empty());

        let doc = parse_document("<gpx/>").unwrap();
        assert!(doc.tracks.is_empty());
    }

    #[test]
    fn test_missing_root() {
        assert!(matches!(
            parse_document(""),
            Err(TrackStatsError::MissingRoot)
        ));
        assert!(matches!(
            parse_document("just some text"),
            Err(TrackStatsError::MissingRoot)
        ));
    }

    #[test]
    fn test_unexpected_root() {
        let err = parse_document(r#"<kml><trk/></kml>"#).unwrap_err();
        match err {
            TrackStatsError::UnexpectedRoot(name) => assert_eq!(name, "kml"),
            other => panic!("Expected UnexpectedRoot, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_tags_error() {
        let xml = r#"<gpx><trk><trkseg><trkpt lat="1" lon="1"></trkseg></trk></gpx>"#;
        assert!(matches!(
            parse_document(xml),
            Err(TrackStatsError::XmlParse(_))
        ));
    }
}
