use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;

use crate::gpx_types::{GeocodedAddress, Point};

pub const GPX_CREATOR: &str = "GPX Route Viewer";
pub const GPX_DESCRIPTION: &str = "Route generated with OpenRouteService";
const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

/// Serialize a path as a GPX 1.1 document stamped with the current time.
pub fn to_gpx(points: &[Point], name: &str, addresses: Option<&[GeocodedAddress]>) -> String {
    to_gpx_at(points, name, addresses, Utc::now())
}

/// Serialize a path as a GPX 1.1 document with a single track segment.
///
/// Only latitude and longitude are written for each point. When `addresses`
/// is non-empty, the start, intermediate and end labels are summarized in
/// `<metadata><keywords>`.
pub fn to_gpx_at(
    points: &[Point],
    name: &str,
    addresses: Option<&[GeocodedAddress]>,
    time: DateTime<Utc>,
) -> String {
    let name = escape(name);
    let mut out = String::with_capacity(256 + points.len() * 64);

    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push_str(&format!(
        "\n<gpx version=\"1.1\" creator=\"{}\" xmlns=\"{GPX_NAMESPACE}\">",
        escape(GPX_CREATOR)
    ));
    out.push_str("\n  <metadata>");
    out.push_str(&format!("\n    <name>{name}</name>"));
    out.push_str(&format!("\n    <desc>{}</desc>", escape(GPX_DESCRIPTION)));
    out.push_str(&format!(
        "\n    <time>{}</time>",
        time.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));

    if let Some(keywords) = addresses.and_then(keywords) {
        out.push_str(&format!("\n    <keywords>{}</keywords>", escape(&keywords)));
    }

    out.push_str("\n  </metadata>");
    out.push_str("\n  <trk>");
    out.push_str(&format!("\n    <name>{name}</name>"));
    out.push_str("\n    <trkseg>");
    for pt in points {
        out.push_str(&format!(
            "\n      <trkpt lat=\"{}\" lon=\"{}\"></trkpt>",
            pt.lat, pt.lng
        ));
    }
    out.push_str("\n    </trkseg>");
    out.push_str("\n  </trk>");
    out.push_str("\n</gpx>");

    out
}

/// `Start: A, Waypoints: B, C, End: D`; `None` when there are no addresses.
fn keywords(addresses: &[GeocodedAddress]) -> Option<String> {
    let (first, rest) = addresses.split_first()?;
    let mut text = format!("Start: {}", first.label);

    if let Some((last, middle)) = rest.split_last() {
        if !middle.is_empty() {
            let labels: Vec<&str> = middle.iter().map(|a| a.label.as_str()).collect();
            text.push_str(&format!(", Waypoints: {}", labels.join(", ")));
        }
        text.push_str(&format!(", End: {}", last.label));
    }

    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_gpx;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap()
    }

    fn addr(label: &str) -> GeocodedAddress {
        GeocodedAddress {
            lat: 0.0,
            lng: 0.0,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_header_and_metadata() {
        let gpx = to_gpx_at(&[Point::new(37.5, 127.0)], "Loop", None, fixed_time());
        assert!(gpx.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(gpx.contains(r#"<gpx version="1.1" creator="GPX Route Viewer""#));
        assert!(gpx.contains("<desc>Route generated with OpenRouteService</desc>"));
        assert!(gpx.contains("<time>2025-01-01T09:30:00.000Z</time>"));
        assert!(!gpx.contains("<keywords>"));
        assert_eq!(gpx.matches("<name>Loop</name>").count(), 2);
    }

    #[test]
    fn test_points_written_without_elevation() {
        let pts = [
            Point::with_elevation(37.5665, 126.978, 38.0),
            Point::new(35.1151, 129.0415),
        ];
        let gpx = to_gpx_at(&pts, "r", None, fixed_time());
        assert!(gpx.contains(r#"<trkpt lat="37.5665" lon="126.978"></trkpt>"#));
        assert!(gpx.contains(r#"<trkpt lat="35.1151" lon="129.0415"></trkpt>"#));
        assert!(!gpx.contains("<ele>"));
    }

    #[test]
    fn test_keywords_single_address() {
        let gpx = to_gpx_at(&[], "r", Some(&[addr("A")][..]), fixed_time());
        assert!(gpx.contains("<keywords>Start: A</keywords>"));
    }

    #[test]
    fn test_keywords_two_addresses() {
        let gpx = to_gpx_at(&[], "r", Some(&[addr("A"), addr("B")][..]), fixed_time());
        assert!(gpx.contains("<keywords>Start: A, End: B</keywords>"));
    }

    #[test]
    fn test_keywords_with_waypoints() {
        let stops = [addr("A"), addr("B"), addr("C"), addr("D")];
        let gpx = to_gpx_at(&[], "r", Some(&stops[..]), fixed_time());
        assert!(gpx.contains("<keywords>Start: A, Waypoints: B, C, End: D</keywords>"));
    }

    #[test]
    fn test_empty_address_list_has_no_keywords() {
        let gpx = to_gpx_at(&[], "r", Some(&[][..]), fixed_time());
        assert!(!gpx.contains("<keywords>"));
    }

    #[test]
    fn test_name_is_escaped() {
        let gpx = to_gpx_at(&[], "A & B <x>", None, fixed_time());
        assert!(gpx.contains("<name>A &amp; B &lt;x&gt;</name>"));
        assert_eq!(parse_gpx(&gpx).name, "A & B <x>");
    }

    #[test]
    fn test_deterministic_for_fixed_clock() {
        let pts = [Point::new(1.0, 2.0), Point::new(3.0, 4.0)];
        let stops = [addr("A"), addr("B")];
        let a = to_gpx_at(&pts, "same", Some(&stops[..]), fixed_time());
        let b = to_gpx_at(&pts, "same", Some(&stops[..]), fixed_time());
        assert_eq!(a, b);
    }

    #[test]
    fn test_round_trip_keeps_coordinates() {
        let pts = vec![
            Point::with_elevation(37.554722, 126.970833, 12.0),
            Point::new(36.0, 127.5),
            Point::new(35.114967, 129.041428),
        ];
        let gpx = to_gpx(&pts, "round trip", None);
        let track = parse_gpx(&gpx);
        assert_eq!(track.name, "round trip");
        assert_eq!(track.points.len(), pts.len());
        for (got, want) in track.points.iter().zip(&pts) {
            assert_eq!(got.lat, want.lat);
            assert_eq!(got.lng, want.lng);
            assert_eq!(got.ele, None);
        }
    }
}
