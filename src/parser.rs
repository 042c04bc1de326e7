use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::gpx_types::{Point, Track, UNKNOWN_ROUTE_NAME};

/// Parse GPX XML text into a [`Track`].
///
/// Never fails: missing or unreadable coordinates default to `0`, and malformed
/// XML stops the scan while keeping whatever was read up to that point. A track
/// with no points is the caller's signal that the document held no route data.
///
/// Points come from `<rtept>` elements when there are any, otherwise from
/// `<trkpt>`; the two are never mixed.
pub fn parse_gpx(xml: &str) -> Track {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = false;

    let mut state = ParseState::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                state.depth += 1;
                state.open_element(&e, false);
            }
            Ok(Event::Empty(e)) => {
                state.depth += 1;
                state.open_element(&e, true);
                state.close_element();
                state.depth -= 1;
            }
            Ok(Event::End(_)) => {
                state.close_element();
                state.depth = state.depth.saturating_sub(1);
            }
            Ok(Event::Text(e)) => {
                state.push_text(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                state.push_text(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    state.push_text(ch.encode_utf8(&mut [0; 4]));
                } else {
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    if let Some(resolved) = predefined_entity(name) {
                        state.push_text(resolved);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("GPX parse stopped at byte {}: {e}", reader.error_position());
                break;
            }
            _ => {}
        }
    }

    state.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointKind {
    Route,
    Track,
}

/// A `<rtept>`/`<trkpt>` whose end tag has not been seen yet.
#[derive(Debug)]
struct OpenPoint {
    kind: PointKind,
    depth: usize,
    lat: f64,
    lng: f64,
    ele: Option<f64>,
    /// Depth of the `<ele>` currently being read.
    ele_depth: Option<usize>,
    ele_seen: bool,
    ele_text: String,
}

impl OpenPoint {
    fn into_point(self) -> Point {
        Point {
            lat: self.lat,
            lng: self.lng,
            ele: self.ele,
        }
    }
}

#[derive(Debug, Default)]
struct ParseState {
    depth: usize,
    name: Option<String>,
    name_depth: Option<usize>,
    name_text: String,
    point: Option<OpenPoint>,
    route_points: Vec<Point>,
    track_points: Vec<Point>,
}

impl ParseState {
    fn open_element(&mut self, e: &BytesStart<'_>, empty: bool) {
        let depth = self.depth;
        match e.local_name().as_ref() {
            b"name" if self.name.is_none() && self.name_depth.is_none() => {
                self.name_depth = Some(depth);
            }
            b"rtept" if self.point.is_none() => {
                self.point = Some(open_point(e, PointKind::Route, depth));
            }
            b"trkpt" if self.point.is_none() => {
                self.point = Some(open_point(e, PointKind::Track, depth));
            }
            b"ele" => {
                if let Some(pt) = self.point.as_mut().filter(|pt| !pt.ele_seen) {
                    pt.ele_seen = true;
                    pt.ele_depth = Some(depth);
                    if empty {
                        pt.ele_text.clear();
                    }
                }
            }
            _ => {}
        }
    }

    fn close_element(&mut self) {
        let depth = self.depth;

        if self.name_depth == Some(depth) {
            self.name_depth = None;
            self.name = Some(std::mem::take(&mut self.name_text));
        }

        if let Some(pt) = self.point.as_mut() {
            if pt.ele_depth == Some(depth) {
                pt.ele_depth = None;
                pt.ele = parse_elevation(&pt.ele_text);
            }
            if pt.depth == depth {
                self.finish_point();
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.name_depth.is_some() {
            self.name_text.push_str(text);
        }
        if let Some(pt) = self.point.as_mut() {
            if pt.ele_depth.is_some() {
                pt.ele_text.push_str(text);
            }
        }
    }

    fn finish_point(&mut self) {
        if let Some(pt) = self.point.take() {
            match pt.kind {
                PointKind::Route => self.route_points.push(pt.into_point()),
                PointKind::Track => self.track_points.push(pt.into_point()),
            }
        }
    }

    fn finish(mut self) -> Track {
        // Unterminated document: keep the point that was being read.
        if let Some(pt) = self.point.as_mut() {
            if pt.ele_depth.take().is_some() {
                pt.ele = parse_elevation(&pt.ele_text);
            }
            self.finish_point();
        }

        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ROUTE_NAME.to_string());

        let points = if self.route_points.is_empty() {
            debug!("GPX: {} track points", self.track_points.len());
            self.track_points
        } else {
            debug!("GPX: {} route points", self.route_points.len());
            self.route_points
        };

        Track { name, points }
    }
}

fn open_point(e: &BytesStart<'_>, kind: PointKind, depth: usize) -> OpenPoint {
    let mut lat = 0.0;
    let mut lng = 0.0;

    for attr in e.attributes().flatten() {
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = parse_coordinate(val),
            b"lon" => lng = parse_coordinate(val),
            _ => {}
        }
    }

    OpenPoint {
        kind,
        depth,
        lat,
        lng,
        ele: None,
        ele_depth: None,
        ele_seen: false,
        ele_text: String::new(),
    }
}

/// Coordinates default to 0 when unreadable.
fn parse_coordinate(val: &str) -> f64 {
    val.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// An `<ele>` with no text counts as 0; unreadable text leaves elevation unset.
fn parse_elevation(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn predefined_entity(name: &str) -> Option<&'static str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        _ => None,
    }
}
