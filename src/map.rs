//! The map widget seam.
//!
//! The crate never touches a map SDK directly: callers construct a
//! [`MapService`] implementation (a JS binding in the browser, a recorder in
//! tests) and hand it to a [`MapController`].

use serde::Serialize;

use crate::gpx_types::Point;
use crate::library::{DEFAULT_TRACK_COLOR, GpxFile};

/// Seoul City Hall.
pub const DEFAULT_CENTER: Point = Point {
    lat: 37.5665,
    lng: 126.978,
    ele: None,
};
pub const DEFAULT_ZOOM_LEVEL: u8 = 8;
/// Zoom level used when jumping to the user's position.
pub const LOCATION_ZOOM_LEVEL: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    /// Smallest box containing every point; `None` for an empty path.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let init = Self {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        Some(rest.iter().fold(init, |b, p| Self {
            south: b.south.min(p.lat),
            west: b.west.min(p.lng),
            north: b.north.max(p.lat),
            east: b.east.max(p.lng),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeKind {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeStyle {
    pub weight: u32,
    pub color: String,
    pub opacity: f64,
    pub kind: StrokeKind,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            weight: 4,
            color: DEFAULT_TRACK_COLOR.to_string(),
            opacity: 0.8,
            kind: StrokeKind::Solid,
        }
    }
}

impl StrokeStyle {
    pub fn with_color(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            ..Self::default()
        }
    }
}

/// Operations the core needs from an interactive map.
pub trait MapService {
    /// Draw a path on top of whatever is already drawn.
    fn render(&mut self, path: &[Point], style: &StrokeStyle);
    /// Remove every path drawn so far.
    fn clear(&mut self);
    fn set_viewport(&mut self, bounds: LatLngBounds);
    fn set_center(&mut self, center: Point, level: u8);
    fn on_zoom_change(&mut self, handler: Box<dyn FnMut(u8)>);
}

/// Keeps exactly one library entry drawn on the map.
#[derive(Debug)]
pub struct MapController<M> {
    map: M,
}

impl<M: MapService> MapController<M> {
    pub fn new(map: M) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    /// Replace the drawn path with `file`'s and fit the view to it.
    /// Returns `false`, leaving the map untouched, when the track is empty.
    pub fn show_file(&mut self, file: &GpxFile) -> bool {
        let Some(bounds) = LatLngBounds::from_points(&file.data.points) else {
            return false;
        };
        self.map.clear();
        self.map
            .render(&file.data.points, &StrokeStyle::with_color(&file.color));
        self.map.set_viewport(bounds);
        true
    }

    /// Drop every path and return to the initial view.
    pub fn reset(&mut self) {
        self.map.clear();
        self.map.set_center(DEFAULT_CENTER, DEFAULT_ZOOM_LEVEL);
    }

    pub fn show_location(&mut self, position: Point) {
        self.map.set_center(position, LOCATION_ZOOM_LEVEL);
    }

    pub fn watch_zoom(&mut self, handler: impl FnMut(u8) + 'static) {
        self.map.on_zoom_change(Box::new(handler));
    }
}
