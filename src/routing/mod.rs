//! Route planning against a remote geocoding + directions service.

mod ors;
mod planner;

pub use ors::{OrsClient, check_status, first_match};
pub use planner::{PlannedRoute, RoutePlanner};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use geojson::Value;
use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::gpx_types::{GeocodedAddress, Point};
use crate::polyline;

/// Travel mode, named as the directions endpoint expects it in its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    #[default]
    FootWalking,
    FootHiking,
    CyclingRegular,
    DrivingCar,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FootWalking => "foot-walking",
            Self::FootHiking => "foot-hiking",
            Self::CyclingRegular => "cycling-regular",
            Self::DrivingCar => "driving-car",
        }
    }

    /// Short name used in generated route names.
    pub fn label(self) -> &'static str {
        match self {
            Self::FootWalking => "walking",
            Self::FootHiking => "running",
            Self::CyclingRegular => "cycling",
            Self::DrivingCar => "driving",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "foot-walking" => Ok(Self::FootWalking),
            "foot-hiking" => Ok(Self::FootHiking),
            "cycling-regular" => Ok(Self::CyclingRegular),
            "driving-car" => Ok(Self::DrivingCar),
            other => Err(RouteError::UnknownProfile(other.to_string())),
        }
    }
}

/// Remote geocoding and directions calls.
///
/// Futures are not `Send`: in the browser everything runs on one thread.
#[async_trait(?Send)]
pub trait RoutingApi {
    /// Top match for `text`, or `None` when nothing matched.
    async fn geocode(&self, text: &str) -> Result<Option<GeocodedAddress>, RouteError>;

    async fn directions(
        &self,
        profile: Profile,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, RouteError>;
}

/// Body of a directions request. Coordinates are `[lng, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsRequest {
    pub coordinates: Vec<[f64; 2]>,
    pub format: &'static str,
    pub instructions: bool,
    pub geometry_simplify: bool,
}

impl DirectionsRequest {
    pub fn new(points: &[Point]) -> Self {
        Self {
            coordinates: points.iter().map(|p| [p.lng, p.lat]).collect(),
            format: "json",
            instructions: false,
            geometry_simplify: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

/// A route must carry its summary; one without it is a decode error.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsRoute {
    #[serde(default)]
    pub geometry: RouteGeometry,
    pub summary: RouteSummary,
}

/// Route geometry as returned by the directions endpoint: an encoded polyline
/// string by default, GeoJSON when the service is asked for it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RouteGeometry {
    Encoded(String),
    GeoJson(geojson::Geometry),
    /// A bare `{"coordinates": [[lng, lat], ...]}` object without a `type`.
    Coordinates { coordinates: Vec<Vec<f64>> },
    Other(serde_json::Value),
}

impl Default for RouteGeometry {
    fn default() -> Self {
        Self::Other(serde_json::Value::Null)
    }
}

/// Distance in meters, duration in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteSummary {
    pub distance: f64,
    pub duration: f64,
}

/// Decode a directions response body.
pub fn parse_directions(body: &str) -> Result<DirectionsResponse, RouteError> {
    Ok(serde_json::from_str(body)?)
}

/// Flatten either geometry shape into points.
pub fn normalize_geometry(geometry: &RouteGeometry) -> Result<Vec<Point>, RouteError> {
    match geometry {
        RouteGeometry::Encoded(encoded) => Ok(polyline::decode_points(encoded)?),
        RouteGeometry::GeoJson(geometry) => match &geometry.value {
            Value::LineString(line) => Ok(positions_to_points(line)),
            Value::MultiLineString(lines) => {
                Ok(lines.iter().flat_map(|l| positions_to_points(l)).collect())
            }
            _ => Err(RouteError::UnknownGeometry),
        },
        RouteGeometry::Coordinates { coordinates } => Ok(positions_to_points(coordinates)),
        RouteGeometry::Other(_) => Err(RouteError::UnknownGeometry),
    }
}

fn positions_to_points(positions: &[Vec<f64>]) -> Vec<Point> {
    positions
        .iter()
        .filter_map(|pos| match pos.as_slice() {
            [lng, lat, ..] => Some(Point::new(*lat, *lng)),
            _ => None,
        })
        .collect()
}
