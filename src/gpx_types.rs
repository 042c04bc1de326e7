use serde::{Deserialize, Serialize};

/// Name given to a track whose document carries no `<name>`.
pub const UNKNOWN_ROUTE_NAME: &str = "Unknown Route";

/// A single track or route point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng, ele: None }
    }

    pub fn with_elevation(lat: f64, lng: f64, ele: f64) -> Self {
        Self {
            lat,
            lng,
            ele: Some(ele),
        }
    }
}

/// A named, ordered path. Point order is the direction the path is drawn in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub points: Vec<Point>,
}

impl Track {
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// A track without points must not be rendered or exported.
    pub fn is_displayable(&self) -> bool {
        !self.points.is_empty()
    }
}

/// Output of one successful route planning call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub points: Vec<Point>,
    pub distance_km: f64,
    pub duration_secs: f64,
}

/// Top geocoding match for one queried address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub lat: f64,
    pub lng: f64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointRole {
    Start,
    Waypoint,
    End,
}

impl WaypointRole {
    /// Role of the entry at `index` in a list of `len` stops.
    pub fn for_index(index: usize, len: usize) -> Self {
        if index == 0 {
            Self::Start
        } else if index + 1 == len {
            Self::End
        } else {
            Self::Waypoint
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Waypoint => "waypoint",
            Self::End => "end",
        }
    }
}

/// A stop on a planned route, labelled with the address the user asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
    #[serde(rename = "type")]
    pub role: WaypointRole,
}

/// Build waypoints from geocoded stops. `labels` overrides the geocoder's label
/// per index; missing entries fall back to it.
pub fn waypoints_for(addresses: &[GeocodedAddress], labels: &[String]) -> Vec<Waypoint> {
    let len = addresses.len();
    addresses
        .iter()
        .enumerate()
        .map(|(i, addr)| Waypoint {
            lat: addr.lat,
            lng: addr.lng,
            address: labels.get(i).unwrap_or(&addr.label).clone(),
            role: WaypointRole::for_index(i, len),
        })
        .collect()
}
