use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::gpx_types::{Point, Track, Waypoint};
use crate::library::GpxFile;
use crate::options::ConvertOptions;

/// Convert library entries to one GeoJSON FeatureCollection, in order.
pub fn to_feature_collection(files: &[GpxFile], opts: &ConvertOptions) -> FeatureCollection {
    collection(files.iter().flat_map(|f| file_to_features(f, opts)).collect())
}

/// Convert a bare parsed track, e.g. one not yet added to the library.
pub fn track_to_feature_collection(track: &Track, opts: &ConvertOptions) -> FeatureCollection {
    collection(track_to_feature(track, opts).into_iter().collect())
}

/// The track path as a LineString, or a Point when it has a single point.
/// Empty tracks produce nothing.
pub fn track_to_feature(track: &Track, opts: &ConvertOptions) -> Option<Feature> {
    let geometry = match track.points.as_slice() {
        [] => return None,
        [pt] => Value::Point(point_coords(pt, opts.include_elevation)),
        pts => Value::LineString(
            pts.iter()
                .map(|pt| point_coords(pt, opts.include_elevation))
                .collect(),
        ),
    };

    let mut props = Map::new();
    props.insert("gpxType".to_string(), JsonValue::String("track".to_string()));
    if opts.include_metadata {
        props.insert("name".to_string(), JsonValue::String(track.name.clone()));
    }

    Some(feature(geometry, props))
}

/// A library entry: its path styled with the entry's color, followed by
/// start/waypoint/end markers when it is a planned route.
pub fn file_to_features(file: &GpxFile, opts: &ConvertOptions) -> Vec<Feature> {
    let Some(mut path) = track_to_feature(&file.data, opts) else {
        return Vec::new();
    };

    if let Some(props) = path.properties.as_mut() {
        props.insert("id".to_string(), JsonValue::from(file.id));
        if opts.include_metadata {
            props.insert("name".to_string(), JsonValue::String(file.name.clone()));
            props.insert("color".to_string(), JsonValue::String(file.color.clone()));
            if let Some(info) = &file.route_info {
                insert_number(props, "distanceKm", info.distance_km);
                insert_number(props, "durationSecs", info.duration_secs);
            }
        }
    }

    let mut features = vec![path];
    if opts.include_waypoints {
        if let Some(info) = &file.route_info {
            features.extend(info.waypoints.iter().map(|w| waypoint_to_feature(w, file.id)));
        }
    }
    features
}

fn waypoint_to_feature(wpt: &Waypoint, file_id: u64) -> Feature {
    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String("waypoint".to_string()),
    );
    props.insert("id".to_string(), JsonValue::from(file_id));
    props.insert(
        "role".to_string(),
        JsonValue::String(wpt.role.as_str().to_string()),
    );
    props.insert("address".to_string(), JsonValue::String(wpt.address.clone()));

    feature(Value::Point(vec![wpt.lng, wpt.lat]), props)
}

/// Build [lng, lat] or [lng, lat, ele] coordinate array.
fn point_coords(pt: &Point, include_elevation: bool) -> Vec<f64> {
    match (include_elevation, pt.ele) {
        (true, Some(ele)) => vec![pt.lng, pt.lat, ele],
        _ => vec![pt.lng, pt.lat],
    }
}

fn insert_number(props: &mut Map<String, JsonValue>, key: &str, value: f64) {
    if let Some(n) = serde_json::Number::from_f64(value) {
        props.insert(key.to_string(), JsonValue::Number(n));
    }
}

fn feature(value: Value, props: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
