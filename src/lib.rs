pub mod converter;
pub mod error;
pub mod geolocation;
pub mod gpx_types;
pub mod library;
pub mod logging;
pub mod map;
pub mod options;
pub mod parser;
pub mod polyline;
pub mod routing;
pub mod writer;

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::error::LocationError;
use crate::gpx_types::{GeocodedAddress, Point, Track};
use crate::library::GpxFile;
use crate::options::{ConvertOptions, GeolocationOptions, RouteServiceConfig};
use crate::routing::{OrsClient, PlannedRoute, Profile, RoutePlanner};

/// Parse GPX text into `{ name, points }`. Never fails; an unreadable
/// document yields an empty point list.
#[wasm_bindgen(js_name = parseGpx)]
pub fn parse_gpx(gpx_string: &str) -> Result<JsValue, JsValue> {
    setup();

    to_js(&parser::parse_gpx(gpx_string))
}

/// Parse an uploaded file, rejecting non-`.gpx` names and empty tracks.
#[wasm_bindgen(js_name = loadGpxFile)]
pub fn load_gpx_file(file_name: &str, text: &str) -> Result<JsValue, JsValue> {
    setup();

    let track = library::load_gpx_file(file_name, text)?;
    to_js(&track)
}

/// Convert a track (as returned by `parseGpx`) to a GeoJSON FeatureCollection.
#[wasm_bindgen(js_name = trackToGeoJson)]
pub fn track_to_geojson(track: JsValue, options: JsValue) -> Result<JsValue, JsValue> {
    setup();

    let track: Track = from_js(track)?;
    let opts: ConvertOptions = optional_from_js(options)?;
    to_js(&converter::track_to_feature_collection(&track, &opts))
}

/// Serialize points to GPX 1.1 text stamped with the current time.
#[wasm_bindgen(js_name = toGpx)]
pub fn to_gpx(points: JsValue, name: &str, addresses: JsValue) -> Result<String, JsValue> {
    setup();

    let points: Vec<Point> = from_js(points)?;
    let addresses: Option<Vec<GeocodedAddress>> = optional_from_js(addresses)?;
    Ok(writer::to_gpx(&points, name, addresses.as_deref()))
}

/// Decode an encoded polyline into `[lng, lat]` pairs.
#[wasm_bindgen(js_name = decodePolyline)]
pub fn decode_polyline(encoded: &str) -> Result<JsValue, JsValue> {
    setup();

    to_js(&polyline::decode(encoded)?)
}

/// Geocode `addresses` in order and plan a route through them. Resolves to a
/// library entry with downloadable GPX.
#[wasm_bindgen(js_name = planRoute)]
pub async fn plan_route(
    addresses: JsValue,
    profile: String,
    config: JsValue,
) -> Result<JsValue, JsValue> {
    setup();

    let addresses: Vec<String> = from_js(addresses)?;
    let profile: Profile = profile.parse()?;
    let planner = planner(config)?;
    let planned = planner.plan_addresses(profile, &addresses).await?;
    let labels: Vec<String> = addresses
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    route_file(&labels, &planned, profile)
}

/// Plan a route through pinned `{ lat, lng }` points without geocoding.
#[wasm_bindgen(js_name = planRouteFromPoints)]
pub async fn plan_route_from_points(
    points: JsValue,
    profile: String,
    config: JsValue,
) -> Result<JsValue, JsValue> {
    setup();

    let points: Vec<Point> = from_js(points)?;
    let profile: Profile = profile.parse()?;
    let planner = planner(config)?;
    let planned = planner.plan_coordinates(profile, &points).await?;
    route_file(&[], &planned, profile)
}

#[wasm_bindgen(js_name = downloadFileName)]
pub fn download_file_name(name: &str) -> String {
    library::download_file_name(name)
}

/// Guarded one-shot location requests. The caller performs the provider call
/// and reports back through `onSuccess`/`onError`, then polls for errors that
/// survived the grace period.
#[wasm_bindgen(js_name = LocationTracker)]
pub struct JsLocationTracker {
    inner: geolocation::LocationTracker,
}

#[wasm_bindgen(js_class = LocationTracker)]
impl JsLocationTracker {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsLocationTracker, JsValue> {
        setup();

        let options: GeolocationOptions = optional_from_js(options)?;
        Ok(Self {
            inner: geolocation::LocationTracker::new(options),
        })
    }

    /// Returns the provider options to use for this request.
    pub fn request(&mut self, supported: bool) -> Result<JsValue, JsValue> {
        let options = self.inner.request(supported)?;
        to_js(options)
    }

    #[wasm_bindgen(js_name = onSuccess)]
    pub fn on_success(&mut self, lat: f64, lng: f64, accuracy: Option<f64>) {
        self.inner.on_success(geolocation::Position { lat, lng, accuracy });
    }

    /// `code` is the provider's error code (1 denied, 2 unavailable, 3 timeout).
    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&mut self, code: u16) {
        self.inner.on_error(LocationError::from_code(code), now());
    }

    /// Message of an error that is due for display, if any.
    pub fn poll(&mut self) -> Option<String> {
        self.inner.poll(now()).map(|e| e.to_string())
    }

    #[wasm_bindgen(getter)]
    pub fn busy(&self) -> bool {
        self.inner.is_busy()
    }
}

fn setup() {
    console_error_panic_hook::set_once();
    logging::init();
}

fn planner(config: JsValue) -> Result<RoutePlanner<OrsClient>, JsValue> {
    let config: RouteServiceConfig = optional_from_js(config)?;
    Ok(RoutePlanner::new(OrsClient::new(config)))
}

fn route_file(
    labels: &[String],
    planned: &PlannedRoute,
    profile: Profile,
) -> Result<JsValue, JsValue> {
    let now = Utc::now();
    let id = now.timestamp_millis().max(0) as u64;
    to_js(&GpxFile::from_planned_route(id, labels, planned, profile, now))
}

fn now() -> Duration {
    Duration::from_millis(js_sys::Date::now().max(0.0) as u64)
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// `undefined`/`null` fall back to the default.
fn optional_from_js<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        Ok(T::default())
    } else {
        from_js(value)
    }
}
