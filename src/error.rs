use thiserror::Error;
use wasm_bindgen::JsValue;

/// Rejections at the file upload / download boundary.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("only .gpx files can be uploaded: {0}")]
    NotGpx(String),
    #[error("no track data found in {0}")]
    NoTrackData(String),
    #[error("nothing to download for {0}")]
    NothingToDownload(String),
}

/// Malformed encoded polyline input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("encoded polyline ends unexpectedly at byte {offset}")]
    Truncated { offset: usize },
    #[error("invalid byte 0x{byte:02x} in encoded polyline at byte {offset}")]
    InvalidByte { offset: usize, byte: u8 },
    #[error("encoded polyline value too long at byte {offset}")]
    Overflow { offset: usize },
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("at least two points are required, got {0}")]
    TooFewPoints(usize),
    #[error("unknown travel profile: {0}")]
    UnknownProfile(String),
    #[error("invalid API key")]
    Unauthorized,
    #[error("API rate limit exceeded")]
    RateLimited,
    #[error("address not found: {0}")]
    AddressNotFound(String),
    #[error("no route found")]
    NoRoute,
    #[error("unrecognized route geometry format")]
    UnknownGeometry,
    #[error("route planning failed: HTTP {0}")]
    Status(u16),
    #[error("route planning failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("route planning failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("route planning failed: {0}")]
    Polyline(#[from] PolylineError),
}

/// Location provider failures, plus the request guard's own rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("a location request is already in progress")]
    Busy,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("unable to determine location")]
    Unknown,
}

impl LocationError {
    /// Map a W3C `GeolocationPositionError.code`.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            _ => Self::Unknown,
        }
    }
}

impl From<UploadError> for JsValue {
    fn from(e: UploadError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

impl From<PolylineError> for JsValue {
    fn from(e: PolylineError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

impl From<RouteError> for JsValue {
    fn from(e: RouteError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

impl From<LocationError> for JsValue {
    fn from(e: LocationError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
