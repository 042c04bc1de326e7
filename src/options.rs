use serde::{Deserialize, Serialize};

pub const DEFAULT_ORS_BASE_URL: &str = "https://api.openrouteservice.org";
pub const DEFAULT_COUNTRY: &str = "KR";

/// Options for Track to GeoJSON conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Include elevation as the 3rd coordinate value (default: true)
    #[serde(default = "default_true")]
    pub include_elevation: bool,

    /// Include name, color and route summary in properties (default: true)
    #[serde(default = "default_true")]
    pub include_metadata: bool,

    /// Emit start/waypoint/end markers for planned routes (default: true)
    #[serde(default = "default_true")]
    pub include_waypoints: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            include_elevation: true,
            include_metadata: true,
            include_waypoints: true,
        }
    }
}

/// Connection settings for the OpenRouteService API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteServiceConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Country filter applied to geocoding queries (default: "KR")
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for RouteServiceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            country: default_country(),
        }
    }
}

impl RouteServiceConfig {
    /// Read `ORS_API_KEY`, `ORS_BASE_URL` and `ORS_COUNTRY`, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: lookup("ORS_API_KEY").unwrap_or(defaults.api_key),
            base_url: lookup("ORS_BASE_URL").unwrap_or(defaults.base_url),
            country: lookup("ORS_COUNTRY").unwrap_or(defaults.country),
        }
    }
}

/// Settings passed to the location provider, plus the delay before a
/// location error is reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationOptions {
    #[serde(default = "default_true")]
    pub enable_high_accuracy: bool,

    /// Provider timeout in milliseconds (default: 15000)
    #[serde(default = "default_location_timeout")]
    pub timeout: u32,

    /// Maximum age of a cached position in milliseconds (default: 300000)
    #[serde(default = "default_maximum_age")]
    pub maximum_age: u32,

    /// How long an error waits for a late success before being reported (default: 1000)
    #[serde(default = "default_error_grace")]
    pub error_grace_ms: u32,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: default_location_timeout(),
            maximum_age: default_maximum_age(),
            error_grace_ms: default_error_grace(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_ORS_BASE_URL.to_string()
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_location_timeout() -> u32 {
    15_000
}

fn default_maximum_age() -> u32 {
    300_000
}

fn default_error_grace() -> u32 {
    1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_config_defaults_from_partial_json() {
        let cfg: RouteServiceConfig = serde_json::from_str(r#"{"apiKey":"k"}"#).unwrap();
        assert_eq!(cfg.api_key, "k");
        assert_eq!(cfg.base_url, DEFAULT_ORS_BASE_URL);
        assert_eq!(cfg.country, "KR");
    }

    #[test]
    fn test_route_config_from_lookup() {
        let cfg = RouteServiceConfig::from_lookup(|key| match key {
            "ORS_API_KEY" => Some("secret".to_string()),
            "ORS_COUNTRY" => Some("JP".to_string()),
            _ => None,
        });
        assert_eq!(cfg.api_key, "secret");
        assert_eq!(cfg.base_url, DEFAULT_ORS_BASE_URL);
        assert_eq!(cfg.country, "JP");
    }

    #[test]
    fn test_convert_options_defaults() {
        let opts: ConvertOptions = serde_json::from_str(r#"{"includeElevation":false}"#).unwrap();
        assert!(!opts.include_elevation);
        assert!(opts.include_metadata);
        assert!(opts.include_waypoints);
    }

    #[test]
    fn test_geolocation_defaults() {
        let opts = GeolocationOptions::default();
        assert!(opts.enable_high_accuracy);
        assert_eq!(opts.timeout, 15_000);
        assert_eq!(opts.maximum_age, 300_000);
        assert_eq!(opts.error_grace_ms, 1_000);
    }
}
