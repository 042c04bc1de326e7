use async_trait::async_trait;
use geojson::FeatureCollection;
use log::debug;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};

use super::{DirectionsRequest, DirectionsResponse, Profile, RoutingApi, parse_directions};
use crate::error::RouteError;
use crate::gpx_types::GeocodedAddress;
use crate::options::RouteServiceConfig;

/// OpenRouteService HTTP client.
#[derive(Debug, Clone)]
pub struct OrsClient {
    http: reqwest::Client,
    config: RouteServiceConfig,
}

impl OrsClient {
    pub fn new(config: RouteServiceConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: RouteServiceConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &RouteServiceConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// `GET {base}/geocode/search` for the single best match of `text`.
    pub fn geocode_request(&self, text: &str) -> Result<reqwest::Request, RouteError> {
        Ok(self
            .http
            .get(self.url("/geocode/search"))
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("text", text),
                ("boundary.country", self.config.country.as_str()),
                ("size", "1"),
            ])
            .build()?)
    }

    /// `POST {base}/v2/directions/{profile}` with the key in `Authorization`.
    pub fn directions_request(
        &self,
        profile: Profile,
        request: &DirectionsRequest,
    ) -> Result<reqwest::Request, RouteError> {
        Ok(self
            .http
            .post(self.url(&format!("/v2/directions/{profile}")))
            .header(AUTHORIZATION, self.config.api_key.as_str())
            .header(ACCEPT, "application/json")
            .json(request)
            .build()?)
    }
}

#[async_trait(?Send)]
impl RoutingApi for OrsClient {
    async fn geocode(&self, text: &str) -> Result<Option<GeocodedAddress>, RouteError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        debug!("geocoding {text:?}");
        let response = self.http.execute(self.geocode_request(text)?).await?;
        check_status(response.status())?;

        let matches: FeatureCollection = response.json().await?;
        Ok(first_match(&matches, text))
    }

    async fn directions(
        &self,
        profile: Profile,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, RouteError> {
        debug!(
            "requesting {profile} directions through {} points",
            request.coordinates.len()
        );
        let response = self
            .http
            .execute(self.directions_request(profile, request)?)
            .await?;
        check_status(response.status())?;

        parse_directions(&response.text().await?)
    }
}

/// Map an HTTP status onto the planning failure it stands for.
pub fn check_status(status: StatusCode) -> Result<(), RouteError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::UNAUTHORIZED {
        Err(RouteError::Unauthorized)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Err(RouteError::RateLimited)
    } else {
        Err(RouteError::Status(status.as_u16()))
    }
}

/// First feature of a geocoding response as `[lng, lat]` plus its label.
/// The query itself stands in for a missing label.
pub fn first_match(matches: &FeatureCollection, query: &str) -> Option<GeocodedAddress> {
    let feature = matches.features.first()?;
    let geometry = feature.geometry.as_ref()?;
    let geojson::Value::Point(position) = &geometry.value else {
        return None;
    };
    let [lng, lat, ..] = position.as_slice() else {
        return None;
    };

    let label = feature
        .property("label")
        .and_then(|v| v.as_str())
        .filter(|l| !l.is_empty())
        .unwrap_or(query);

    Some(GeocodedAddress {
        lat: *lat,
        lng: *lng,
        label: label.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpx_types::Point;

    fn collection(json: &str) -> FeatureCollection {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED),
            Err(RouteError::Unauthorized)
        ));
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS),
            Err(RouteError::RateLimited)
        ));
        assert!(matches!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(RouteError::Status(500))
        ));
    }

    #[test]
    fn test_first_match_reads_lng_lat() {
        let fc = collection(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Point","coordinates":[126.9707,37.5547]},
                 "properties":{"label":"Seoul Station, Seoul, South Korea"}}]}"#,
        );
        let found = first_match(&fc, "서울역").unwrap();
        assert_eq!(found.lat, 37.5547);
        assert_eq!(found.lng, 126.9707);
        assert_eq!(found.label, "Seoul Station, Seoul, South Korea");
    }

    #[test]
    fn test_first_match_label_falls_back_to_query() {
        let fc = collection(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Point","coordinates":[129.04,35.11]},"properties":{}}]}"#,
        );
        assert_eq!(first_match(&fc, "부산역").unwrap().label, "부산역");
    }

    #[test]
    fn test_no_features_is_no_match() {
        let fc = collection(r#"{"type":"FeatureCollection","features":[]}"#);
        assert!(first_match(&fc, "nowhere").is_none());
    }

    fn client() -> OrsClient {
        OrsClient::new(RouteServiceConfig {
            api_key: "test-key".to_string(),
            base_url: "http://127.0.0.1:9/".to_string(),
            country: "KR".to_string(),
        })
    }

    #[test]
    fn test_geocode_request_query() {
        let req = client().geocode_request("서울역").unwrap();
        assert_eq!(req.method(), reqwest::Method::GET);
        assert_eq!(req.url().path(), "/geocode/search");

        let pairs: Vec<(String, String)> = req.url().query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("api_key".to_string(), "test-key".to_string()),
                ("text".to_string(), "서울역".to_string()),
                ("boundary.country".to_string(), "KR".to_string()),
                ("size".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_directions_request_path_headers_body() {
        let body = DirectionsRequest::new(&[Point::new(37.55, 126.97), Point::new(35.11, 129.04)]);
        let req = client().directions_request(Profile::CyclingRegular, &body).unwrap();

        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(req.url().as_str(), "http://127.0.0.1:9/v2/directions/cycling-regular");
        assert_eq!(req.headers()[AUTHORIZATION], "test-key");
        assert_eq!(req.headers()[ACCEPT], "application/json");

        let bytes = req.body().and_then(|b| b.as_bytes()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(json["coordinates"][1][0], 129.04);
        assert_eq!(json["format"], "json");
    }

    #[tokio::test]
    async fn test_blank_query_sends_nothing() {
        // nothing listens on the discard port; a request would fail
        assert!(client().geocode("   ").await.unwrap().is_none());
        assert!(client().geocode("").await.unwrap().is_none());
    }

    #[test]
    fn test_url_joins_base() {
        let client = OrsClient::new(RouteServiceConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..RouteServiceConfig::default()
        });
        assert_eq!(
            client.url("/v2/directions/driving-car"),
            "http://localhost:8080/v2/directions/driving-car"
        );
    }
}
