use log::info;
use serde::Serialize;

use super::{DirectionsRequest, Profile, RoutingApi, normalize_geometry};
use crate::error::RouteError;
use crate::gpx_types::{GeocodedAddress, Point, RouteResult};

/// A planned route together with the stops it was planned through.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedRoute {
    pub route: RouteResult,
    pub addresses: Vec<GeocodedAddress>,
}

/// Turns addresses or pinned points into a [`RouteResult`].
#[derive(Debug)]
pub struct RoutePlanner<A> {
    api: A,
}

impl<A: RoutingApi> RoutePlanner<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Geocode each address in turn, then route through the matches.
    ///
    /// Blank entries are dropped. Geocoding is strictly sequential, and the
    /// first address without a match aborts before any directions request.
    pub async fn plan_addresses<S: AsRef<str>>(
        &self,
        profile: Profile,
        addresses: &[S],
    ) -> Result<PlannedRoute, RouteError> {
        let addresses: Vec<&str> = addresses
            .iter()
            .map(|a| a.as_ref().trim())
            .filter(|a| !a.is_empty())
            .collect();
        if addresses.len() < 2 {
            return Err(RouteError::TooFewPoints(addresses.len()));
        }

        info!("geocoding {} addresses", addresses.len());
        let mut geocoded = Vec::with_capacity(addresses.len());
        for address in &addresses {
            match self.api.geocode(address).await? {
                Some(found) => geocoded.push(found),
                None => return Err(RouteError::AddressNotFound(address.to_string())),
            }
        }

        let points: Vec<Point> = geocoded.iter().map(|a| Point::new(a.lat, a.lng)).collect();
        let route = self.calculate_route(profile, &points).await?;

        Ok(PlannedRoute {
            route,
            addresses: geocoded,
        })
    }

    /// Route through already-resolved points, e.g. pins dropped on the map.
    /// Each point is labelled with its own coordinates.
    pub async fn plan_coordinates(
        &self,
        profile: Profile,
        points: &[Point],
    ) -> Result<PlannedRoute, RouteError> {
        let route = self.calculate_route(profile, points).await?;
        let addresses = points
            .iter()
            .map(|p| GeocodedAddress {
                lat: p.lat,
                lng: p.lng,
                label: format!("{:.6}, {:.6}", p.lat, p.lng),
            })
            .collect();

        Ok(PlannedRoute { route, addresses })
    }

    /// One directions request through `points`, in order.
    pub async fn calculate_route(
        &self,
        profile: Profile,
        points: &[Point],
    ) -> Result<RouteResult, RouteError> {
        if points.len() < 2 {
            return Err(RouteError::TooFewPoints(points.len()));
        }

        let request = DirectionsRequest::new(points);
        let response = self.api.directions(profile, &request).await?;
        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or(RouteError::NoRoute)?;

        let path = normalize_geometry(&route.geometry)?;
        if path.is_empty() {
            return Err(RouteError::NoRoute);
        }

        info!(
            "{profile} route: {} points, {:.0} m",
            path.len(),
            route.summary.distance
        );
        Ok(RouteResult {
            points: path,
            distance_km: route.summary.distance / 1000.0,
            duration_secs: route.summary.duration,
        })
    }
}
