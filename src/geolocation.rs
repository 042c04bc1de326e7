//! One-shot location requests against the platform provider.
//!
//! Providers sometimes report an error shortly before or after a success for
//! the same request. Errors are therefore held for a grace period and only
//! surfaced by [`LocationTracker::poll`] if no success arrived meanwhile.

use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::LocationError;
use crate::gpx_types::Point;
use crate::options::GeolocationOptions;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
    /// Radius in meters, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy: None,
        }
    }

    pub fn to_point(self) -> Point {
        Point::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationState {
    Idle,
    Requesting,
    Resolved(Position),
    /// An error waiting out the grace period. `succeeded` marks an error that
    /// trails a success and will be dropped.
    ErrorPending {
        error: LocationError,
        deadline: Duration,
        succeeded: bool,
    },
}

/// Guards the provider so that only one request is outstanding at a time.
///
/// Instants are plain offsets from an arbitrary epoch supplied by the caller.
#[derive(Debug, Clone)]
pub struct LocationTracker {
    state: LocationState,
    options: GeolocationOptions,
    last_position: Option<Position>,
}

impl Default for LocationTracker {
    fn default() -> Self {
        Self::new(GeolocationOptions::default())
    }
}

impl LocationTracker {
    pub fn new(options: GeolocationOptions) -> Self {
        Self {
            state: LocationState::Idle,
            options,
            last_position: None,
        }
    }

    pub fn state(&self) -> LocationState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            LocationState::Requesting
                | LocationState::ErrorPending {
                    succeeded: false,
                    ..
                }
        )
    }

    /// Start a request. On success the caller should ask the provider for a
    /// position using the returned options.
    pub fn request(&mut self, supported: bool) -> Result<&GeolocationOptions, LocationError> {
        if !supported {
            warn!("geolocation provider missing");
            return Err(LocationError::Unsupported);
        }
        if self.is_busy() {
            debug!("location request ignored, one is outstanding");
            return Err(LocationError::Busy);
        }

        self.state = LocationState::Requesting;
        Ok(&self.options)
    }

    pub fn on_success(&mut self, position: Position) {
        debug!("location resolved: {}, {}", position.lat, position.lng);
        self.last_position = Some(position);
        self.state = LocationState::Resolved(position);
    }

    pub fn on_error(&mut self, error: LocationError, now: Duration) {
        let succeeded = matches!(self.state, LocationState::Resolved(_));
        debug!("location error {error:?}, holding for grace period");
        self.state = LocationState::ErrorPending {
            error,
            deadline: now + Duration::from_millis(u64::from(self.options.error_grace_ms)),
            succeeded,
        };
    }

    /// Surface a pending error once its grace period is over.
    pub fn poll(&mut self, now: Duration) -> Option<LocationError> {
        let LocationState::ErrorPending {
            error,
            deadline,
            succeeded,
        } = self.state
        else {
            return None;
        };
        if now < deadline {
            return None;
        }

        if succeeded {
            debug!("dropping location error that trailed a success");
            self.state = match self.last_position {
                Some(position) => LocationState::Resolved(position),
                None => LocationState::Idle,
            };
            None
        } else {
            warn!("location request failed: {error}");
            self.state = LocationState::Idle;
            Some(error)
        }
    }
}
