// kirana/src/geo.rs

//! Coordinates, distance, and the geolocation / geocoding / routing seams.
//!
//! Geolocation failures are typed because each cause gets its own message.
//! Geocoding and routing are enrichments: their failures degrade silently to
//! the previous address text or a straight-line estimate.

use crate::model::Store;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  #[serde(alias = "latitude")]
  pub lat: f64,
  #[serde(alias = "longitude", alias = "lon")]
  pub lng: f64,
}

impl GeoPoint {
  pub fn new(lat: f64, lng: f64) -> Self {
    GeoPoint { lat, lng }
  }

  pub fn is_valid(&self) -> bool {
    self.lat.is_finite() && self.lng.is_finite() && self.lat.abs() <= 90.0 && self.lng.abs() <= 180.0
  }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
  let d_lat = (b.lat - a.lat).to_radians();
  let d_lng = (b.lng - a.lng).to_radians();
  let h = (d_lat / 2.0).sin().powi(2) + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
  2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// A position reading with its accuracy radius in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFix {
  pub point: GeoPoint,
  pub accuracy_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeoError {
  #[error("location permission denied")]
  PermissionDenied,
  #[error("position unavailable")]
  PositionUnavailable,
  #[error("location request timed out")]
  Timeout,
}

impl GeoError {
  pub fn user_message(&self) -> &'static str {
    match self {
      GeoError::PermissionDenied => "Location access was denied. Enable it in settings or enter your address manually.",
      GeoError::PositionUnavailable => "We couldn't find your location right now. Check your GPS signal and try again.",
      GeoError::Timeout => "Finding your location took too long. Please try again.",
    }
  }
}

/// A continuous position subscription. Dropping it stops the producer.
pub struct PositionWatch {
  rx: mpsc::Receiver<Result<GeoFix, GeoError>>,
  producer: Option<JoinHandle<()>>,
}

impl PositionWatch {
  pub fn new(rx: mpsc::Receiver<Result<GeoFix, GeoError>>, producer: Option<JoinHandle<()>>) -> Self {
    PositionWatch { rx, producer }
  }

  pub async fn next(&mut self) -> Option<Result<GeoFix, GeoError>> {
    self.rx.recv().await
  }
}

impl Drop for PositionWatch {
  fn drop(&mut self) {
    if let Some(handle) = self.producer.take() {
      handle.abort();
    }
  }
}

#[async_trait]
pub trait Locator: Send + Sync {
  async fn current_position(&self) -> Result<GeoFix, GeoError>;

  fn watch(&self) -> PositionWatch;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
  pub path: Vec<GeoPoint>,
  pub distance_km: f64,
  #[serde(rename = "durationSecs", serialize_with = "as_secs")]
  pub duration: Duration,
  /// True when this is a straight-line fallback rather than a routed path.
  pub estimated: bool,
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
  s.serialize_u64(d.as_secs())
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
  async fn route(&self, from: GeoPoint, to: GeoPoint) -> anyhow::Result<RouteSummary>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
  async fn reverse(&self, point: GeoPoint) -> anyhow::Result<String>;

  async fn forward(&self, query: &str) -> anyhow::Result<GeoPoint>;
}

pub fn straight_line_estimate(from: GeoPoint, to: GeoPoint, speed_kmh: f64) -> RouteSummary {
  let distance_km = haversine_km(from, to);
  let hours = if speed_kmh > 0.0 { distance_km / speed_kmh } else { 0.0 };
  RouteSummary {
    path: vec![from, to],
    distance_km,
    duration: Duration::from_secs_f64(hours * 3600.0),
    estimated: true,
  }
}

pub async fn route_or_estimate(provider: &dyn RouteProvider, from: GeoPoint, to: GeoPoint, fallback_speed_kmh: f64) -> RouteSummary {
  match provider.route(from, to).await {
    Ok(route) => route,
    Err(e) => {
      debug!(error = %e, "Routing failed, using straight-line estimate.");
      straight_line_estimate(from, to, fallback_speed_kmh)
    }
  }
}

/// Reverse-geocodes `point`, keeping `current` when the geocoder fails or
/// returns nothing.
pub async fn resolve_address(geocoder: &dyn Geocoder, point: GeoPoint, current: &str) -> String {
  match geocoder.reverse(point).await {
    Ok(address) if !address.trim().is_empty() => address,
    Ok(_) => current.to_string(),
    Err(e) => {
      warn!(error = %e, lat = point.lat, lng = point.lng, "Reverse geocoding failed, keeping address.");
      current.to_string()
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyStore {
  pub store: Store,
  pub distance_km: f64,
}

/// Open stores within `radius_km` of `origin`, nearest first.
pub fn nearby_stores(stores: impl IntoIterator<Item = Store>, origin: GeoPoint, radius_km: f64) -> Vec<NearbyStore> {
  let mut found: Vec<NearbyStore> = stores
    .into_iter()
    .filter(|s| s.is_open)
    .filter_map(|store| {
      let distance_km = haversine_km(origin, store.location?);
      (distance_km <= radius_km).then_some(NearbyStore { store, distance_km })
    })
    .collect();
  found.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
  found
}
