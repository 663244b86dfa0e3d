use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub const DEFAULT_STORE_LAT: f64 = 26.898974785511992;
pub const DEFAULT_STORE_LON: f64 = 75.73904942667157;
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoCoordinate {
    #[schema(example = 26.899)]
    pub latitude: f64,
    #[schema(example = 75.739)]
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance in meters between two points (haversine).
///
/// Coordinates are trusted as reported by the location provider; no range
/// validation happens here.
pub fn haversine_distance(a: GeoCoordinate, b: GeoCoordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Rounding near antipodes can push h past 1.0.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Circular zone around the store where punching in/out is allowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    pub center: GeoCoordinate,
    pub radius_m: f64,
}

impl Default for Geofence {
    fn default() -> Self {
        Self {
            center: GeoCoordinate::new(DEFAULT_STORE_LAT, DEFAULT_STORE_LON),
            radius_m: DEFAULT_RADIUS_METERS,
        }
    }
}

impl Geofence {
    pub fn new(center: GeoCoordinate, radius_m: f64) -> Self {
        Self { center, radius_m }
    }

    /// Ok(distance) when `at` lies inside the zone, Err(distance) otherwise.
    /// A distance that is not a number never counts as inside.
    pub fn check(&self, at: GeoCoordinate) -> Result<f64, f64> {
        let distance = haversine_distance(self.center, at);
        if distance <= self.radius_m {
            Ok(distance)
        } else {
            Err(distance)
        }
    }
}
