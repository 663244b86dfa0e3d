pub mod distance;

pub use distance::{GeoCoordinate, Geofence};
