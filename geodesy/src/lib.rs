pub mod ellipsoid;
pub mod intersection;

pub use ellipsoid::{wrap_longitude, Ellipsoid, Geodetic};
pub use intersection::{intersect, nearest_root, Intersections, RootLanes};

use thiserror::Error;

/// WGS-84 equatorial radius in m
pub const WGS84_A: f64 = 6378137.0;
/// WGS-84 polar radius in m
pub const WGS84_C: f64 = 6356752.314245;
/// WGS-84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257223563;

pub const M_PER_KM: f64 = 1000.0;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeodesyErrors {
    #[error("invalid geometry: {0}")]
    GeometryInvalid(String),
}
