use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{GeodesyErrors, WGS84_A, WGS84_C};

/// Number of fixed-point corrections applied in `Ellipsoid::geodetic`.
/// Three passes give well under a metre of latitude error for points near the
/// surface, which is far below a sensor pixel. Not a surveying-grade inversion.
pub const GEODETIC_ITERATIONS: usize = 3;

/// Oblate ellipsoid of revolution, x^2/a^2 + y^2/a^2 + z^2/c^2 = 1, radii in m.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Ellipsoid {
    pub a: f64,
    pub c: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

impl Ellipsoid {
    pub const WGS84: Self = Self {
        a: WGS84_A,
        c: WGS84_C,
    };

    pub fn new(a: f64, c: f64) -> Result<Self, GeodesyErrors> {
        let ellipsoid = Self { a, c };
        ellipsoid.validate()?;
        Ok(ellipsoid)
    }

    pub fn validate(&self) -> Result<(), GeodesyErrors> {
        if !(self.a.is_finite() && self.c.is_finite()) || self.a <= 0.0 || self.c <= 0.0 {
            return Err(GeodesyErrors::GeometryInvalid(format!(
                "ellipsoid radii must be finite and positive, got a={} c={}",
                self.a, self.c
            )));
        }
        if self.c > self.a {
            return Err(GeodesyErrors::GeometryInvalid(format!(
                "ellipsoid must be oblate, got a={} c={}",
                self.a, self.c
            )));
        }
        Ok(())
    }

    /// The same ellipsoid with `pad` m added to both radii. Used for the
    /// atmosphere shell and the limb highlight band.
    pub fn padded(&self, pad: f64) -> Result<Self, GeodesyErrors> {
        if !pad.is_finite() || pad < 0.0 {
            return Err(GeodesyErrors::GeometryInvalid(format!(
                "ellipsoid padding must be finite and non-negative, got {pad}"
            )));
        }
        Ellipsoid::new(self.a + pad, self.c + pad)
    }

    pub fn flattening(&self) -> f64 {
        (self.a - self.c) / self.a
    }

    /// First eccentricity squared, 2f - f^2.
    pub fn eccentricity_squared(&self) -> f64 {
        let f = self.flattening();
        2.0 * f - f * f
    }

    /// Converts an ECEF point in m to geodetic latitude/longitude.
    ///
    /// Longitude is atan2(y, x) wrapped into [-180, 180). Latitude starts at the
    /// geocentric value and receives `GEODETIC_ITERATIONS` corrections of
    ///
    /// ```text
    /// N   = a / sqrt(1 - e^2 sin^2(lat))
    /// lat = atan2(z + N e^2 sin(lat), R)
    /// ```
    /// with R = hypot(x, y).
    pub fn geodetic(&self, point: &Vector3<f64>) -> Geodetic {
        let e2 = self.eccentricity_squared();
        let lon = point.y.atan2(point.x);
        let r = point.x.hypot(point.y);

        let mut lat = point.z.atan2(r);
        for _ in 0..GEODETIC_ITERATIONS {
            let sin_lat = lat.sin();
            let n = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            lat = (point.z + n * e2 * sin_lat).atan2(r);
        }

        Geodetic {
            lat_deg: lat.to_degrees(),
            lon_deg: wrap_longitude(lon.to_degrees()),
        }
    }

    /// ECEF position in m of the surface point at a geodetic latitude/longitude.
    pub fn surface_point(&self, lat_deg: f64, lon_deg: f64) -> Vector3<f64> {
        let e2 = self.eccentricity_squared();
        let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
        let n = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        Vector3::new(
            n * cos_lat * cos_lon,
            n * cos_lat * sin_lon,
            n * (1.0 - e2) * sin_lat,
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Geodetic {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

/// Wraps a longitude in degrees into [-180, 180).
pub fn wrap_longitude(lon_deg: f64) -> f64 {
    let wrapped = (lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
