//! Frame transforms between the inertial (ECI) and Earth-fixed (ECEF) frames.
//!
//! Earth rotation is modelled as a single rotation about +z by the Greenwich
//! mean sidereal angle. Precession, nutation and polar motion are ignored, which
//! is well below a pixel for sensor imagery.

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use time::{Time, TimeSystem};

/// Converts vectors between ECI and ECEF at a given instant.
pub trait FrameTransform {
    /// Rotation taking ECI components to ECEF components at `t`.
    fn ecef_from_eci(&self, t: &Time) -> Rotation3<f64>;

    fn eci_from_ecef(&self, t: &Time) -> Rotation3<f64> {
        self.ecef_from_eci(t).inverse()
    }

    fn eci_to_ecef(&self, v: &Vector3<f64>, t: &Time) -> Vector3<f64> {
        self.ecef_from_eci(t) * v
    }

    fn ecef_to_eci(&self, v: &Vector3<f64>, t: &Time) -> Vector3<f64> {
        self.eci_from_ecef(t) * v
    }
}

/// GMST-driven Earth rotation (IAU-1982 polynomial, UT1 taken as UTC).
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
pub struct EarthRotation;

impl EarthRotation {
    /// Greenwich mean sidereal time in radians, in [0, 2pi).
    pub fn gmst(t: &Time) -> f64 {
        let jd = t.to_system(TimeSystem::UTC).get_jd();
        julian_to_gmst(jd)
    }
}

impl FrameTransform for EarthRotation {
    fn ecef_from_eci(&self, t: &Time) -> Rotation3<f64> {
        // passive rotation of the frame by +gmst is an active rotation by -gmst
        Rotation3::from_axis_angle(&Vector3::z_axis(), -EarthRotation::gmst(t))
    }
}

/// Converts a Julian date to Greenwich mean sidereal time in radians.
fn julian_to_gmst(julian_date: f64) -> f64 {
    let d = julian_date - time::JD_J2000;
    let t = d / time::DAYS_PER_CENTURY;

    let gmst_deg = 280.46061837 + 360.98564736629 * d + 0.000387933 * t.powi(2)
        - t.powi(3) / 38710000.0;

    gmst_deg.rem_euclid(360.0).to_radians()
}

/// Right ascension and declination of an inertial direction, in radians.
/// Right ascension is reduced into [0, 2pi), declination is atan2(z, hypot(x, y)).
/// A zero vector maps to (0, 0).
pub fn right_ascension_declination(v: &Vector3<f64>) -> (f64, f64) {
    let ra = v.y.atan2(v.x).rem_euclid(TAU);
    let dec = v.z.atan2(v.x.hypot(v.y));
    // rem_euclid can return exactly TAU for tiny negative inputs
    let ra = if ra >= TAU { ra - TAU } else { ra };
    (ra, dec)
}
