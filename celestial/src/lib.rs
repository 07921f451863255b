use color::Color;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use time::{Time, TimeSystem};

/// Astronomical unit in km
pub const AU_KM: f64 = 149597870.7;
/// Earth equatorial radius in km, used to scale the lunar parallax
pub const EARTH_RADIUS_KM: f64 = 6378.137;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CelestialErrors {
    #[error("celestial body '{0}' is not supported")]
    BodyNotSupported(String),
}

/// Bodies drawn as discs over the sensor image.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum CelestialBodies {
    Sun,
    Moon,
}

impl CelestialBodies {
    pub fn get_name(&self) -> &'static str {
        match self {
            CelestialBodies::Sun => "Sun",
            CelestialBodies::Moon => "Moon",
        }
    }

    /// Angular half-width of the disc stamped for this body, in degrees.
    /// Both bodies subtend roughly half a degree from Earth.
    pub fn angular_radius_deg(&self) -> f64 {
        match self {
            CelestialBodies::Sun => 0.25,
            CelestialBodies::Moon => 0.25,
        }
    }

    pub fn default_color(&self) -> Color {
        match self {
            CelestialBodies::Sun => Color::YELLOW,
            CelestialBodies::Moon => Color::GREY,
        }
    }
}

impl FromStr for CelestialBodies {
    type Err = CelestialErrors;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sun" => Ok(CelestialBodies::Sun),
            "moon" => Ok(CelestialBodies::Moon),
            _ => Err(CelestialErrors::BodyNotSupported(s.to_string())),
        }
    }
}

/// Source of geocentric inertial body positions.
pub trait Ephemeris {
    /// Geocentric ECI position of `body` at `t`, in km.
    fn position_eci(&self, body: CelestialBodies, t: &Time) -> Vector3<f64>;
}

/// Astronomical Almanac low-precision solar and lunar series
/// (Vallado, Fundamentals of Astrodynamics, algorithms 29 and 31).
/// About 0.01 deg for the Sun and 0.3 deg for the Moon, mean equator of date.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
pub struct LowPrecisionEphemeris;

impl Ephemeris for LowPrecisionEphemeris {
    fn position_eci(&self, body: CelestialBodies, t: &Time) -> Vector3<f64> {
        let jdc = t.to_system(TimeSystem::TT).get_jd_centuries();
        match body {
            CelestialBodies::Sun => sun_position(jdc),
            CelestialBodies::Moon => moon_position(jdc),
        }
    }
}

fn obliquity(jdc: f64) -> f64 {
    (23.439291 - 0.0130042 * jdc).to_radians()
}

fn sind(deg: f64) -> f64 {
    deg.to_radians().sin()
}

fn cosd(deg: f64) -> f64 {
    deg.to_radians().cos()
}

fn sun_position(jdc: f64) -> Vector3<f64> {
    let mean_longitude = 280.460 + 36000.771 * jdc;
    let mean_anomaly = 357.5291092 + 35999.05034 * jdc;
    let ecliptic_longitude = (mean_longitude
        + 1.914666471 * sind(mean_anomaly)
        + 0.019994643 * sind(2.0 * mean_anomaly))
    .to_radians();
    let r_au = 1.000140612
        - 0.016708617 * cosd(mean_anomaly)
        - 0.000139589 * cosd(2.0 * mean_anomaly);

    let eps = obliquity(jdc);
    let (sin_l, cos_l) = ecliptic_longitude.sin_cos();
    r_au * AU_KM * Vector3::new(cos_l, eps.cos() * sin_l, eps.sin() * sin_l)
}

fn moon_position(jdc: f64) -> Vector3<f64> {
    let t = jdc;
    let longitude = 218.32 + 481267.8813 * t + 6.29 * sind(134.9 + 477198.85 * t)
        - 1.27 * sind(259.2 - 413335.38 * t)
        + 0.66 * sind(235.7 + 890534.23 * t)
        + 0.21 * sind(269.9 + 954397.70 * t)
        - 0.19 * sind(357.5 + 35999.05 * t)
        - 0.11 * sind(186.6 + 966404.05 * t);
    let latitude = 5.13 * sind(93.3 + 483202.03 * t) + 0.28 * sind(228.2 + 960400.87 * t)
        - 0.28 * sind(318.3 + 6003.18 * t)
        - 0.17 * sind(217.6 - 407332.20 * t);
    let parallax = 0.9508
        + 0.0518 * cosd(134.9 + 477198.85 * t)
        + 0.0095 * cosd(259.2 - 413335.38 * t)
        + 0.0078 * cosd(235.7 + 890534.23 * t)
        + 0.0028 * cosd(269.9 + 954397.70 * t);

    let r = EARTH_RADIUS_KM / sind(parallax);
    let eps = obliquity(jdc);
    let (sin_l, cos_l) = longitude.to_radians().sin_cos();
    let (sin_b, cos_b) = latitude.to_radians().sin_cos();
    r * Vector3::new(
        cos_b * cos_l,
        eps.cos() * cos_b * sin_l - eps.sin() * sin_b,
        eps.sin() * cos_b * sin_l + eps.cos() * sin_b,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sun_vallado_5_1() {
        let t = Time::from_ymdhms(2006, 4, 2, 0, 0, 0.0, TimeSystem::TT).unwrap();
        let r = LowPrecisionEphemeris.position_eci(CelestialBodies::Sun, &t);
        let expected = Vector3::new(0.9771945, 0.1924424, 0.0834308) * AU_KM;
        assert_abs_diff_eq!(r, expected, epsilon = 500.0);
    }

    #[test]
    fn test_moon_vallado_5_3() {
        let t = Time::from_ymdhms(1994, 4, 28, 0, 0, 0.0, TimeSystem::TT).unwrap();
        let r = LowPrecisionEphemeris.position_eci(CelestialBodies::Moon, &t);
        let expected = Vector3::new(-134240.626, -311571.590, -126693.785);
        assert_abs_diff_eq!(r, expected, epsilon = 1.0);
    }

    #[test]
    fn test_sun_distance_is_about_one_au() {
        let t = Time::from_ymdhms(2024, 9, 1, 0, 0, 0.0, TimeSystem::UTC).unwrap();
        let r = LowPrecisionEphemeris.position_eci(CelestialBodies::Sun, &t);
        assert!((r.norm() / AU_KM - 1.0).abs() < 0.02);
    }

    #[test]
    fn test_names() {
        assert_eq!(CelestialBodies::Sun.get_name(), "Sun");
        assert_eq!("moon".parse::<CelestialBodies>(), Ok(CelestialBodies::Moon));
        assert_eq!("SUN".parse::<CelestialBodies>(), Ok(CelestialBodies::Sun));
        assert!("jupiter".parse::<CelestialBodies>().is_err());
    }
}
