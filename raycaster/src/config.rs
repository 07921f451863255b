use celestial::CelestialBodies;
use color::Color;
use geodesy::Ellipsoid;
use ron::ser::{to_string_pretty, PrettyConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::RaycastErrors;

/// Toggles, colours and tuning constants for a render.
///
/// `max_alpha` and `max_atm_depth_km` are tuned by eye against reference
/// imagery, they are not radiative-transfer quantities.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub ellipsoid: Ellipsoid,
    /// (min, max) band in nm passed to the surface image lookup
    pub wavelength_nm: (f64, f64),

    pub eclipse_shading: bool,

    pub atmosphere: bool,
    pub atmosphere_height_km: f64,
    pub max_alpha: f64,
    pub max_atm_depth_km: f64,
    pub atmosphere_day: Color,
    pub atmosphere_night: Color,

    pub sun_disc: bool,
    pub sun_color: Color,
    pub moon_disc: bool,
    pub moon_color: Color,

    pub edge_highlight: bool,
    pub highlight_height_km: f64,
    pub highlight_color: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ellipsoid: Ellipsoid::WGS84,
            wavelength_nm: (400.0, 700.0),
            eclipse_shading: true,
            atmosphere: true,
            atmosphere_height_km: 150.0,
            max_alpha: 0.75,
            max_atm_depth_km: 1390.6,
            atmosphere_day: Color::SKY_BLUE,
            atmosphere_night: Color::MIDNIGHT_BLUE,
            sun_disc: true,
            sun_color: CelestialBodies::Sun.default_color(),
            moon_disc: true,
            moon_color: CelestialBodies::Moon.default_color(),
            edge_highlight: false,
            highlight_height_km: 20.0,
            highlight_color: Color::ORANGE,
        }
    }
}

impl RenderConfig {
    pub fn from_ron_str(s: &str) -> Result<Self, RaycastErrors> {
        let config: RenderConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RaycastErrors> {
        let s = std::fs::read_to_string(path)?;
        Self::from_ron_str(&s)
    }

    pub fn to_ron_string(&self) -> Result<String, RaycastErrors> {
        Ok(to_string_pretty(self, PrettyConfig::default())?)
    }

    pub fn validate(&self) -> Result<(), RaycastErrors> {
        self.ellipsoid.validate()?;

        let non_negative = [
            ("atmosphere_height_km", self.atmosphere_height_km),
            ("highlight_height_km", self.highlight_height_km),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(RaycastErrors::GeometryInvalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.max_alpha) {
            return Err(RaycastErrors::GeometryInvalid(format!(
                "max_alpha must lie in [0, 1], got {}",
                self.max_alpha
            )));
        }
        if !self.max_atm_depth_km.is_finite() || self.max_atm_depth_km <= 0.0 {
            return Err(RaycastErrors::GeometryInvalid(format!(
                "max_atm_depth_km must be finite and positive, got {}",
                self.max_atm_depth_km
            )));
        }
        Ok(())
    }

    /// Padding in m of the shell used for the limb highlight.
    pub fn highlight_pad_m(&self) -> f64 {
        let base = if self.atmosphere {
            self.atmosphere_height_km
        } else {
            0.0
        };
        (base + self.highlight_height_km) * geodesy::M_PER_KM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.max_alpha, 0.75);
        assert_eq!(config.max_atm_depth_km, 1390.6);
        assert_eq!(config.atmosphere_height_km, 150.0);
        assert_eq!(config.sun_color, CelestialBodies::Sun.default_color());
        assert_eq!(config.moon_color, CelestialBodies::Moon.default_color());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = RenderConfig::from_ron_str(
            "(atmosphere: false, edge_highlight: true, highlight_height_km: 35.0)",
        )
        .unwrap();
        assert!(!config.atmosphere);
        assert!(config.edge_highlight);
        assert_eq!(config.highlight_height_km, 35.0);
        assert_eq!(config.max_alpha, 0.75);
        assert_eq!(config.highlight_pad_m(), 35_000.0);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = RenderConfig::default();
        config.sun_color = Color::new(1.0, 0.9, 0.2, 1.0);
        config.wavelength_nm = (450.0, 650.0);
        let text = config.to_ron_string().unwrap();
        assert_eq!(RenderConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.ron");
        std::fs::write(&path, "(eclipse_shading: false)").unwrap();
        let config = RenderConfig::from_file(&path).unwrap();
        assert!(!config.eclipse_shading);

        assert!(matches!(
            RenderConfig::from_file(dir.path().join("missing.ron")),
            Err(RaycastErrors::Io(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            RenderConfig::from_ron_str("(atmosphere_height_km: -1.0)"),
            Err(RaycastErrors::GeometryInvalid(_))
        ));
        assert!(matches!(
            RenderConfig::from_ron_str("(max_alpha: 1.5)"),
            Err(RaycastErrors::GeometryInvalid(_))
        ));
        assert!(matches!(
            RenderConfig::from_ron_str("(ellipsoid: (a: 1.0, c: 0.0))"),
            Err(RaycastErrors::GeometryInvalid(_))
        ));
        assert!(matches!(
            RenderConfig::from_ron_str("(atmosphere: maybe)"),
            Err(RaycastErrors::Config(_))
        ));
    }

    #[test]
    fn test_highlight_pad_stacks_on_atmosphere() {
        let config = RenderConfig {
            edge_highlight: true,
            ..Default::default()
        };
        assert_eq!(config.highlight_pad_m(), 170_000.0);
    }
}
