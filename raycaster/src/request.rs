use celestial::CelestialBodies;
use image::{Rgb, RgbImage};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use time::Time;

use crate::RenderConfig;

/// Sensor attitude and position in the inertial frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPose {
    /// Active rotation taking sensor-frame vectors to ECI
    pub eci_from_sensor: UnitQuaternion<f64>,
    /// Sensor position in ECI, km
    pub position_eci: Vector3<f64>,
}

/// Everything one render needs. Rays are sensor-frame unit vectors in
/// row-major pixel order, so `rays.len()` must equal `width * height`.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub width: usize,
    pub height: usize,
    pub pixels_per_radian: f64,
    pub pose: SensorPose,
    pub rays: &'a [Vector3<f64>],
    pub time: Time,
    /// km, ECI
    pub sun_eci: Vector3<f64>,
    /// km, ECI
    pub moon_eci: Vector3<f64>,
    pub config: &'a RenderConfig,
}

/// Unit ray directions of an ideal pinhole sensor looking down +z, with +x
/// to the right and +y down the image. Adjacent pixel centres are
/// `1 / pixels_per_radian` apart at the boresight.
pub fn pinhole_rays(width: usize, height: usize, pixels_per_radian: f64) -> Vec<Vector3<f64>> {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    (0..height)
        .flat_map(|row| (0..width).map(move |col| (row, col)))
        .map(|(row, col)| {
            let x = (col as f64 + 0.5 - cx) / pixels_per_radian;
            let y = (row as f64 + 0.5 - cy) / pixels_per_radian;
            Vector3::new(x, y, 1.0).normalize()
        })
        .collect()
}

/// Mouse-over meaning of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum PixelLabel {
    /// Ray reached the surface, geodetic degrees
    Ground { lat_deg: f64, lon_deg: f64 },
    /// Ray left the planet, right ascension/declination of the ray in degrees
    Sky { az_deg: f64, el_deg: f64 },
    Body(CelestialBodies),
}

impl PixelLabel {
    /// 0 ground, 1 sky, 2 celestial body
    pub fn tag(&self) -> u8 {
        match self {
            PixelLabel::Ground { .. } => 0,
            PixelLabel::Sky { .. } => 1,
            PixelLabel::Body(_) => 2,
        }
    }
}

/// Pixel counts per compositing stage, for logging and inspection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub ground: usize,
    pub eclipsed: usize,
    pub atmosphere: usize,
    pub highlight: usize,
    pub sun: usize,
    pub moon: usize,
}

#[derive(Debug, Clone)]
pub struct RenderResult {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) image: Vec<[f32; 3]>,
    pub(crate) labels: Vec<PixelLabel>,
    pub(crate) stats: RenderStats,
}

impl RenderResult {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major RGB in [0, 255].
    pub fn image(&self) -> &[[f32; 3]] {
        &self.image
    }

    pub fn labels(&self) -> &[PixelLabel] {
        &self.labels
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn pixel(&self, row: usize, col: usize) -> [f32; 3] {
        self.image[row * self.width + col]
    }

    pub fn label(&self, row: usize, col: usize) -> PixelLabel {
        self.labels[row * self.width + col]
    }

    pub fn to_rgb8(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let p = self.pixel(y as usize, x as usize);
            Rgb(p.map(|v| v.round().clamp(0.0, 255.0) as u8))
        })
    }
}
