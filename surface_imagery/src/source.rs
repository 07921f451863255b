use geodesy::wrap_longitude;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use crate::{CatalogErrors, ImageId};

/// Lookup metadata of a catalog entry, available before its pixels are.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImageMetadata {
    pub body: String,
    /// (min, max) wavelength in nm
    pub wavelength_range: (f64, f64),
    /// true for the daylit image, false for the eclipsed one
    pub lit: bool,
}

impl ImageMetadata {
    pub fn overlaps(&self, other: &ImageMetadata) -> bool {
        self.wavelength_range.0 <= other.wavelength_range.1
            && other.wavelength_range.0 <= self.wavelength_range.1
    }
}

/// One equirectangular albedo bitmap. Row 0 is latitude +90, column 0 is
/// longitude -180. The pixel buffer is written once by a load task and only
/// read afterwards.
#[derive(Debug)]
pub struct SurfaceImageSource {
    id: ImageId,
    metadata: ImageMetadata,
    path: PathBuf,
    pixels: OnceLock<RgbImage>,
}

impl SurfaceImageSource {
    pub fn new(id: ImageId, metadata: ImageMetadata, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            metadata,
            path: path.into(),
            pixels: OnceLock::new(),
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.pixels.get().is_some()
    }

    /// (width, height) once loaded.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.pixels.get().map(|img| img.dimensions())
    }

    /// Stores the decoded pixels. Returns false if pixels were already present,
    /// in which case the new buffer is discarded.
    pub(crate) fn install(&self, pixels: RgbImage) -> bool {
        self.pixels.set(pixels).is_ok()
    }

    /// Nearest-neighbour RGB at each (lat, lon) pair, in degrees.
    ///
    /// Longitude is wrapped into [-180, 180) first, so `lon` and `lon + 360`
    /// sample the same pixel. Row `round((90 - lat) / 180 * h)` is clamped to
    /// the last row and column `round((lon + 180) / 360 * w)` wraps around the
    /// seam.
    pub fn sample(&self, lat: &[f64], lon: &[f64]) -> Result<Vec<[u8; 3]>, CatalogErrors> {
        if lat.len() != lon.len() {
            return Err(CatalogErrors::ShapeMismatch {
                lat: lat.len(),
                lon: lon.len(),
            });
        }
        if lat.is_empty() {
            return Ok(Vec::new());
        }
        let pixels = self
            .pixels
            .get()
            .ok_or(CatalogErrors::ImageNotLoaded(self.id))?;
        let (w, h) = pixels.dimensions();
        if w == 0 || h == 0 {
            return Err(CatalogErrors::ImageNotLoaded(self.id));
        }

        let rgb = lat
            .iter()
            .zip(lon)
            .map(|(&lat, &lon)| {
                let lon = wrap_longitude(lon);
                let row = ((90.0 - lat) / 180.0 * h as f64).round().clamp(0.0, (h - 1) as f64);
                let col = ((lon + 180.0) / 360.0 * w as f64).round() as u32 % w;
                pixels.get_pixel(col, row as u32).0
            })
            .collect();
        Ok(rgb)
    }
}
