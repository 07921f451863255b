//! Synthetic sensor imagery of an oblate planet.
//!
//! [`RayCaster::render`] casts one ray per pixel from a sensor pose, maps
//! surface hits to geodetic coordinates, samples day or night albedo from a
//! [`SurfaceImageCatalog`], composites atmospheric haze and an optional limb
//! highlight, and stamps Sun and Moon discs. Alongside the RGB image it returns
//! a [`PixelLabel`] for every pixel.

pub mod atmosphere;
pub mod config;
pub mod discs;
pub mod logging;
pub mod render;
pub mod request;

pub use config::RenderConfig;
pub use render::RayCaster;
pub use request::{pinhole_rays, PixelLabel, RenderRequest, RenderResult, RenderStats, SensorPose};

use geodesy::GeodesyErrors;
use surface_imagery::CatalogErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RaycastErrors {
    #[error(transparent)]
    Catalog(#[from] CatalogErrors),
    #[error("render requested before the surface image catalog finished loading")]
    CatalogNotReady,
    #[error("could not parse render config: {0}")]
    Config(#[from] ron::error::SpannedError),
    #[error("invalid geometry: {0}")]
    GeometryInvalid(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("could not serialize render config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("{what} has {found} entries, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

impl From<GeodesyErrors> for RaycastErrors {
    fn from(e: GeodesyErrors) -> Self {
        match e {
            GeodesyErrors::GeometryInvalid(msg) => RaycastErrors::GeometryInvalid(msg),
        }
    }
}
