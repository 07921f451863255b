//! Equirectangular albedo imagery for the planet surface.
//!
//! A [`SurfaceImageCatalog`] owns one [`SurfaceImageSource`] per lighting
//! condition, decodes their bitmaps on a [`LoadScheduler`], and answers which
//! image a batch of surface hits should be sampled from.

pub mod catalog;
pub mod decoder;
pub mod scheduler;
pub mod source;

pub use catalog::{CatalogEvent, SurfaceImageCatalog};
pub use decoder::{FileDecoder, ImageDecoder};
pub use scheduler::LoadScheduler;
pub use source::{ImageMetadata, SurfaceImageSource};

use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Catalog key, assigned sequentially from 0 in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct ImageId(pub usize);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum CatalogErrors {
    #[error("an image with lit={lit} and an overlapping wavelength band is already registered")]
    AmbiguousImage { lit: bool },
    #[error("catalog loading has already been started")]
    AlreadyLoading,
    #[error("load of {0} was cancelled")]
    Cancelled(ImageId),
    #[error("failed to decode '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("pixel data for {0} has not finished loading")]
    ImageNotLoaded(ImageId),
    #[error("invalid wavelength band ({0}, {1})")]
    InvalidWavelengthRange(f64, f64),
    #[error("catalog load failed: {0}")]
    LoadFailed(String),
    #[error("no registered image matches lit={lit}")]
    NoMatchingImage { lit: bool },
    #[error("catalog images are not loaded yet")]
    NotReady,
    #[error("latitude and longitude batches differ in length ({lat} vs {lon})")]
    ShapeMismatch { lat: usize, lon: usize },
    #[error("could not build the load thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("{0} is not registered in the catalog")]
    UnknownImage(ImageId),
}
