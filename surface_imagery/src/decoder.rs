use image::RgbImage;
use std::path::Path;

use crate::CatalogErrors;

/// Turns a bitmap path into an RGB pixel buffer. Called once per catalog
/// entry from a load worker, so implementations must be thread safe.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<RgbImage, CatalogErrors>;
}

/// Decodes any format the `image` crate recognises from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<RgbImage, CatalogErrors> {
        let img = image::open(path).map_err(|source| CatalogErrors::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(img.to_rgb8())
    }
}
