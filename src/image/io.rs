//! Convenience helpers for loading and saving rasters via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::RgbImage;
use crate::util::{DpMatchError, DpMatchResult};
use std::path::Path;

/// Creates an owned raster from a decoded RGB buffer.
pub fn from_image_rgb(img: &image::RgbImage) -> DpMatchResult<RgbImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    RgbImage::new(img.as_raw().clone(), width, height)
}

/// Creates an owned raster from any decoded image, converting to RGB.
pub fn from_dynamic_image(img: &image::DynamicImage) -> DpMatchResult<RgbImage> {
    from_image_rgb(&img.to_rgb8())
}

/// Loads an image from disk and converts it to an owned RGB raster.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> DpMatchResult<RgbImage> {
    let img = image::open(path).map_err(|err| DpMatchError::ImageIo {
        reason: err.to_string(),
    })?;
    from_dynamic_image(&img)
}

/// Saves a raster to disk; the format is chosen from the file extension.
pub fn save_rgb_image<P: AsRef<Path>>(path: P, img: &RgbImage) -> DpMatchResult<()> {
    let out = image::RgbImage::from_raw(
        img.width() as u32,
        img.height() as u32,
        img.as_raw().to_vec(),
    )
    .ok_or(DpMatchError::ImageIo {
        reason: "raster dimensions overflow u32".to_string(),
    })?;
    out.save(path).map_err(|err| DpMatchError::ImageIo {
        reason: err.to_string(),
    })
}
