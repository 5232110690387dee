//! Image assets: the uploader seam and placement of uploaded images.

use crate::geometry::Frame;
use crate::shapes::{BoxKind, BoxShape, ImageRef};
use crate::store::BoxFuture;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("Upload rejected: {0}")]
    Rejected(String),
}

/// An uploaded image as returned by the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Opaque reference used to fetch the image later.
    pub reference: String,
    /// Natural size in pixels.
    pub width: u32,
    pub height: u32,
}

/// Uploads raw image bytes and returns a reference to them.
pub trait ImageUploader: Send + Sync {
    fn upload_image(&self, bytes: Vec<u8>) -> BoxFuture<'_, Result<ImageAsset, AssetError>>;
}

/// Box for a freshly uploaded image at `at`, `display_width` wide with the
/// natural aspect ratio. Images without a width are placed square.
pub fn place_image(asset: &ImageAsset, at: Point, display_width: f64) -> BoxShape {
    let height = if asset.width == 0 {
        display_width
    } else {
        display_width * f64::from(asset.height) / f64::from(asset.width)
    };
    BoxShape::new(
        BoxKind::Image(ImageRef {
            reference: asset.reference.clone(),
            pointer: None,
        }),
        Frame::new(at.x, at.y, display_width, height),
    )
}

/// Reject payloads over `limit` bytes before they are uploaded.
pub fn check_size(bytes: &[u8], limit: usize) -> Result<(), AssetError> {
    if bytes.len() > limit {
        return Err(AssetError::TooLarge {
            size: bytes.len(),
            limit,
        });
    }
    Ok(())
}
