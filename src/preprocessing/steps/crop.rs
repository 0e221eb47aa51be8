use crate::error::StageError;
use crate::geometry::Rect;
use image::DynamicImage;

/// Crop to the part of `rect` that lies inside the image.
pub fn apply(image: &DynamicImage, rect: &Rect) -> Result<DynamicImage, StageError> {
    let (x, y, width, height) = rect
        .to_pixel_region(image.width(), image.height())
        .ok_or_else(|| {
            StageError::filter(
                "crop",
                format!(
                    "region {:?} does not intersect {}x{} image",
                    rect,
                    image.width(),
                    image.height()
                ),
            )
        })?;

    Ok(image.crop_imm(x, y, width, height))
}
