use crate::error::StageError;
use crate::geometry::Quadrilateral;
use image::{DynamicImage, Rgba};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};

/// Warp the quadrilateral `corners` onto the image's own full-extent
/// rectangle. Output keeps the input dimensions; pixels mapped from outside
/// the source are filled white.
pub fn apply(image: &DynamicImage, corners: &Quadrilateral) -> Result<DynamicImage, StageError> {
    let (width, height) = (image.width(), image.height());
    if !corners.is_convex() {
        return Err(StageError::filter(
            "perspective",
            "boundary corners do not form a convex quadrilateral",
        ));
    }

    let to_pairs = |quad: &Quadrilateral| quad.clockwise().map(|p| (p.x, p.y));
    let from = to_pairs(corners);
    let to = to_pairs(&Quadrilateral::full_extent(width, height));

    let projection = Projection::from_control_points(from, to).ok_or_else(|| {
        StageError::filter("perspective", "failed to compute projective transform")
    })?;

    let rgba = image.to_rgba8();
    let background = Rgba([255u8, 255, 255, 255]);
    let warped = warp(&rgba, &projection, Interpolation::Bilinear, background);

    tracing::debug!(
        "Rectified {:?} onto {}x{} frame",
        corners.clockwise(),
        width,
        height
    );

    Ok(DynamicImage::ImageRgba8(warped))
}
