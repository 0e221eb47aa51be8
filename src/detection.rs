//! Board boundary detection.
//!
//! The pipeline only depends on the [`BoundaryDetector`] capability; the
//! contour based detector here is the default implementation.

use crate::geometry::{Point, Quadrilateral};
use crate::raster::Image;
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull};
use imageproc::morphology::dilate;

/// Smallest accepted width/height ratio of a board
pub const MIN_ASPECT: f32 = 0.5;
/// Largest accepted width/height ratio of a board
pub const MAX_ASPECT: f32 = 2.0;
/// A board must cover at least this share of the image
pub const MIN_AREA_FRACTION: f32 = 0.3;

/// Constraints a detected quadrilateral has to satisfy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub min_area_fraction: f32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            min_aspect: MIN_ASPECT,
            max_aspect: MAX_ASPECT,
            min_area_fraction: MIN_AREA_FRACTION,
        }
    }
}

impl DetectionParams {
    /// Whether `quad` is an acceptable board boundary inside a
    /// `width` x `height` image.
    pub fn accepts(&self, quad: &Quadrilateral, width: u32, height: u32) -> bool {
        let image_area = width as f32 * height as f32;
        let aspect = quad.aspect_ratio();
        quad.is_convex()
            && aspect >= self.min_aspect
            && aspect <= self.max_aspect
            && quad.area() >= self.min_area_fraction * image_area
    }
}

/// Capability that finds the dominant convex quadrilateral in an image.
///
/// Returns at most one candidate: the most confident one satisfying `params`.
pub trait BoundaryDetector: Send + Sync {
    fn detect_quadrilateral(&self, image: &Image, params: &DetectionParams) -> Option<Quadrilateral>;
}

/// Gaussian blur applied before edge detection
const BLUR_SIGMA: f32 = 2.0;
const CANNY_LOW: f32 = 30.0;
const CANNY_HIGH: f32 = 90.0;
/// Douglas-Peucker tolerance as a share of the contour perimeter
const APPROX_EPSILON: f64 = 0.02;

/// Edge/contour based detector: Canny edges, traced contours, convex hull and
/// polygon simplification down to four vertices. Among the candidates that
/// satisfy the constraints, the one with the largest area wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourBoundaryDetector;

impl BoundaryDetector for ContourBoundaryDetector {
    fn detect_quadrilateral(&self, image: &Image, params: &DetectionParams) -> Option<Quadrilateral> {
        if image.is_empty() {
            return None;
        }
        let (width, height) = image.dimensions();

        let gray = image.as_dynamic().to_luma8();
        let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
        let edges = canny(&blurred, CANNY_LOW, CANNY_HIGH);
        // Close single-pixel gaps so the board outline traces as one contour
        let edges = dilate(&edges, Norm::LInf, 1);

        let contours = find_contours::<i32>(&edges);
        tracing::debug!("Boundary detection: {} contours", contours.len());

        let mut best: Option<Quadrilateral> = None;
        for contour in &contours {
            if contour.points.len() < 4 {
                continue;
            }

            let hull = convex_hull(contour.points.as_slice());
            let perimeter = arc_length(&hull, true);
            let approx = approximate_polygon_dp(&hull, perimeter * APPROX_EPSILON, true);
            if approx.len() != 4 {
                continue;
            }

            let corners = [
                Point::new(approx[0].x as f32, approx[0].y as f32),
                Point::new(approx[1].x as f32, approx[1].y as f32),
                Point::new(approx[2].x as f32, approx[2].y as f32),
                Point::new(approx[3].x as f32, approx[3].y as f32),
            ];
            // Hull vertices come in outline order, which survives simplification
            let quad = Quadrilateral::from_cyclic(corners);

            if !params.accepts(&quad, width, height) {
                continue;
            }
            if best.map_or(true, |b| quad.area() > b.area()) {
                best = Some(quad);
            }
        }

        match &best {
            Some(quad) => tracing::debug!(
                "Board boundary found: area {:.0} px, aspect {:.2}",
                quad.area(),
                quad.aspect_ratio()
            ),
            None => tracing::debug!("No board boundary satisfied the constraints"),
        }

        best
    }
}
