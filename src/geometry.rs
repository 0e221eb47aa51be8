//! Rectangle and point math shared by boundary detection, cropping and
//! text layout.
//!
//! All coordinates are image pixel coordinates with the origin at the top-left
//! corner and `y` growing downwards.

use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from two opposite corners, in any order.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let (min_x, max_x) = (x1.min(x2), x1.max(x2));
        let (min_y, max_y) = (y1.min(y2), y1.max(y2));
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Smallest rectangle enclosing every point. `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::from_corners(min_x, min_y, max_x, max_y))
    }

    pub fn min_x(&self) -> f32 {
        self.x
    }

    pub fn min_y(&self) -> f32 {
        self.y
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Integer pixel region `(x, y, width, height)` of this rectangle clipped
    /// to an image of the given size. `None` when nothing of the rectangle
    /// lies inside the image.
    pub fn to_pixel_region(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        if !(self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()) {
            return None;
        }

        let x0 = self.min_x().floor().max(0.0).min(image_width as f32) as u32;
        let y0 = self.min_y().floor().max(0.0).min(image_height as f32) as u32;
        let x1 = self.max_x().ceil().max(0.0).min(image_width as f32) as u32;
        let y1 = self.max_y().ceil().max(0.0).min(image_height as f32) as u32;

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}

/// Four corner points of a detected board boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl Quadrilateral {
    pub fn new(top_left: Point, top_right: Point, bottom_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Assign four unordered points to corners by sorting them around their
    /// centroid, then labelling as [`Quadrilateral::from_cyclic`] does.
    pub fn from_unordered(points: [Point; 4]) -> Self {
        let cx = points.iter().map(|p| p.x).sum::<f32>() / 4.0;
        let cy = points.iter().map(|p| p.y).sum::<f32>() / 4.0;
        let mut sorted = points;
        sorted.sort_by(|a, b| {
            let angle = |p: &Point| (p.y - cy).atan2(p.x - cx);
            angle(a).total_cmp(&angle(b))
        });
        Self::from_cyclic(sorted)
    }

    /// Label four points given in outline order (either direction).
    ///
    /// The outline is turned clockwise on screen (y grows down) and rotated
    /// so the point with the smallest `x + y` is top-left; ties go to the
    /// higher point. Labels stay distinct at any board rotation.
    pub fn from_cyclic(points: [Point; 4]) -> Self {
        let mut pts = points;
        if signed_area(&pts) < 0.0 {
            pts.reverse();
        }

        let start = (0..4)
            .min_by(|&i, &j| {
                let (a, b) = (pts[i], pts[j]);
                (a.x + a.y)
                    .total_cmp(&(b.x + b.y))
                    .then_with(|| a.y.total_cmp(&b.y))
            })
            .unwrap_or(0);
        pts.rotate_left(start);

        Self::new(pts[0], pts[1], pts[3], pts[2])
    }

    /// The quadrilateral covering the whole of a `width` x `height` image.
    pub fn full_extent(width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self::new(
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(0.0, h),
            Point::new(w, h),
        )
    }

    /// Corners in clockwise order starting at the top-left.
    pub fn clockwise(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// Axis-aligned rectangle enclosing all four corners.
    pub fn bounding_rect(&self) -> Rect {
        let corners = self.clockwise();
        Rect::enclosing(&corners).unwrap_or_default()
    }

    /// Area by the shoelace formula.
    pub fn area(&self) -> f32 {
        let pts = self.clockwise();
        let mut area = 0.0;
        for i in 0..4 {
            let j = (i + 1) % 4;
            area += pts[i].x * pts[j].y;
            area -= pts[j].x * pts[i].y;
        }
        area.abs() / 2.0
    }

    /// Mean edge width over mean edge height. Zero for a degenerate shape.
    pub fn aspect_ratio(&self) -> f32 {
        let width = (self.top_left.distance(&self.top_right)
            + self.bottom_left.distance(&self.bottom_right))
            / 2.0;
        let height = (self.top_left.distance(&self.bottom_left)
            + self.top_right.distance(&self.bottom_right))
            / 2.0;
        if height <= f32::EPSILON {
            return 0.0;
        }
        width / height
    }

    /// True when every turn along the clockwise outline has the same sign.
    pub fn is_convex(&self) -> bool {
        let pts = self.clockwise();
        let mut sign = 0.0_f32;
        for i in 0..4 {
            let a = pts[i];
            let b = pts[(i + 1) % 4];
            let c = pts[(i + 2) % 4];
            let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
            if cross.abs() <= f32::EPSILON {
                return false;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(
            self.top_left.translate(dx, dy),
            self.top_right.translate(dx, dy),
            self.bottom_left.translate(dx, dy),
            self.bottom_right.translate(dx, dy),
        )
    }
}

/// Twice the signed area; positive for a clockwise outline in image
/// coordinates.
fn signed_area(pts: &[Point; 4]) -> f32 {
    (0..4)
        .map(|i| {
            let (a, b) = (pts[i], pts[(i + 1) % 4]);
            a.x * b.y - b.x * a.y
        })
        .sum()
}
