//! A mutable bezier path built on kurbo.
//!
//! Thin sugar over [`BezPath`]: shape helpers, centered transforms, and
//! hit-testing, in the coordinate conventions of the drawing surface.

use kurbo::{Affine, Arc, BezPath, Circle, Ellipse, PathEl, Point, Rect, Shape, Vec2};

/// Flattening accuracy for shapes appended as curves.
const CURVE_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BezierPath {
    path: BezPath,
}

impl BezierPath {
    pub fn new() -> Self {
        Self {
            path: BezPath::new(),
        }
    }

    pub fn move_to(&mut self, point: (f64, f64)) {
        self.path.move_to(point);
    }

    pub fn line_to(&mut self, point: (f64, f64)) {
        self.path.line_to(point);
    }

    pub fn curve_to(&mut self, c1: (f64, f64), c2: (f64, f64), end: (f64, f64)) {
        self.path.curve_to(c1, c2, end);
    }

    pub fn quad_to(&mut self, c: (f64, f64), end: (f64, f64)) {
        self.path.quad_to(c, end);
    }

    pub fn close(&mut self) {
        self.path.close_path();
    }

    pub fn add_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.append_shape(&Rect::new(x, y, x + w, y + h));
    }

    pub fn add_oval(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let ellipse = Ellipse::new(
            (x + w / 2.0, y + h / 2.0),
            Vec2::new(w / 2.0, h / 2.0),
            0.0,
        );
        self.append_shape(&ellipse);
    }

    pub fn add_circle(&mut self, center: (f64, f64), radius: f64) {
        self.append_shape(&Circle::new(center, radius));
    }

    pub fn add_polygon(&mut self, points: &[(f64, f64)], close: bool) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.path.move_to(*first);
        for point in rest {
            self.path.line_to(*point);
        }
        if close {
            self.path.close_path();
        }
    }

    /// Append a circular arc around `center`, angles in degrees.
    ///
    /// The sweep runs counterclockwise from `start` to `end` unless
    /// `clockwise` is set. Connects from the current point when the path
    /// is not empty.
    pub fn arc(&mut self, center: (f64, f64), radius: f64, start: f64, end: f64, clockwise: bool) {
        let mut sweep = (end - start).rem_euclid(360.0);
        if clockwise {
            sweep -= 360.0;
        }
        let arc = Arc::new(
            center,
            Vec2::new(radius, radius),
            start.to_radians(),
            sweep.to_radians(),
            0.0,
        );
        self.append_elements(arc.path_elements(CURVE_TOLERANCE));
    }

    pub fn append(&mut self, other: &BezierPath) {
        self.path.extend(other.path.elements().iter().copied());
    }

    /// Append a shape, connecting its lead-in to the current point when
    /// the path already has one.
    fn append_shape(&mut self, shape: &impl Shape) {
        self.append_elements(shape.path_elements(CURVE_TOLERANCE));
    }

    fn append_elements(&mut self, elements: impl Iterator<Item = PathEl>) {
        let connect = !self.path.elements().is_empty();
        for (index, element) in elements.enumerate() {
            match element {
                PathEl::MoveTo(point) if index == 0 && connect => self.path.line_to(point),
                other => self.path.push(other),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.elements().is_empty()
    }

    /// Tight bounding box, or `None` for an empty path.
    pub fn bounds(&self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        Some(self.path.bounding_box())
    }

    /// Nonzero-winding point containment.
    pub fn point_inside(&self, point: (f64, f64)) -> bool {
        self.path.contains(Point::new(point.0, point.1))
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.path.apply_affine(Affine::translate((x, y)));
    }

    pub fn scale(&mut self, sx: f64, sy: f64, center: (f64, f64)) {
        self.transform(Affine::scale_non_uniform(sx, sy), center);
    }

    pub fn rotate(&mut self, degrees: f64, center: (f64, f64)) {
        self.transform(Affine::rotate(degrees.to_radians()), center);
    }

    pub fn skew(&mut self, x_degrees: f64, y_degrees: f64, center: (f64, f64)) {
        self.transform(
            Affine::skew(x_degrees.to_radians().tan(), y_degrees.to_radians().tan()),
            center,
        );
    }

    /// Apply an affine about a center point.
    pub fn transform(&mut self, affine: Affine, center: (f64, f64)) {
        self.path.apply_affine(centered(affine, center));
    }

    pub fn as_bez_path(&self) -> &BezPath {
        &self.path
    }
}

pub(crate) fn centered(affine: Affine, center: (f64, f64)) -> Affine {
    if center == (0.0, 0.0) {
        affine
    } else {
        Affine::translate(center) * affine * Affine::translate((-center.0, -center.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_has_no_bounds() {
        let path = BezierPath::new();
        assert!(path.is_empty());
        assert!(path.bounds().is_none());
    }

    #[test]
    fn rect_bounds_and_containment() {
        let mut path = BezierPath::new();
        path.add_rect(10.0, 20.0, 30.0, 40.0);
        let bounds = path.bounds().unwrap();
        assert_eq!(bounds, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert!(path.point_inside((15.0, 25.0)));
        assert!(!path.point_inside((5.0, 5.0)));
    }

    #[test]
    fn polygon_closes_when_asked() {
        let mut open = BezierPath::new();
        open.add_polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], false);
        assert!(!open
            .as_bez_path()
            .elements()
            .iter()
            .any(|el| matches!(el, PathEl::ClosePath)));

        let mut closed = BezierPath::new();
        closed.add_polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], true);
        assert!(closed
            .as_bez_path()
            .elements()
            .iter()
            .any(|el| matches!(el, PathEl::ClosePath)));
    }

    #[test]
    fn translate_moves_bounds() {
        let mut path = BezierPath::new();
        path.add_rect(0.0, 0.0, 10.0, 10.0);
        path.translate(5.0, -5.0);
        assert_eq!(path.bounds().unwrap(), Rect::new(5.0, -5.0, 15.0, 5.0));
    }

    #[test]
    fn scale_about_center_keeps_center() {
        let mut path = BezierPath::new();
        path.add_rect(0.0, 0.0, 10.0, 10.0);
        path.scale(2.0, 2.0, (5.0, 5.0));
        assert_eq!(path.bounds().unwrap(), Rect::new(-5.0, -5.0, 15.0, 15.0));
    }

    #[test]
    fn arc_connects_from_current_point() {
        let mut path = BezierPath::new();
        path.move_to((0.0, 0.0));
        path.arc((10.0, 0.0), 5.0, 0.0, 90.0, false);
        // A connected arc starts with a line, not a second subpath.
        let moves = path
            .as_bez_path()
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 1);
    }

    #[test]
    fn oval_round_trips_rough_bounds() {
        let mut path = BezierPath::new();
        path.add_oval(0.0, 0.0, 20.0, 10.0);
        let bounds = path.bounds().unwrap();
        assert!((bounds.width() - 20.0).abs() < 0.5);
        assert!((bounds.height() - 10.0).abs() < 0.5);
        assert!(path.point_inside((10.0, 5.0)));
    }
}
