//! Normalized plot model and boundary-type-specific containment.
//!
//! The orchestrator folds the request's shape string, polygon, and circle
//! into a `Plot`; everything downstream (field, placer, refiner, score)
//! works against this one struct. The polygon is always present — inferred
//! from the bounding box or circle when the request omits it — and is
//! normalized to mathematically counter-clockwise vertex order.

use vastuplan_logic::geometry::{
    point_in_polygon, polygon_centroid, polygon_inradius, polygon_signed_area,
    project_onto_polygon, Point, Rect,
};

/// Closed set of plot shapes after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotShape {
    Rectangular,
    Triangular,
    LShaped,
    Irregular,
    Circular,
}

impl PlotShape {
    /// Normalize a request shape string. `square` folds to rectangular,
    /// `t-shaped` to irregular, anything unknown to rectangular.
    pub fn from_tag(tag: &str) -> PlotShape {
        match tag.trim().to_ascii_lowercase().as_str() {
            "triangular" => PlotShape::Triangular,
            "l-shaped" | "l_shaped" | "lshaped" => PlotShape::LShaped,
            "irregular" | "t-shaped" | "t_shaped" => PlotShape::Irregular,
            "circular" => PlotShape::Circular,
            _ => PlotShape::Rectangular,
        }
    }
}

/// Normalized plot: polygon boundary, bounding-box extents, optional circle.
#[derive(Debug, Clone)]
pub struct Plot {
    pub shape: PlotShape,
    pub width: f64,
    pub length: f64,
    pub polygon: Vec<Point>,
    pub circle: Option<(Point, f64)>,
    pub centroid: Point,
    pub inradius: f64,
}

impl Plot {
    pub fn new(
        shape: PlotShape,
        width: f64,
        length: f64,
        mut polygon: Vec<Point>,
        circle: Option<(Point, f64)>,
    ) -> Plot {
        // Downstream clipping assumes mathematically CCW rings.
        if polygon_signed_area(&polygon) < 0.0 {
            polygon.reverse();
        }
        let centroid = polygon_centroid(&polygon);
        let inradius = polygon_inradius(&polygon);
        Plot {
            shape,
            width,
            length,
            polygon,
            circle,
            centroid,
            inradius,
        }
    }

    /// Rectangular plot covering `[0, w] × [0, l]`.
    pub fn rectangular(width: f64, length: f64) -> Plot {
        let polygon = vec![
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, length),
            Point::new(0.0, length),
        ];
        Plot::new(PlotShape::Rectangular, width, length, polygon, None)
    }

    pub fn contains_point(&self, p: Point) -> bool {
        match self.shape {
            PlotShape::Circular => match self.circle {
                Some((c, r)) => p.distance_to(c) <= r + 1e-9,
                None => point_in_polygon(p, &self.polygon),
            },
            _ => point_in_polygon(p, &self.polygon),
        }
    }

    /// Whether an entire footprint (corner ring) lies inside the plot.
    pub fn contains_corners(&self, corners: &[Point]) -> bool {
        corners.iter().all(|&c| self.contains_point(c))
    }

    pub fn contains_rect(&self, rect: &Rect) -> bool {
        self.contains_corners(&rect.corners())
    }

    /// Clamp a room center so the whole `w × h` rectangle lies inside the
    /// plot. Shape-specific: exact for rectangles, circles, and the
    /// axis-aligned right triangle; iterative pull-to-centroid for general
    /// polygons. Rooms larger than the plot settle on the centroid.
    pub fn clamp_center(&self, center: Point, w: f64, h: f64) -> Point {
        let hw = w / 2.0;
        let hh = h / 2.0;
        match self.shape {
            PlotShape::Rectangular => Point::new(
                clamp_axis(center.x, hw, self.width),
                clamp_axis(center.y, hh, self.length),
            ),
            PlotShape::Circular => {
                let (c, r) = self
                    .circle
                    .unwrap_or((Point::new(self.width / 2.0, self.length / 2.0), self.width.min(self.length) / 2.0));
                let half_diag = (hw * hw + hh * hh).sqrt();
                let allowed = (r - half_diag).max(0.0);
                let d = center.distance_to(c);
                if d <= allowed || d < 1e-12 {
                    center
                } else {
                    let s = allowed / d;
                    Point::new(c.x + (center.x - c.x) * s, c.y + (center.y - c.y) * s)
                }
            }
            PlotShape::Triangular => {
                let mut cx = center.x.max(hw);
                let mut cy = center.y.max(hh);
                // Hypotenuse constraint (x_max/W + y_max/L <= 1): project
                // along its gradient, then pin to the leg floors exactly.
                let v = (cx + hw) / self.width + (cy + hh) / self.length - 1.0;
                if v > 0.0 {
                    let g2 = 1.0 / (self.width * self.width) + 1.0 / (self.length * self.length);
                    let t = v / g2;
                    cx -= t / self.width;
                    cy -= t / self.length;
                    if cy < hh {
                        cy = hh;
                        cx = (self.width * (1.0 - (cy + hh) / self.length) - hw).max(hw);
                    } else if cx < hw {
                        cx = hw;
                        cy = (self.length * (1.0 - (cx + hw) / self.width) - hh).max(hh);
                    }
                }
                Point::new(cx, cy)
            }
            PlotShape::LShaped | PlotShape::Irregular => {
                let mut c = center;
                if !point_in_polygon(c, &self.polygon) {
                    let q = project_onto_polygon(c, &self.polygon);
                    c = Point::new(
                        q.x + (self.centroid.x - q.x) * 1e-3,
                        q.y + (self.centroid.y - q.y) * 1e-3,
                    );
                }
                for _ in 0..12 {
                    let rect = Rect::from_center(c.x, c.y, w, h);
                    if self.contains_rect(&rect) {
                        break;
                    }
                    c = Point::new(
                        c.x + (self.centroid.x - c.x) * 0.15,
                        c.y + (self.centroid.y - c.y) * 0.15,
                    );
                }
                c
            }
        }
    }
}

fn clamp_axis(v: f64, half: f64, extent: f64) -> f64 {
    if half * 2.0 >= extent {
        extent / 2.0
    } else {
        v.clamp(half, extent - half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Plot {
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 6.0),
        ];
        Plot::new(PlotShape::Triangular, 10.0, 6.0, poly, None)
    }

    #[test]
    fn test_shape_normalization() {
        assert_eq!(PlotShape::from_tag("square"), PlotShape::Rectangular);
        assert_eq!(PlotShape::from_tag("t-shaped"), PlotShape::Irregular);
        assert_eq!(PlotShape::from_tag("L-Shaped"), PlotShape::LShaped);
        assert_eq!(PlotShape::from_tag("pentagon?!"), PlotShape::Rectangular);
    }

    #[test]
    fn test_cw_polygon_is_reversed() {
        let cw = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ];
        let plot = Plot::new(PlotShape::Rectangular, 10.0, 10.0, cw, None);
        assert!(polygon_signed_area(&plot.polygon) > 0.0);
    }

    #[test]
    fn test_rect_clamp() {
        let plot = Plot::rectangular(10.0, 12.0);
        let c = plot.clamp_center(Point::new(-3.0, 20.0), 4.0, 3.0);
        assert_eq!(c.x, 2.0);
        assert_eq!(c.y, 10.5);
    }

    #[test]
    fn test_triangle_clamp_respects_hypotenuse() {
        let plot = triangle();
        let c = plot.clamp_center(Point::new(9.0, 5.0), 2.0, 2.0);
        let v = (c.x + 1.0) / 10.0 + (c.y + 1.0) / 6.0;
        assert!(v <= 1.0 + 1e-9, "hypotenuse violated: {v}");
        assert!(c.x >= 1.0 && c.y >= 1.0);
    }

    #[test]
    fn test_circular_clamp() {
        let circle = Some((Point::new(6.0, 6.0), 6.0));
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(12.0, 0.0),
            Point::new(12.0, 12.0),
            Point::new(0.0, 12.0),
        ];
        let plot = Plot::new(PlotShape::Circular, 12.0, 12.0, poly, circle);
        let c = plot.clamp_center(Point::new(11.5, 6.0), 2.0, 2.0);
        let half_diag = 2.0_f64.sqrt();
        assert!(c.distance_to(Point::new(6.0, 6.0)) <= 6.0 - half_diag + 1e-9);
    }

    #[test]
    fn test_lshape_clamp_pulls_inside() {
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(12.0, 0.0),
            Point::new(12.0, 5.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let plot = Plot::new(PlotShape::LShaped, 12.0, 10.0, poly, None);
        // Center in the cut-out corner gets pulled into the polygon.
        let c = plot.clamp_center(Point::new(9.0, 8.0), 2.0, 2.0);
        assert!(point_in_polygon(c, &plot.polygon));
    }
}
