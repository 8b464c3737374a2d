//! Solve-scoped room state and layout helpers.
//!
//! A `RoomState` is the mutable unit both subsystems work on: a rectangle
//! described by center, extents, and a rotation angle (zero at rest; only
//! the refiner's rotate move makes it nonzero, and that move is off by
//! default). The placer and refiner exchange an owned `Layout` — neither
//! keeps references into the other's buffers.

use vastuplan_logic::geometry::{convex_overlap_area, Point, Rect};
use vastuplan_logic::rooms::RoomType;

/// Mutable per-room solver state.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub id: String,
    pub name: String,
    pub room_type: RoomType,
    pub center: Point,
    pub w: f64,
    pub h: f64,
    /// Rotation about the center, radians. Zero at rest.
    pub theta: f64,
    /// Target area for the refiner's area-preservation term.
    pub original_area: f64,
}

impl RoomState {
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn is_axis_aligned(&self) -> bool {
        self.theta.abs() < 1e-12
    }

    /// Axis-aligned bounding box of the (possibly rotated) footprint.
    pub fn rect(&self) -> Rect {
        if self.is_axis_aligned() {
            return Rect::from_center(self.center.x, self.center.y, self.w, self.h);
        }
        let corners = self.footprint();
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for c in corners {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }
        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// Corner ring of the footprint, counter-clockwise.
    pub fn footprint(&self) -> [Point; 4] {
        let hw = self.w / 2.0;
        let hh = self.h / 2.0;
        let base = [
            (-hw, -hh),
            (hw, -hh),
            (hw, hh),
            (-hw, hh),
        ];
        let (sin, cos) = self.theta.sin_cos();
        let mut out = [Point::new(0.0, 0.0); 4];
        for (i, (dx, dy)) in base.into_iter().enumerate() {
            out[i] = Point::new(
                self.center.x + dx * cos - dy * sin,
                self.center.y + dx * sin + dy * cos,
            );
        }
        out
    }

    /// Aspect ratio, always >= 1.
    pub fn aspect_ratio(&self) -> f64 {
        let lo = self.w.min(self.h);
        if lo <= 0.0 {
            return f64::INFINITY;
        }
        self.w.max(self.h) / lo
    }

    /// Snap the footprint to a fixed grid. Axis-aligned rooms snap their
    /// min corner and extents (idempotent); rotated rooms snap the center.
    pub fn snap_to_grid(&mut self, grid: f64) {
        if grid <= 0.0 {
            return;
        }
        if self.is_axis_aligned() {
            let min_x = snap(self.center.x - self.w / 2.0, grid);
            let min_y = snap(self.center.y - self.h / 2.0, grid);
            self.w = snap(self.w, grid).max(grid);
            self.h = snap(self.h, grid).max(grid);
            self.center = Point::new(min_x + self.w / 2.0, min_y + self.h / 2.0);
        } else {
            self.center = Point::new(snap(self.center.x, grid), snap(self.center.y, grid));
        }
    }
}

fn snap(v: f64, grid: f64) -> f64 {
    (v / grid).round() * grid
}

/// Overlap area between two rooms: the exact AABB intersection when both
/// are axis-aligned, convex polygon clipping otherwise.
pub fn overlap_area(a: &RoomState, b: &RoomState) -> f64 {
    if a.is_axis_aligned() && b.is_axis_aligned() {
        a.rect().overlap_area(&b.rect())
    } else {
        convex_overlap_area(&a.footprint(), &b.footprint())
    }
}

/// Clearance between two rooms' bounding boxes; 0 when touching/overlapping.
pub fn gap_between(a: &RoomState, b: &RoomState) -> f64 {
    a.rect().gap_to(&b.rect())
}

/// Whether any edge of `a` lines up with an edge of `b`: matching slope
/// (vertical handled separately) and at least one endpoint pair within
/// tolerance.
pub fn have_aligned_edges(a: &RoomState, b: &RoomState, tol: f64) -> bool {
    let ca = a.footprint();
    let cb = b.footprint();
    for i in 0..4 {
        let (p1, p2) = (ca[i], ca[(i + 1) % 4]);
        for j in 0..4 {
            let (p3, p4) = (cb[j], cb[(j + 1) % 4]);
            let s1 = slope(p1, p2);
            let s2 = slope(p3, p4);
            let slopes_aligned = match (s1, s2) {
                (None, None) => true,
                (Some(m1), Some(m2)) => (m1 - m2).abs() < tol,
                _ => false,
            };
            if !slopes_aligned {
                continue;
            }
            let endpoint_gap = (p1.y - p3.y)
                .abs()
                .min((p2.y - p4.y).abs())
                .min((p1.x - p3.x).abs())
                .min((p2.x - p4.x).abs());
            if endpoint_gap < tol {
                return true;
            }
        }
    }
    false
}

fn slope(a: Point, b: Point) -> Option<f64> {
    if (b.x - a.x).abs() < 1e-9 {
        None
    } else {
        Some((b.y - a.y) / (b.x - a.x))
    }
}

/// Adjacency graph over room indices. Edges are undirected; weight 2.0
/// marks critical pairs.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    pub edges: Vec<(usize, usize, f64)>,
}

impl AdjacencyGraph {
    pub fn is_edge(&self, i: usize, j: usize) -> bool {
        self.edges
            .iter()
            .any(|&(a, b, _)| (a == i && b == j) || (a == j && b == i))
    }

    pub fn weight(&self, i: usize, j: usize) -> Option<f64> {
        self.edges
            .iter()
            .find(|&&(a, b, _)| (a == i && b == j) || (a == j && b == i))
            .map(|&(_, _, w)| w)
    }
}

/// A layout in flight between the placer and the refiner.
#[derive(Debug, Clone)]
pub struct Layout {
    pub rooms: Vec<RoomState>,
    pub iterations: u32,
    pub converged: bool,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_room(cx: f64, cy: f64, w: f64, h: f64) -> RoomState {
        RoomState {
            id: "r".to_string(),
            name: "Room".to_string(),
            room_type: RoomType::Living,
            center: Point::new(cx, cy),
            w,
            h,
            theta: 0.0,
            original_area: w * h,
        }
    }

    #[test]
    fn test_overlap_axis_aligned() {
        let a = make_room(2.0, 2.0, 4.0, 4.0);
        let b = make_room(4.0, 4.0, 4.0, 4.0);
        assert!((overlap_area(&a, &b) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlap_rotated_uses_clipping() {
        let a = make_room(0.0, 0.0, 2.0, 2.0);
        let mut b = make_room(0.0, 0.0, 2.0, 2.0);
        b.theta = std::f64::consts::FRAC_PI_4;
        // A unit-diagonal square rotated inside the same square: the
        // intersection is an octagon smaller than either square.
        let ov = overlap_area(&a, &b);
        assert!(ov > 3.0 && ov < 4.0, "unexpected overlap {ov}");
    }

    #[test]
    fn test_gap_between() {
        let a = make_room(1.0, 1.0, 2.0, 2.0);
        let b = make_room(6.0, 1.0, 2.0, 2.0);
        assert!((gap_between(&a, &b) - 3.0).abs() < 1e-9);
        let c = make_room(3.0, 1.0, 2.0, 2.0);
        assert_eq!(gap_between(&a, &c), 0.0);
    }

    #[test]
    fn test_snap_is_idempotent() {
        let mut r = make_room(1.2344, 5.6789, 3.333, 2.777);
        r.snap_to_grid(0.01);
        let once = (r.center, r.w, r.h);
        r.snap_to_grid(0.01);
        assert_eq!(once, (r.center, r.w, r.h));
    }

    #[test]
    fn test_aligned_edges() {
        let a = make_room(2.0, 2.0, 4.0, 4.0);
        // Shares the x = 4 edge line with a, touching at a corner.
        let b = make_room(6.0, 6.0, 4.0, 4.0);
        assert!(have_aligned_edges(&a, &b, 0.1));
        let c = make_room(7.3, 3.1, 2.5, 1.9);
        assert!(!have_aligned_edges(&a, &c, 0.01));
    }

    #[test]
    fn test_graph_lookup() {
        let g = AdjacencyGraph {
            edges: vec![(0, 1, 2.0), (1, 2, 1.0)],
        };
        assert!(g.is_edge(1, 0));
        assert_eq!(g.weight(2, 1), Some(1.0));
        assert!(!g.is_edge(0, 2));
    }
}
