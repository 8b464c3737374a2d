//! Vastu potential field Φ.
//!
//! One dense scalar grid per requested room type over the plot bounding box:
//! a max-normalized sum of Gaussians centered on the type's preferred compass
//! anchors, masked to the polygon interior. Values are in [0, 1]; everything
//! outside the polygon samples as 0; types with no declared preferences
//! sample as a flat 0.5. Read-only after construction.

use std::cell::RefCell;
use std::collections::HashMap;

use vastuplan_logic::direction::Direction;
use vastuplan_logic::geometry::{point_in_polygon, Point, Rect};
use vastuplan_logic::rooms::{vastu_preference, RoomType};

/// Field construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct FieldParams {
    /// Grid resolution in meters.
    pub resolution: f64,
    /// Gaussian spread around each preferred anchor, meters.
    pub sigma: f64,
    /// Enable the point-sample cache.
    pub cache: bool,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            resolution: 0.05,
            sigma: 2.0,
            cache: true,
        }
    }
}

/// Per-type potential grids over the plot bounding box.
pub struct VastuField {
    params: FieldParams,
    xmin: f64,
    ymin: f64,
    width: f64,
    height: f64,
    nx: usize,
    ny: usize,
    polygon: Vec<Point>,
    grids: HashMap<RoomType, Vec<f64>>,
    cache: Option<RefCell<HashMap<(i64, i64, RoomType), f64>>>,
}

impl VastuField {
    pub fn new(polygon: &[Point], room_types: &[RoomType], params: FieldParams) -> VastuField {
        VastuField::with_overrides(polygon, room_types, &[], params)
    }

    /// Like [`VastuField::new`], but `overrides` replaces the preferred
    /// anchor set of the named types (e.g. `house_facing` steering the
    /// entrance).
    pub fn with_overrides(
        polygon: &[Point],
        room_types: &[RoomType],
        overrides: &[(RoomType, Direction)],
        params: FieldParams,
    ) -> VastuField {
        let (xmin, ymin, xmax, ymax) = bounds(polygon);
        let width = (xmax - xmin).max(params.resolution);
        let height = (ymax - ymin).max(params.resolution);
        let nx = (width / params.resolution).ceil() as usize + 1;
        let ny = (height / params.resolution).ceil() as usize + 1;

        let mut field = VastuField {
            params,
            xmin,
            ymin,
            width,
            height,
            nx,
            ny,
            polygon: polygon.to_vec(),
            grids: HashMap::new(),
            cache: params.cache.then(|| RefCell::new(HashMap::new())),
        };

        // Inside-polygon mask, shared by every type grid.
        let mut mask = vec![false; nx * ny];
        for j in 0..ny {
            for i in 0..nx {
                let p = field.grid_point(i, j);
                mask[j * nx + i] = point_in_polygon(p, polygon);
            }
        }

        let mut seen: Vec<RoomType> = Vec::new();
        for &rt in room_types {
            if seen.contains(&rt) {
                continue;
            }
            seen.push(rt);
            let forced = overrides
                .iter()
                .find(|(t, _)| *t == rt)
                .map(|&(_, d)| d);
            if let Some(grid) = field.build_grid(rt, forced, &mask) {
                field.grids.insert(rt, grid);
            }
        }
        field
    }

    fn grid_point(&self, i: usize, j: usize) -> Point {
        Point::new(
            self.xmin + i as f64 * self.params.resolution,
            self.ymin + j as f64 * self.params.resolution,
        )
    }

    /// Build the grid for one type; `None` for preference-less types, which
    /// sample as flat 0.5 instead.
    fn build_grid(&self, rt: RoomType, forced: Option<Direction>, mask: &[bool]) -> Option<Vec<f64>> {
        let pref = vastu_preference(rt);
        let directions: Vec<Direction> = match forced {
            Some(d) => vec![d],
            None => pref.preferred.to_vec(),
        };
        if directions.is_empty() {
            return None;
        }
        let sigma2 = 2.0 * self.params.sigma * self.params.sigma;
        let anchors: Vec<Point> = directions.iter().map(|d| self.anchor_point(*d)).collect();

        let mut grid = vec![0.0_f64; self.nx * self.ny];
        let mut max_val = 0.0_f64;
        for j in 0..self.ny {
            for i in 0..self.nx {
                if !mask[j * self.nx + i] {
                    continue;
                }
                let p = self.grid_point(i, j);
                let mut v = 0.0;
                for a in &anchors {
                    let d2 = (p.x - a.x).powi(2) + (p.y - a.y).powi(2);
                    v += pref.weight * (-d2 / sigma2).exp();
                }
                grid[j * self.nx + i] = v;
                if v > max_val {
                    max_val = v;
                }
            }
        }
        if max_val > 0.0 {
            for v in &mut grid {
                *v /= max_val;
            }
        }
        Some(grid)
    }

    /// Plot-frame position of a direction's canonical anchor.
    pub fn anchor_point(&self, d: Direction) -> Point {
        let (fx, fy) = d.anchor_fraction();
        Point::new(self.xmin + fx * self.width, self.ymin + fy * self.height)
    }

    /// Sample Φ at a point for a room type. 0 outside the polygon, bilinear
    /// interpolation inside, flat 0.5 for types without a grid.
    pub fn sample(&self, x: f64, y: f64, rt: RoomType) -> f64 {
        if let Some(cache) = &self.cache {
            let key = self.cache_key(x, y, rt);
            if let Some(&v) = cache.borrow().get(&key) {
                return v;
            }
            let v = self.sample_uncached(x, y, rt);
            cache.borrow_mut().insert(key, v);
            return v;
        }
        self.sample_uncached(x, y, rt)
    }

    fn cache_key(&self, x: f64, y: f64, rt: RoomType) -> (i64, i64, RoomType) {
        // Quantum well under the gradient's 0.1·resolution probe step, so
        // central-difference samples never collide onto one key.
        let q = self.params.resolution * 0.01;
        ((x / q).round() as i64, (y / q).round() as i64, rt)
    }

    fn sample_uncached(&self, x: f64, y: f64, rt: RoomType) -> f64 {
        if !point_in_polygon(Point::new(x, y), &self.polygon) {
            return 0.0;
        }
        match self.grids.get(&rt) {
            None => 0.5,
            Some(grid) => self.bilinear(x, y, grid),
        }
    }

    fn bilinear(&self, x: f64, y: f64, grid: &[f64]) -> f64 {
        let gx = (x - self.xmin) / self.params.resolution;
        let gy = (y - self.ymin) / self.params.resolution;
        let i0 = (gx.floor() as i64).clamp(0, self.nx as i64 - 1) as usize;
        let j0 = (gy.floor() as i64).clamp(0, self.ny as i64 - 1) as usize;
        let i1 = (i0 + 1).min(self.nx - 1);
        let j1 = (j0 + 1).min(self.ny - 1);
        let wx = (gx - i0 as f64).clamp(0.0, 1.0);
        let wy = (gy - j0 as f64).clamp(0.0, 1.0);
        let g = |i: usize, j: usize| grid[j * self.nx + i];
        (1.0 - wx) * (1.0 - wy) * g(i0, j0)
            + wx * (1.0 - wy) * g(i1, j0)
            + (1.0 - wx) * wy * g(i0, j1)
            + wx * wy * g(i1, j1)
    }

    /// Gradient ∇Φ by central differences with step 0.1·resolution.
    pub fn gradient(&self, x: f64, y: f64, rt: RoomType) -> (f64, f64) {
        let eps = self.params.resolution * 0.1;
        let gx = (self.sample(x + eps, y, rt) - self.sample(x - eps, y, rt)) / (2.0 * eps);
        let gy = (self.sample(x, y + eps, rt) - self.sample(x, y - eps, rt)) / (2.0 * eps);
        (gx, gy)
    }

    /// Highest-potential grid point for `rt` within `bbox` intersected with
    /// a circle of `radius` around the bbox center. Ties break toward the
    /// lexicographically first grid cell.
    pub fn argmax_in_window(&self, rt: RoomType, bbox: &Rect, radius: f64) -> Point {
        let center = bbox.center();
        let mut best_val = f64::NEG_INFINITY;
        let mut best = center;
        for j in 0..self.ny {
            for i in 0..self.nx {
                let p = self.grid_point(i, j);
                if !bbox.contains_point(p) || p.distance_to(center) > radius {
                    continue;
                }
                let v = self.sample(p.x, p.y, rt);
                if v > best_val {
                    best_val = v;
                    best = p;
                }
            }
        }
        best
    }
}

fn bounds(polygon: &[Point]) -> (f64, f64, f64, f64) {
    let mut xmin = f64::INFINITY;
    let mut ymin = f64::INFINITY;
    let mut xmax = f64::NEG_INFINITY;
    let mut ymax = f64::NEG_INFINITY;
    for p in polygon {
        xmin = xmin.min(p.x);
        ymin = ymin.min(p.y);
        xmax = xmax.max(p.x);
        ymax = ymax.max(p.y);
    }
    if polygon.is_empty() {
        return (0.0, 0.0, 1.0, 1.0);
    }
    (xmin, ymin, xmax, ymax)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_polygon(w: f64, l: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, l),
            Point::new(0.0, l),
        ]
    }

    fn coarse() -> FieldParams {
        FieldParams {
            resolution: 0.25,
            ..FieldParams::default()
        }
    }

    #[test]
    fn test_bounds_and_outside_zero() {
        let poly = rect_polygon(10.0, 8.0);
        let field = VastuField::new(&poly, &[RoomType::Kitchen], coarse());
        for &(x, y) in &[(1.0, 1.0), (5.0, 4.0), (9.0, 7.0), (0.5, 7.5)] {
            let v = field.sample(x, y, RoomType::Kitchen);
            assert!((0.0..=1.0).contains(&v), "phi out of range at ({x},{y}): {v}");
        }
        assert_eq!(field.sample(-1.0, 4.0, RoomType::Kitchen), 0.0);
        assert_eq!(field.sample(5.0, 9.0, RoomType::Kitchen), 0.0);
    }

    #[test]
    fn test_kitchen_prefers_southeast() {
        // Kitchen anchor is SE = (0.75·w, 0.75·l) under the +y-south frame.
        let poly = rect_polygon(10.0, 8.0);
        let field = VastuField::new(&poly, &[RoomType::Kitchen], coarse());
        let se = field.sample(7.5, 6.0, RoomType::Kitchen);
        let nw = field.sample(2.5, 2.0, RoomType::Kitchen);
        assert!(se > nw, "kitchen SE {se} should beat NW {nw}");
    }

    #[test]
    fn test_untyped_is_flat_half() {
        let poly = rect_polygon(10.0, 10.0);
        let field = VastuField::new(&poly, &[RoomType::Untyped], coarse());
        assert_eq!(field.sample(5.0, 5.0, RoomType::Untyped), 0.5);
        assert_eq!(field.sample(1.0, 9.0, RoomType::Untyped), 0.5);
        assert_eq!(field.sample(-1.0, 5.0, RoomType::Untyped), 0.0);
    }

    #[test]
    fn test_normalized_peak_reaches_one() {
        let poly = rect_polygon(10.0, 10.0);
        let field = VastuField::new(&poly, &[RoomType::Pooja], coarse());
        // Pooja's single anchor is NE; the grid maximum normalizes to 1.
        let peak = field.sample(7.5, 2.5, RoomType::Pooja);
        assert!(peak > 0.98, "peak {peak} should be ~1");
    }

    #[test]
    fn test_gradient_points_toward_anchor() {
        let poly = rect_polygon(10.0, 10.0);
        let field = VastuField::new(&poly, &[RoomType::Pooja], coarse());
        // From the center, potential increases toward the NE anchor (7.5, 2.5).
        let (gx, gy) = field.gradient(5.0, 5.0, RoomType::Pooja);
        assert!(gx > 0.0);
        assert!(gy < 0.0);
    }

    #[test]
    fn test_argmax_in_window() {
        let poly = rect_polygon(10.0, 10.0);
        let field = VastuField::new(&poly, &[RoomType::Kitchen], coarse());
        let window = Rect::new(5.0, 5.0, 10.0, 10.0);
        let p = field.argmax_in_window(RoomType::Kitchen, &window, 10.0);
        // SE anchor (7.5, 7.5) dominates the window.
        assert!(p.x > 6.0 && p.y > 6.0, "argmax {p:?} not near SE anchor");
    }

    #[test]
    fn test_sampling_with_cache_matches_uncached() {
        let poly = rect_polygon(10.0, 8.0);
        let cached = VastuField::new(&poly, &[RoomType::Kitchen], coarse());
        let uncached = VastuField::new(
            &poly,
            &[RoomType::Kitchen],
            FieldParams {
                cache: false,
                ..coarse()
            },
        );
        for &(x, y) in &[(2.0, 2.0), (7.5, 6.0), (5.0, 4.0)] {
            let a = cached.sample(x, y, RoomType::Kitchen);
            let b = uncached.sample(x, y, RoomType::Kitchen);
            assert_eq!(a, b);
        }
    }
}
