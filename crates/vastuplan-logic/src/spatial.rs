//! Grid-based spatial index over room rectangles.
//!
//! Rooms are bucketed by the integer cells their axis-aligned bounding box
//! touches. Queries return a *superset* of the true intersectors — callers
//! must recheck with exact geometry. The interface (`insert`, `clear`,
//! `query_overlap_candidates`, `query_within`) deliberately admits an R-tree
//! drop-in, but the grid is the only implementation.

use crate::geometry::Rect;
use std::collections::HashMap;

/// Maps integer cell coordinates to the room indices whose bounding boxes
/// touch that cell.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    buckets: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialIndex {
    /// `cell_size` is in meters; pick it so the average bucket stays small
    /// (a few rooms) for the plot sizes of the domain.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1e-6),
            buckets: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn cell_range(&self, rect: &Rect) -> (i64, i64, i64, i64) {
        let min_i = (rect.min_x / self.cell_size).floor() as i64;
        let min_j = (rect.min_y / self.cell_size).floor() as i64;
        let max_i = (rect.max_x / self.cell_size).floor() as i64;
        let max_j = (rect.max_y / self.cell_size).floor() as i64;
        (min_i, min_j, max_i, max_j)
    }

    /// Add `idx` to every cell overlapped by `rect`.
    pub fn insert(&mut self, idx: usize, rect: &Rect) {
        let (min_i, min_j, max_i, max_j) = self.cell_range(rect);
        for i in min_i..=max_i {
            for j in min_j..=max_j {
                self.buckets.entry((i, j)).or_default().push(idx);
            }
        }
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Indices whose bounding boxes may intersect `rect`, sorted and deduped
    /// so downstream float accumulation stays deterministic.
    pub fn query_overlap_candidates(&self, rect: &Rect) -> Vec<usize> {
        let (min_i, min_j, max_i, max_j) = self.cell_range(rect);
        let mut out: Vec<usize> = Vec::new();
        for i in min_i..=max_i {
            for j in min_j..=max_j {
                if let Some(bucket) = self.buckets.get(&(i, j)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Indices within `radius` of `rect` (bounding-box expansion, superset).
    pub fn query_within(&self, rect: &Rect, radius: f64) -> Vec<usize> {
        self.query_overlap_candidates(&rect.expand(radius))
    }

    /// Rebuild from a full set of rectangles.
    pub fn rebuild(&mut self, rects: &[Rect]) {
        self.clear();
        for (idx, rect) in rects.iter().enumerate() {
            self.insert(idx, rect);
        }
    }
}
