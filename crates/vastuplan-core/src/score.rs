//! Final layout scoring.
//!
//! Produces the 0–100 quality score returned to the caller plus the
//! per-term metrics block. The constants deliberately live in one table —
//! the expression mixes meters and dimensionless penalties, and regression
//! tests pin the exact values rather than rederiving them.

use vastuplan_logic::direction::Direction;
use vastuplan_logic::geometry::distance_to_boundary;
use vastuplan_logic::rooms::vastu_preference;

use crate::field::VastuField;
use crate::layout::{gap_between, overlap_area, AdjacencyGraph, RoomState};
use crate::plot::{Plot, PlotShape};
use crate::request::ScoreMetrics;

/// Scoring constants. Kept verbatim for regression testing.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    /// Deduction per overlapping room pair.
    pub overlap_penalty: f64,
    /// Connected rooms farther apart than this (center distance, meters)
    /// start paying a distance penalty.
    pub adjacency_distance_limit: f64,
    pub adjacency_scale: f64,
    /// Deduction per out-of-plot room on rectangular/triangular plots.
    pub out_of_plot_penalty: f64,
    /// Distance multiplier for out-of-plot rooms on polygon plots.
    pub boundary_distance_scale: f64,
    pub vastu_preferred_bonus: f64,
    pub vastu_acceptable_bonus: f64,
    pub vastu_avoid_penalty: f64,
    /// Aspect ratios beyond this are penalized.
    pub aspect_limit: f64,
    pub aspect_scale: f64,
    /// Per-pair overlap treated as zero, m².
    pub overlap_tolerance: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            overlap_penalty: 15.0,
            adjacency_distance_limit: 10.0,
            adjacency_scale: 0.5,
            out_of_plot_penalty: 10.0,
            boundary_distance_scale: 2.0,
            vastu_preferred_bonus: 1.5,
            vastu_acceptable_bonus: 0.5,
            vastu_avoid_penalty: 2.0,
            aspect_limit: 2.2,
            aspect_scale: 3.0,
            overlap_tolerance: 1e-3,
        }
    }
}

/// Compute the final score and its per-term breakdown.
pub fn compute_score(
    rooms: &[RoomState],
    graph: &AdjacencyGraph,
    plot: &Plot,
    field: &VastuField,
    min_gap: f64,
    weights: &ScoreWeights,
) -> (f64, ScoreMetrics) {
    let n = rooms.len();
    let mut score = 100.0;
    let mut metrics = ScoreMetrics::default();

    // Overlaps.
    let mut overlap_count = 0u32;
    for i in 0..n {
        for j in (i + 1)..n {
            let ov = overlap_area(&rooms[i], &rooms[j]);
            metrics.overlap_area += ov;
            if ov > weights.overlap_tolerance {
                overlap_count += 1;
            }
        }
    }
    score -= weights.overlap_penalty * overlap_count as f64;

    // Adjacency distances.
    let mut adjacency_penalty = 0.0;
    for &(i, j, _) in &graph.edges {
        let d = rooms[i].center.distance_to(rooms[j].center);
        if d > weights.adjacency_distance_limit {
            adjacency_penalty += weights.adjacency_scale * (d - weights.adjacency_distance_limit);
        }
    }
    score -= adjacency_penalty;
    metrics.adjacency_score = -adjacency_penalty;

    // Boundary containment.
    let mut boundary_penalty = 0.0;
    for r in rooms {
        let corners = r.footprint();
        if plot.contains_corners(&corners) {
            continue;
        }
        boundary_penalty += match plot.shape {
            PlotShape::Rectangular | PlotShape::Triangular => weights.out_of_plot_penalty,
            _ => {
                let escape = corners
                    .iter()
                    .filter(|&&c| !plot.contains_point(c))
                    .map(|&c| distance_to_boundary(c, &plot.polygon))
                    .fold(0.0_f64, f64::max);
                (weights.boundary_distance_scale * escape).min(weights.out_of_plot_penalty)
            }
        };
    }
    score -= boundary_penalty;
    metrics.boundary_score = -boundary_penalty;

    // Vastu zone bonuses.
    let mut vastu_bonus = 0.0;
    let mut vastu_potential = 0.0;
    for r in rooms {
        let pref = vastu_preference(r.room_type);
        let zone = Direction::label(r.center, plot.width, plot.length);
        if pref.preferred.contains(&zone) {
            vastu_bonus += weights.vastu_preferred_bonus * pref.weight;
        } else if pref.acceptable.contains(&zone) {
            vastu_bonus += weights.vastu_acceptable_bonus * pref.weight;
        } else if pref.avoid.contains(&zone) {
            vastu_bonus -= weights.vastu_avoid_penalty * pref.weight;
        }
        vastu_potential += field.sample(r.center.x, r.center.y, r.room_type);
    }
    score += vastu_bonus;
    metrics.vastu_score = if n > 0 {
        vastu_potential / n as f64 * 100.0
    } else {
        0.0
    };

    // Aspect ratio penalties.
    let mut aspect_penalty = 0.0;
    for r in rooms {
        let ratio = r.aspect_ratio();
        if ratio.is_finite() && ratio > weights.aspect_limit {
            aspect_penalty += weights.aspect_scale * (ratio - weights.aspect_limit);
        }
    }
    score -= aspect_penalty;
    metrics.aspect_ratio_score = -aspect_penalty;

    // Circulation is informational: the refiner already paid for it.
    let mut circulation = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let gap = gap_between(&rooms[i], &rooms[j]);
            if gap < min_gap {
                circulation -= min_gap - gap;
            }
        }
    }
    metrics.circulation_score = circulation;

    let clamped = score.clamp(0.0, 100.0);
    metrics.total_score = clamped;
    (clamped, metrics)
}
