//! Simulated-annealing refiner.
//!
//! Takes the placer's layout and searches for a lower-energy arrangement
//! with discrete geometric moves under Metropolis acceptance and geometric
//! cooling. The energy combines overlap, Vastu potential, adjacency,
//! circulation, boundary containment, area preservation, and an edge
//! alignment bonus. Every `local_repair_interval` iterations a deterministic
//! repair pass separates overlapping pairs and drags escapees back inside
//! the plot. The best-seen layout is returned, never the last one.

use std::collections::HashSet;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use vastuplan_logic::geometry::{convex_overlap_area, Point};
use vastuplan_logic::spatial::SpatialIndex;

use crate::field::VastuField;
use crate::layout::{gap_between, have_aligned_edges, overlap_area, AdjacencyGraph, RoomState};
use crate::observer::Observer;
use crate::plot::{Plot, PlotShape};
use crate::request::SolveError;

/// Refiner tuning knobs. Defaults match the production solve path.
#[derive(Debug, Clone, Copy)]
pub struct RefinerParams {
    pub t0: f64,
    /// Geometric cooling factor, applied every `cooling_step` iterations.
    pub alpha: f64,
    pub cooling_step: u32,
    pub t_min: f64,
    pub max_iters: u32,
    /// Stop after this many iterations without a new best energy.
    pub stall_patience: u32,
    pub local_repair_interval: u32,
    /// Gaussian translation sigma, meters.
    pub trans_sigma: f64,
    /// Gaussian rotation sigma, radians.
    pub rot_sigma: f64,
    pub resize_min: f64,
    pub resize_max: f64,
    /// Rotation move weight is zero unless enabled.
    pub allow_rotations: bool,
    pub hop_tries: u32,
    pub slide_step: f64,
    pub grid_snap: f64,
    /// Per-pair overlap treated as zero, m².
    pub overlap_tolerance: f64,
    /// Minimum circulation gap between rooms, meters.
    pub min_gap: f64,
    // Energy weights.
    pub lambda_overlap: f64,
    pub lambda_vastu: f64,
    pub lambda_adjacency: f64,
    pub lambda_circulation: f64,
    pub lambda_boundary: f64,
    pub lambda_area: f64,
    pub lambda_alignment: f64,
    /// Vastu school multiplier folded into the vastu term.
    pub vastu_scale: f64,
    /// Spatial index cell size; finer than the placer's.
    pub index_cell: f64,
}

impl Default for RefinerParams {
    fn default() -> Self {
        Self {
            t0: 1.0,
            alpha: 0.995,
            cooling_step: 10,
            t_min: 1e-3,
            max_iters: 3000,
            stall_patience: 300,
            local_repair_interval: 100,
            trans_sigma: 0.5,
            rot_sigma: 30.0_f64.to_radians(),
            resize_min: 0.9,
            resize_max: 1.1,
            allow_rotations: false,
            hop_tries: 10,
            slide_step: 0.1,
            grid_snap: 0.01,
            overlap_tolerance: 1e-3,
            min_gap: 0.8,
            lambda_overlap: 1e5,
            lambda_vastu: 1.0,
            lambda_adjacency: 0.8,
            lambda_circulation: 1.2,
            lambda_boundary: 2.0,
            lambda_area: 0.7,
            lambda_alignment: 0.5,
            vastu_scale: 1.0,
            index_cell: 1.0,
        }
    }
}

/// Refiner report: iteration count, energies, and the improvement history.
#[derive(Debug, Clone)]
pub struct RefinerOutcome {
    pub iterations: u32,
    pub initial_energy: f64,
    pub best_energy: f64,
    pub energy_history: Vec<f64>,
    pub warnings: Vec<String>,
}

/// Anneal `rooms` in place. Indices in `fixed` are never proposed for moves
/// and never touched by repair. Fails only on an unreachable-by-contract
/// NaN energy; a single bad move is rejected, not escalated.
pub fn run_refiner(
    rooms: &mut Vec<RoomState>,
    graph: &AdjacencyGraph,
    plot: &Plot,
    field: &VastuField,
    fixed: &HashSet<usize>,
    params: &RefinerParams,
    rng: &mut ChaCha8Rng,
    observer: &mut Observer,
) -> Result<RefinerOutcome, SolveError> {
    let movable: Vec<usize> = (0..rooms.len()).filter(|i| !fixed.contains(i)).collect();
    if movable.is_empty() {
        return Ok(RefinerOutcome {
            iterations: 0,
            initial_energy: 0.0,
            best_energy: 0.0,
            energy_history: Vec::new(),
            warnings: Vec::new(),
        });
    }

    let mut current = rooms.clone();
    let mut current_energy = energy(&current, graph, plot, field, params);
    if !current_energy.is_finite() {
        return Err(SolveError::Internal(format!(
            "non-finite energy {current_energy} at refiner entry"
        )));
    }
    let initial_energy = current_energy;
    let mut best = current.clone();
    let mut best_energy = current_energy;
    let mut history = vec![current_energy];

    let mut temperature = params.t0;
    let mut iteration: u32 = 0;
    let mut stall: u32 = 0;

    while iteration < params.max_iters && stall < params.stall_patience {
        // Periodic deterministic cleanup.
        if iteration % params.local_repair_interval == 0 {
            local_repair(&mut current, plot, fixed, params);
            current_energy = energy(&current, graph, plot, field, params);
            observer.counters.repair_passes += 1;
            if current_energy < best_energy {
                best = current.clone();
                best_energy = current_energy;
                history.push(best_energy);
                stall = 0;
            }
        }

        if let Some(candidate) = propose_move(&current, &movable, plot, params, rng) {
            let candidate_energy = energy(&candidate, graph, plot, field, params);
            let delta = candidate_energy - current_energy;
            let accept = delta < 0.0
                || (delta.is_finite() && rng.gen::<f64>() < (-delta / temperature).exp());
            if accept {
                current = candidate;
                current_energy = candidate_energy;
                observer.counters.accepted_moves += 1;
                if current_energy < best_energy {
                    best = current.clone();
                    best_energy = current_energy;
                    history.push(best_energy);
                    stall = 0;
                } else {
                    stall += 1;
                }
            } else {
                observer.counters.rejected_moves += 1;
                stall += 1;
            }
        } else {
            // Move produced NaN or escaped the plot; rejected pre-energy.
            observer.counters.rejected_moves += 1;
            stall += 1;
        }

        if iteration % params.cooling_step == 0 {
            temperature = (temperature * params.alpha).max(params.t_min);
        }
        iteration += 1;
        observer.counters.refiner_iterations += 1;
    }

    observer.counters.best_energy = best_energy;
    observer.debug(&format!(
        "refiner finished after {iteration} iterations, energy {initial_energy:.2} -> {best_energy:.2}"
    ));

    let mut warnings = Vec::new();
    let residual = count_overlaps(&best, params.overlap_tolerance);
    if residual > 0 {
        warnings.push(format!("{residual} room pairs overlap after refinement"));
    }

    *rooms = best;
    Ok(RefinerOutcome {
        iterations: iteration,
        initial_energy,
        best_energy,
        energy_history: history,
        warnings,
    })
}

// ── Energy ──────────────────────────────────────────────────────────────

/// Total layout energy; lower is better.
pub fn energy(
    rooms: &[RoomState],
    graph: &AdjacencyGraph,
    plot: &Plot,
    field: &VastuField,
    params: &RefinerParams,
) -> f64 {
    let n = rooms.len();
    let mut index = SpatialIndex::new(params.index_cell);
    index.rebuild(&rooms.iter().map(|r| r.rect()).collect::<Vec<_>>());

    let mut e = 0.0;

    // Overlap, via index candidates.
    for i in 0..n {
        for j in index.query_overlap_candidates(&rooms[i].rect()) {
            if j <= i {
                continue;
            }
            let ov = overlap_area(&rooms[i], &rooms[j]);
            e += params.lambda_overlap * (ov - params.overlap_tolerance).max(0.0);
        }
    }

    // Vastu potential at room centroids (negated: high potential is good).
    for r in rooms {
        e -= params.lambda_vastu
            * params.vastu_scale
            * field.sample(r.center.x, r.center.y, r.room_type);
    }

    // Adjacency: required pairs pay their separation; incidental contacts
    // of non-required pairs pay a small constant.
    for i in 0..n {
        for j in (i + 1)..n {
            let gap = gap_between(&rooms[i], &rooms[j]);
            if graph.is_edge(i, j) {
                if gap > 1e-9 {
                    e += params.lambda_adjacency * gap;
                }
            } else if gap <= 1e-9 {
                e += params.lambda_adjacency * 0.1;
            }
        }
    }

    // Circulation clearance between nearby pairs.
    for i in 0..n {
        for j in index.query_within(&rooms[i].rect(), params.min_gap) {
            if j <= i {
                continue;
            }
            let gap = gap_between(&rooms[i], &rooms[j]);
            if gap < params.min_gap {
                e += params.lambda_circulation * (params.min_gap - gap);
            }
        }
    }

    // Boundary: area outside the plot.
    for r in rooms {
        e += params.lambda_boundary * outside_area(r, plot);
    }

    // Area preservation.
    for r in rooms {
        e += params.lambda_area * (r.area() - r.original_area).abs();
    }

    // Alignment bonus.
    if params.lambda_alignment > 0.0 {
        for i in 0..n {
            for j in (i + 1)..n {
                if have_aligned_edges(&rooms[i], &rooms[j], 0.1) {
                    e -= params.lambda_alignment;
                }
            }
        }
    }

    e
}

/// Area of a room footprint lying outside the plot. Exact for rectangular
/// and triangular boundaries, 5×5-point sampled for circles and general
/// polygons.
pub fn outside_area(room: &RoomState, plot: &Plot) -> f64 {
    let area = room.area();
    if area <= 0.0 {
        return 0.0;
    }
    match plot.shape {
        PlotShape::Rectangular if room.is_axis_aligned() => {
            let rect = room.rect();
            let plot_rect = vastuplan_logic::geometry::Rect::new(0.0, 0.0, plot.width, plot.length);
            (area - rect.overlap_area(&plot_rect)).max(0.0)
        }
        PlotShape::Triangular => {
            let inside = convex_overlap_area(&room.footprint(), &plot.polygon);
            (area - inside).max(0.0)
        }
        _ => {
            // Fraction of a 5×5 corner-to-corner sample grid outside.
            let corners = room.footprint();
            let (o, d1, d2) = (corners[0], corners[1], corners[3]);
            let mut outside = 0u32;
            for a in 0..5 {
                for b in 0..5 {
                    let fa = a as f64 / 4.0;
                    let fb = b as f64 / 4.0;
                    let p = Point::new(
                        o.x + (d1.x - o.x) * fa + (d2.x - o.x) * fb,
                        o.y + (d1.y - o.y) * fa + (d2.y - o.y) * fb,
                    );
                    if !plot.contains_point(p) {
                        outside += 1;
                    }
                }
            }
            area * outside as f64 / 25.0
        }
    }
}

fn count_overlaps(rooms: &[RoomState], tolerance: f64) -> usize {
    let n = rooms.len();
    let mut count = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            if overlap_area(&rooms[i], &rooms[j]) > tolerance {
                count += 1;
            }
        }
    }
    count
}

// ── Moves ───────────────────────────────────────────────────────────────

/// Propose a candidate layout, or `None` when the move degenerates (NaN
/// coordinates or a center escaping the polygon) and must be rejected
/// before energy evaluation.
fn propose_move(
    current: &[RoomState],
    movable: &[usize],
    plot: &Plot,
    params: &RefinerParams,
    rng: &mut ChaCha8Rng,
) -> Option<Vec<RoomState>> {
    let mut next: Vec<RoomState> = current.to_vec();
    let idx = movable[rng.gen_range(0..movable.len())];

    // Move weights: translate / rotate / resize / vastu hop / align,
    // renormalized when rotation is disabled.
    let rot_w = if params.allow_rotations { 0.1 } else { 0.0 };
    let weights = [0.5, rot_w, 0.2, 0.1, 0.1];
    let total: f64 = weights.iter().sum();
    let mut pick = rng.gen_range(0.0..total);
    let mut move_kind = weights.len() - 1;
    for (k, w) in weights.iter().enumerate() {
        if pick < *w {
            move_kind = k;
            break;
        }
        pick -= w;
    }

    match move_kind {
        0 => {
            // Translate by a Gaussian step.
            let dx = gaussian(rng, params.trans_sigma);
            let dy = gaussian(rng, params.trans_sigma);
            let room = &mut next[idx];
            room.center = Point::new(room.center.x + dx, room.center.y + dy);
        }
        1 => {
            // Rotate about the centroid.
            next[idx].theta += gaussian(rng, params.rot_sigma);
        }
        2 => {
            // Area-preserving resize.
            let s = rng.gen_range(params.resize_min..=params.resize_max);
            let room = &mut next[idx];
            room.w *= s;
            room.h /= s;
        }
        3 => {
            // Vastu hop: jump to a uniform in-plot point.
            for _ in 0..params.hop_tries {
                let x = rng.gen_range(0.0..=plot.width);
                let y = rng.gen_range(0.0..=plot.length);
                if plot.contains_point(Point::new(x, y)) {
                    next[idx].center = Point::new(x, y);
                    break;
                }
            }
        }
        _ => {
            // Slide one step toward the nearest neighbor's closest point.
            let mut index = SpatialIndex::new(params.index_cell);
            index.rebuild(&current.iter().map(|r| r.rect()).collect::<Vec<_>>());
            let probe = current[idx].rect();
            for j in index.query_within(&probe, params.slide_step * 2.0) {
                if j == idx {
                    continue;
                }
                let (from, to) = closest_footprint_points(&current[idx], &current[j]);
                let dx = to.x - from.x;
                let dy = to.y - from.y;
                let d = (dx * dx + dy * dy).sqrt();
                if d > 1e-8 {
                    let room = &mut next[idx];
                    room.center = Point::new(
                        room.center.x + dx / d * params.slide_step,
                        room.center.y + dy / d * params.slide_step,
                    );
                }
                break;
            }
        }
    }

    next[idx].snap_to_grid(params.grid_snap);
    // Same whole-rectangle projection the placer applies per step.
    if next[idx].is_axis_aligned() {
        next[idx].center = plot.clamp_center(next[idx].center, next[idx].w, next[idx].h);
    }

    let c = next[idx].center;
    if !c.x.is_finite() || !c.y.is_finite() || next[idx].w <= 0.0 || next[idx].h <= 0.0 {
        return None;
    }
    // A center that escapes the plot is rejected before energy evaluation.
    if !plot.contains_point(c) {
        return None;
    }
    Some(next)
}

/// Closest point pair between two footprints: centroids when intersecting,
/// otherwise the closest vertex pair.
fn closest_footprint_points(a: &RoomState, b: &RoomState) -> (Point, Point) {
    if a.rect().intersects(&b.rect()) {
        return (a.center, b.center);
    }
    let ca = a.footprint();
    let cb = b.footprint();
    let mut best = (ca[0], cb[0]);
    let mut best_d = f64::INFINITY;
    for p in ca {
        for q in cb {
            let d = p.distance_to(q);
            if d < best_d {
                best_d = d;
                best = (p, q);
            }
        }
    }
    best
}

fn gaussian(rng: &mut ChaCha8Rng, sigma: f64) -> f64 {
    Normal::new(0.0, sigma)
        .map(|n| n.sample(rng))
        .unwrap_or(0.0)
}

// ── Local repair ────────────────────────────────────────────────────────

/// Deterministic cleanup: separate overlapping pairs with a translation
/// proportional to the overlap area, snap to grid, then pull escapees back
/// toward the plot centroid until the footprint re-enters.
fn local_repair(
    rooms: &mut [RoomState],
    plot: &Plot,
    fixed: &HashSet<usize>,
    params: &RefinerParams,
) {
    let n = rooms.len();
    let mut index = SpatialIndex::new(params.index_cell);
    index.rebuild(&rooms.iter().map(|r| r.rect()).collect::<Vec<_>>());

    for i in 0..n {
        if fixed.contains(&i) {
            continue;
        }
        let mut shift = Point::new(0.0, 0.0);
        for j in index.query_overlap_candidates(&rooms[i].rect()) {
            if j == i {
                continue;
            }
            let ov = overlap_area(&rooms[i], &rooms[j]);
            if ov <= 0.0 {
                continue;
            }
            let dx = rooms[i].center.x - rooms[j].center.x;
            let dy = rooms[i].center.y - rooms[j].center.y;
            let d = (dx * dx + dy * dy).sqrt();
            if d > 1e-9 {
                let scale = ov.min(params.slide_step);
                shift.x += dx / d * scale;
                shift.y += dy / d * scale;
            }
        }
        if shift.x != 0.0 || shift.y != 0.0 {
            rooms[i].center = Point::new(rooms[i].center.x + shift.x, rooms[i].center.y + shift.y);
        }
    }

    for i in 0..n {
        if fixed.contains(&i) {
            continue;
        }
        rooms[i].snap_to_grid(params.grid_snap);
    }

    // Re-entry: shrink the displacement from the plot centroid by 0.9 until
    // the whole footprint is back inside.
    for i in 0..n {
        if fixed.contains(&i) {
            continue;
        }
        let mut guard = 0;
        while !plot.contains_corners(&rooms[i].footprint()) && guard < 60 {
            let c = rooms[i].center;
            rooms[i].center = Point::new(
                plot.centroid.x + (c.x - plot.centroid.x) * 0.9,
                plot.centroid.y + (c.y - plot.centroid.y) * 0.9,
            );
            guard += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use vastuplan_logic::rooms::{size_spec, RoomType};

    fn make_room(id: &str, rt: RoomType, cx: f64, cy: f64) -> RoomState {
        let spec = size_spec(rt);
        RoomState {
            id: id.to_string(),
            name: id.to_string(),
            room_type: rt,
            center: Point::new(cx, cy),
            w: spec.preferred_w,
            h: spec.preferred_h,
            theta: 0.0,
            original_area: spec.preferred_w * spec.preferred_h,
        }
    }

    fn setup() -> (Vec<RoomState>, AdjacencyGraph, Plot, VastuField) {
        let plot = Plot::rectangular(10.0, 12.0);
        // Deliberately stacked layout: the refiner must pull it apart.
        let rooms = vec![
            make_room("living", RoomType::Living, 5.0, 5.0),
            make_room("kitchen", RoomType::Kitchen, 5.2, 5.2),
            make_room("bed", RoomType::Bedroom, 5.4, 5.4),
        ];
        let graph = AdjacencyGraph {
            edges: vec![(0, 1, 2.0)],
        };
        let types: Vec<RoomType> = rooms.iter().map(|r| r.room_type).collect();
        let field = VastuField::new(
            &plot.polygon,
            &types,
            crate::field::FieldParams {
                resolution: 0.25,
                ..Default::default()
            },
        );
        (rooms, graph, plot, field)
    }

    #[test]
    fn test_best_energy_never_worse_than_input() {
        let (mut rooms, graph, plot, field) = setup();
        let params = RefinerParams {
            max_iters: 600,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut obs = Observer::silent();
        let outcome = run_refiner(
            &mut rooms, &graph, &plot, &field, &HashSet::new(), &params, &mut rng, &mut obs,
        )
        .expect("refiner should not fail");
        assert!(outcome.best_energy <= outcome.initial_energy);
        assert_eq!(
            energy(&rooms, &graph, &plot, &field, &params),
            outcome.best_energy
        );
    }

    #[test]
    fn test_refiner_is_deterministic() {
        let run = || {
            let (mut rooms, graph, plot, field) = setup();
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            let mut obs = Observer::silent();
            let params = RefinerParams {
                max_iters: 400,
                ..Default::default()
            };
            run_refiner(
                &mut rooms, &graph, &plot, &field, &HashSet::new(), &params, &mut rng, &mut obs,
            )
            .expect("refiner should not fail");
            rooms
                .iter()
                .map(|r| (r.center.x, r.center.y, r.w, r.h))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_refiner_separates_stacked_rooms() {
        let (mut rooms, graph, plot, field) = setup();
        let params = RefinerParams::default();
        let before = count_overlaps(&rooms, params.overlap_tolerance);
        assert!(before > 0, "fixture should start overlapped");
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut obs = Observer::silent();
        run_refiner(
            &mut rooms, &graph, &plot, &field, &HashSet::new(), &params, &mut rng, &mut obs,
        )
        .expect("refiner should not fail");
        let after = count_overlaps(&rooms, params.overlap_tolerance);
        assert!(after < before, "overlaps did not improve: {before} -> {after}");
    }

    #[test]
    fn test_fixed_rooms_survive_untouched() {
        let (mut rooms, graph, plot, field) = setup();
        rooms[0].center = Point::new(3.0, 3.0);
        let pinned = (rooms[0].center, rooms[0].w, rooms[0].h);
        let fixed: HashSet<usize> = [0].into_iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut obs = Observer::silent();
        let params = RefinerParams {
            max_iters: 500,
            ..Default::default()
        };
        run_refiner(&mut rooms, &graph, &plot, &field, &fixed, &params, &mut rng, &mut obs)
            .expect("refiner should not fail");
        assert_eq!((rooms[0].center, rooms[0].w, rooms[0].h), pinned);
    }

    #[test]
    fn test_outside_area_rectangular_exact() {
        let plot = Plot::rectangular(10.0, 10.0);
        let mut r = make_room("x", RoomType::Store, 9.5, 5.0);
        r.w = 2.0;
        r.h = 2.0;
        // One meter of width hangs past x = 10.
        assert!((outside_area(&r, &plot) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_outside_area_triangle() {
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 6.0),
        ];
        let plot = Plot::new(PlotShape::Triangular, 10.0, 6.0, poly, None);
        let mut r = make_room("x", RoomType::Store, 1.5, 1.5);
        r.w = 2.0;
        r.h = 2.0;
        // Fully inside near the right angle.
        assert_eq!(outside_area(&r, &plot), 0.0);
        r.center = Point::new(9.0, 5.0);
        assert!(outside_area(&r, &plot) > 0.0);
    }

    #[test]
    fn test_repair_restores_containment() {
        let plot = Plot::rectangular(10.0, 10.0);
        let mut rooms = vec![make_room("x", RoomType::Bedroom, 14.0, 5.0)];
        local_repair(&mut rooms, &plot, &HashSet::new(), &RefinerParams::default());
        assert!(plot.contains_corners(&rooms[0].footprint()));
    }
}
