//! Force-directed placer.
//!
//! Rooms are point masses with rectangular extents, integrated under damped
//! discrete-time dynamics: adjacency springs pull connected rooms toward an
//! ideal separation, non-adjacent pairs repel, each room is drawn toward its
//! Vastu anchor, and the plot boundary pushes escapees back in. The system
//! runs to quasi-equilibrium, then residual overlaps are resolved by
//! deterministic pairwise separation sweeps.
//!
//! Rooms whose ids are in the `fixed` set never move and never jitter; an
//! empty set recovers single-phase behavior. Between an outdoor and an
//! indoor room the repulsion only moves the outdoor side, so outdoor
//! fixtures wrap around the frozen indoor core.

use std::collections::HashSet;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use vastuplan_logic::direction::Direction;
use vastuplan_logic::geometry::{
    point_in_polygon, project_onto_polygon, project_onto_segment, Point, Rect,
};
use vastuplan_logic::rooms::{size_spec, vastu_preference, RoomType};
use vastuplan_logic::spatial::SpatialIndex;

use crate::field::VastuField;
use crate::layout::{AdjacencyGraph, RoomState};
use crate::observer::Observer;
use crate::plot::{Plot, PlotShape};

/// Placer tuning knobs. Defaults match the production solve path.
#[derive(Debug, Clone, Copy)]
pub struct PlacerParams {
    pub k_attract: f64,
    pub k_repulse: f64,
    pub k_vastu: f64,
    pub k_boundary: f64,
    /// Velocity damping per step.
    pub damping: f64,
    pub dt: f64,
    pub iter_max: u32,
    /// Converged when the largest velocity magnitude drops below this.
    pub convergence_eps: f64,
    /// Repulsion range in meters.
    pub repulsion_radius: f64,
    /// Extra clearance added to the ideal adjacency separation.
    pub ideal_spacing: f64,
    /// Uniform dimension jitter applied at entry (fraction of preferred).
    pub size_jitter: f64,
    /// Max deterministic overlap-resolution sweeps after integration.
    pub resolve_sweeps: u32,
    /// Spatial index cell size for repulsion pruning.
    pub index_cell: f64,
    /// Residual overlap treated as zero, m².
    pub overlap_tolerance: f64,
}

impl Default for PlacerParams {
    fn default() -> Self {
        Self {
            k_attract: 0.7,
            k_repulse: 0.8,
            k_vastu: 1.2,
            k_boundary: 2.0,
            damping: 0.8,
            dt: 0.1,
            iter_max: 100,
            convergence_eps: 0.01,
            repulsion_radius: 5.0,
            ideal_spacing: 0.5,
            size_jitter: 0.05,
            resolve_sweeps: 20,
            index_cell: 5.0,
            overlap_tolerance: 1e-3,
        }
    }
}

/// What the placer reports back alongside the mutated rooms.
#[derive(Debug, Clone)]
pub struct PlacerOutcome {
    pub iterations: u32,
    pub converged: bool,
    pub max_velocity: f64,
    pub warnings: Vec<String>,
}

/// Run the placer over `rooms` in place. `directions[i]` is room i's
/// resolved Vastu direction (request override or the type's first
/// preference); `fixed` holds indices that must not move.
pub fn run_placer(
    rooms: &mut [RoomState],
    directions: &[Direction],
    graph: &AdjacencyGraph,
    plot: &Plot,
    field: &VastuField,
    fixed: &HashSet<usize>,
    params: &PlacerParams,
    rng: &mut ChaCha8Rng,
    observer: &mut Observer,
) -> PlacerOutcome {
    let n = rooms.len();
    let mut warnings = Vec::new();

    // Dimensions are fixed at entry: preferred (or requested) size with a
    // small uniform jitter, clipped to the type envelope.
    for (i, room) in rooms.iter_mut().enumerate() {
        if fixed.contains(&i) {
            continue;
        }
        let spec = size_spec(room.room_type);
        let jw = 1.0 + rng.gen_range(-params.size_jitter..=params.size_jitter);
        let jh = 1.0 + rng.gen_range(-params.size_jitter..=params.size_jitter);
        room.w = (room.w * jw).clamp(spec.min_w, spec.max_w);
        room.h = (room.h * jh).clamp(spec.min_h, spec.max_h);
    }

    // Vastu targets and initial positions.
    let targets: Vec<Point> = (0..n)
        .map(|i| vastu_target(plot, field, rooms[i].room_type, directions[i]))
        .collect();
    for i in 0..n {
        if fixed.contains(&i) {
            continue;
        }
        let jx = rng.gen_range(-0.5..=0.5);
        let jy = rng.gen_range(-0.5..=0.5);
        let start = Point::new(targets[i].x + jx, targets[i].y + jy);
        rooms[i].center = plot.clamp_center(start, rooms[i].w, rooms[i].h);
    }

    let mut velocities = vec![Point::new(0.0, 0.0); n];
    let mut index = SpatialIndex::new(params.index_cell);
    let mut iterations = 0;
    let mut max_velocity = f64::INFINITY;
    let mut converged = false;

    while iterations < params.iter_max {
        index.rebuild(&rooms.iter().map(|r| r.rect()).collect::<Vec<_>>());
        let forces = compute_forces(rooms, &targets, graph, plot, &index, fixed, params, rng);

        max_velocity = 0.0;
        for i in 0..n {
            if fixed.contains(&i) {
                velocities[i] = Point::new(0.0, 0.0);
                continue;
            }
            velocities[i] = Point::new(
                (velocities[i].x + forces[i].x) * params.damping,
                (velocities[i].y + forces[i].y) * params.damping,
            );
            let next = Point::new(
                rooms[i].center.x + velocities[i].x * params.dt,
                rooms[i].center.y + velocities[i].y * params.dt,
            );
            rooms[i].center = plot.clamp_center(next, rooms[i].w, rooms[i].h);
            let speed = (velocities[i].x.powi(2) + velocities[i].y.powi(2)).sqrt();
            if speed > max_velocity {
                max_velocity = speed;
            }
        }
        iterations += 1;
        observer.counters.placer_iterations += 1;

        if max_velocity < params.convergence_eps {
            converged = true;
            break;
        }
    }

    let residual = resolve_overlaps(rooms, plot, fixed, params, observer);
    if residual > 0 {
        warnings.push(format!("{residual} overlaps remain after resolution"));
    }
    if !converged {
        observer.debug(&format!(
            "placer stopped at iteration cap with max velocity {max_velocity:.4}"
        ));
    }

    PlacerOutcome {
        iterations,
        converged,
        max_velocity,
        warnings,
    }
}

/// Map a direction onto the plot frame. Triangular plots anchor along the
/// inradius circle; every other shape uses the canonical bbox anchors.
fn anchor_for(plot: &Plot, direction: Direction) -> Point {
    if plot.shape == PlotShape::Triangular {
        let (ux, uy) = direction.unit_vector();
        let r = plot.inradius * 0.7;
        return Point::new(plot.centroid.x + r * ux, plot.centroid.y + r * uy);
    }
    let (fx, fy) = direction.anchor_fraction();
    Point::new(fx * plot.width, fy * plot.length)
}

/// Pull target for one room: the direction anchor, refined to the best
/// in-polygon field point nearby. The refinement matters on cut-out plots
/// where a bbox anchor can land outside the boundary.
fn vastu_target(plot: &Plot, field: &VastuField, rt: RoomType, direction: Direction) -> Point {
    let anchor = anchor_for(plot, direction);
    if plot.shape == PlotShape::Triangular || vastu_preference(rt).preferred.is_empty() {
        return project_into_plot(anchor, plot);
    }
    let radius = 3.0_f64.max(plot.width.min(plot.length) * 0.2);
    let window = Rect::from_center(anchor.x, anchor.y, 2.0 * radius, 2.0 * radius);
    let best = field.argmax_in_window(rt, &window, radius);
    if field.sample(best.x, best.y, rt) > 0.0 {
        best
    } else {
        project_into_plot(anchor, plot)
    }
}

fn compute_forces(
    rooms: &[RoomState],
    targets: &[Point],
    graph: &AdjacencyGraph,
    plot: &Plot,
    index: &SpatialIndex,
    fixed: &HashSet<usize>,
    params: &PlacerParams,
    rng: &mut ChaCha8Rng,
) -> Vec<Point> {
    let n = rooms.len();
    let mut forces = vec![Point::new(0.0, 0.0); n];

    // Adjacency springs: attractive past the ideal separation, repulsive
    // inside it.
    for &(i, j, w_e) in &graph.edges {
        let (dx, dy) = (
            rooms[j].center.x - rooms[i].center.x,
            rooms[j].center.y - rooms[i].center.y,
        );
        let d = (dx * dx + dy * dy).sqrt();
        if d < 1e-9 {
            continue;
        }
        // Ideal separation sums the max extents; not an exact touching
        // distance for mixed aspect ratios, kept as-is for reproducibility.
        let ideal = (rooms[i].w.max(rooms[j].w) + rooms[i].h.max(rooms[j].h)) / 2.0
            + params.ideal_spacing;
        let mag = params.k_attract * w_e * (d - ideal);
        let (ux, uy) = (dx / d, dy / d);
        if !fixed.contains(&i) {
            forces[i].x += mag * ux;
            forces[i].y += mag * uy;
        }
        if !fixed.contains(&j) {
            forces[j].x -= mag * ux;
            forces[j].y -= mag * uy;
        }
    }

    // Coulomb-like repulsion between non-adjacent pairs within range.
    for i in 0..n {
        let probe = rooms[i].rect();
        for j in index.query_within(&probe, params.repulsion_radius) {
            if j <= i || graph.is_edge(i, j) {
                continue;
            }
            let (dx, dy) = (
                rooms[i].center.x - rooms[j].center.x,
                rooms[i].center.y - rooms[j].center.y,
            );
            let d = (dx * dx + dy * dy).sqrt();
            let outdoor_i = rooms[i].room_type.is_outdoor();
            let outdoor_j = rooms[j].room_type.is_outdoor();
            // Between outdoor and indoor, only the outdoor room yields.
            let (push_i, push_j) = if outdoor_i != outdoor_j {
                (outdoor_i, outdoor_j)
            } else {
                (true, true)
            };
            if d < 0.1 {
                // Degenerate stack: kick apart with a random vector.
                let kx = rng.gen_range(-5.0..=5.0);
                let ky = rng.gen_range(-5.0..=5.0);
                if push_i && !fixed.contains(&i) {
                    forces[i].x += kx;
                    forces[i].y += ky;
                }
                if push_j && !fixed.contains(&j) {
                    forces[j].x -= kx;
                    forces[j].y -= ky;
                }
                continue;
            }
            if d >= params.repulsion_radius {
                continue;
            }
            let mag = params.k_repulse * (params.repulsion_radius / d);
            let (ux, uy) = (dx / d, dy / d);
            if push_i && !fixed.contains(&i) {
                forces[i].x += mag * ux;
                forces[i].y += mag * uy;
            }
            if push_j && !fixed.contains(&j) {
                forces[j].x -= mag * ux;
                forces[j].y -= mag * uy;
            }
        }
    }

    // Vastu pull toward each room's anchor, with a dead zone.
    for i in 0..n {
        if fixed.contains(&i) {
            continue;
        }
        let weight = vastu_preference(rooms[i].room_type).weight;
        let (dx, dy) = (
            targets[i].x - rooms[i].center.x,
            targets[i].y - rooms[i].center.y,
        );
        let d = (dx * dx + dy * dy).sqrt();
        if d < 0.5 {
            continue;
        }
        let mag = params.k_vastu * weight;
        forces[i].x += mag * dx / d;
        forces[i].y += mag * dy / d;
    }

    // Boundary containment.
    for i in 0..n {
        if fixed.contains(&i) {
            continue;
        }
        let f = boundary_force(&rooms[i], plot, params.k_boundary);
        forces[i].x += f.x;
        forces[i].y += f.y;
    }

    forces
}

/// Shape-specific boundary force on one room.
fn boundary_force(room: &RoomState, plot: &Plot, k_b: f64) -> Point {
    let rect = room.rect();
    let mut f = Point::new(0.0, 0.0);
    match plot.shape {
        PlotShape::Rectangular => {
            if rect.min_x < 0.0 {
                f.x += k_b * -rect.min_x;
            }
            if rect.max_x > plot.width {
                f.x -= k_b * (rect.max_x - plot.width);
            }
            if rect.min_y < 0.0 {
                f.y += k_b * -rect.min_y;
            }
            if rect.max_y > plot.length {
                f.y -= k_b * (rect.max_y - plot.length);
            }
        }
        PlotShape::Triangular => {
            // Hard left/north walls, soft hypotenuse gradient.
            if rect.min_x < 0.0 {
                f.x += 5.0 * k_b * -rect.min_x;
            }
            if rect.min_y < 0.0 {
                f.y += 5.0 * k_b * -rect.min_y;
            }
            let v = rect.max_x / plot.width + rect.max_y / plot.length - 1.0;
            if v > 0.0 {
                f.x -= 5.0 * k_b * v / plot.width;
                f.y -= 5.0 * k_b * v / plot.length;
            }
        }
        PlotShape::Circular => {
            let (c, r) = plot
                .circle
                .unwrap_or((plot.centroid, plot.width.min(plot.length) / 2.0));
            for corner in rect.corners() {
                let d = corner.distance_to(c);
                if d > r && d > 1e-9 {
                    let mag = k_b * (d - r);
                    f.x += mag * (c.x - corner.x) / d;
                    f.y += mag * (c.y - corner.y) / d;
                }
            }
        }
        PlotShape::LShaped | PlotShape::Irregular => {
            for corner in rect.corners() {
                if point_in_polygon(corner, &plot.polygon) {
                    continue;
                }
                if let Some((normal, dist)) = inward_normal(corner, plot) {
                    f.x += k_b * dist * normal.x;
                    f.y += k_b * dist * normal.y;
                }
            }
        }
    }
    f
}

/// Inward unit normal of the polygon edge nearest to `p`, flipped toward the
/// centroid if needed, plus the distance to that edge.
fn inward_normal(p: Point, plot: &Plot) -> Option<(Point, f64)> {
    let poly = &plot.polygon;
    let n = poly.len();
    let mut best: Option<(Point, Point, f64)> = None;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        let (q, d) = project_onto_segment(p, a, b);
        if best.as_ref().map_or(true, |&(_, _, bd)| d < bd) {
            let ex = b.x - a.x;
            let ey = b.y - a.y;
            let len = (ex * ex + ey * ey).sqrt();
            if len < 1e-12 {
                continue;
            }
            best = Some((Point::new(-ey / len, ex / len), q, d));
        }
    }
    let (mut normal, q, dist) = best?;
    let toward_centroid = (plot.centroid.x - q.x) * normal.x + (plot.centroid.y - q.y) * normal.y;
    if toward_centroid < 0.0 {
        normal = Point::new(-normal.x, -normal.y);
    }
    Some((normal, dist))
}

/// Deterministic post-integration separation sweeps. Returns the number of
/// pairs still overlapping past tolerance.
fn resolve_overlaps(
    rooms: &mut [RoomState],
    plot: &Plot,
    fixed: &HashSet<usize>,
    params: &PlacerParams,
    observer: &mut Observer,
) -> usize {
    let n = rooms.len();
    for _ in 0..params.resolve_sweeps {
        let mut moved = false;
        for i in 0..n {
            for j in (i + 1)..n {
                if !rooms[i].rect().intersects(&rooms[j].rect()) {
                    continue;
                }
                let required = (rooms[i].w.max(rooms[j].w) + rooms[i].h.max(rooms[j].h)) / 2.0;
                let (dx, dy) = (
                    rooms[j].center.x - rooms[i].center.x,
                    rooms[j].center.y - rooms[i].center.y,
                );
                let d = (dx * dx + dy * dy).sqrt();
                let (ux, uy) = if d < 1e-9 { (1.0, 0.0) } else { (dx / d, dy / d) };
                let push = (required - d) / 2.0;
                if push <= 0.0 {
                    continue;
                }
                let i_free = !fixed.contains(&i);
                let j_free = !fixed.contains(&j);
                // Frozen partner: the free room takes the whole separation.
                let (push_i, push_j) = match (i_free, j_free) {
                    (true, true) => (push, push),
                    (true, false) => (2.0 * push, 0.0),
                    (false, true) => (0.0, 2.0 * push),
                    (false, false) => (0.0, 0.0),
                };
                if push_i > 0.0 {
                    let next = Point::new(
                        rooms[i].center.x - ux * push_i,
                        rooms[i].center.y - uy * push_i,
                    );
                    rooms[i].center = plot.clamp_center(next, rooms[i].w, rooms[i].h);
                    moved = true;
                }
                if push_j > 0.0 {
                    let next = Point::new(
                        rooms[j].center.x + ux * push_j,
                        rooms[j].center.y + uy * push_j,
                    );
                    rooms[j].center = plot.clamp_center(next, rooms[j].w, rooms[j].h);
                    moved = true;
                }
            }
        }
        observer.counters.overlap_sweeps += 1;
        if !moved {
            break;
        }
    }

    let mut residual = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            if rooms[i].rect().overlap_area(&rooms[j].rect()) > params.overlap_tolerance {
                residual += 1;
            }
        }
    }
    residual
}

/// Project a point onto the plot boundary — used by callers placing seeds.
pub fn project_into_plot(p: Point, plot: &Plot) -> Point {
    if plot.contains_point(p) {
        p
    } else {
        project_onto_polygon(p, &plot.polygon)
    }
}
