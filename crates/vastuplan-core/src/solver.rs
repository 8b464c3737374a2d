//! Orchestrator: request normalization, the placer → refiner pipeline, and
//! response assembly.
//!
//! Solve pipeline:
//!   1. validate + normalize the request into a `Plot` and `RoomState`s
//!   2. build the adjacency graph and the Vastu field
//!   3. run the placer, then (unless asked not to) the refiner
//!   4. two-phase when outdoor rooms exist: the indoor subset is solved
//!      completely first on the seeded RNG stream — bit-identical to an
//!      indoor-only solve — then frozen while outdoor rooms settle around it
//!   5. score the final layout and assemble the response
//!
//! Everything is a pure function of `(request, seed)`.

use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use vastuplan_logic::direction::Direction;
use vastuplan_logic::geometry::{polygon_area, Point};
use vastuplan_logic::rooms::{adjacency_weight, size_spec, vastu_preference, RoomType};

use crate::field::{FieldParams, VastuField};
use crate::layout::{AdjacencyGraph, RoomState};
use crate::observer::Observer;
use crate::placer::{run_placer, PlacerParams};
use crate::plot::{Plot, PlotShape};
use crate::refiner::{run_refiner, RefinerParams};
use crate::request::{
    Constraints, PlacedRoom, SolveError, SolveRequest, SolveResponse,
};
use crate::score::{compute_score, ScoreWeights};

/// Seed used when the request does not carry one. Solves are deterministic
/// either way — never OS randomness.
const DEFAULT_SEED: u64 = 42;

/// Corner containment slack when emitting boundary warnings, meters.
const CONTAINMENT_EPS: f64 = 1e-6;

/// Solve a layout request, logging through the `log` facade.
pub fn solve(request: &SolveRequest) -> Result<SolveResponse, SolveError> {
    solve_with_observer(request, &mut Observer::logging())
}

/// Solve a layout request with a caller-supplied observer.
pub fn solve_with_observer(
    request: &SolveRequest,
    observer: &mut Observer,
) -> Result<SolveResponse, SolveError> {
    let plot = normalize_plot(request)?;
    if request.rooms.is_empty() {
        return Err(SolveError::InvalidRequest("no rooms requested".into()));
    }

    let constraints = request.constraints.clone().unwrap_or_default();
    let min_gap = constraints.min_circulation.unwrap_or(0.8);
    let house_facing = constraints
        .house_facing
        .as_deref()
        .and_then(Direction::from_tag);

    // Room states in request order, then solve order (priority, stable).
    let n = request.rooms.len();
    let mut states: Vec<RoomState> = Vec::with_capacity(n);
    let mut directions: Vec<Direction> = Vec::with_capacity(n);
    for spec in &request.rooms {
        let (state, dir) = build_room(spec, house_facing);
        states.push(state);
        directions.push(dir);
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (vastu_preference(states[i].room_type).priority, i));

    let outdoor_tags = outdoor_tag_set(request);
    let mut indoor: Vec<(usize, RoomState, Direction)> = Vec::new();
    let mut outdoor: Vec<(usize, RoomState, Direction)> = Vec::new();
    for &i in &order {
        let is_outdoor = states[i].room_type.is_outdoor()
            || outdoor_tags.contains(&states[i].id)
            || outdoor_tags.contains(states[i].room_type.as_tag());
        let entry = (i, states[i].clone(), directions[i]);
        if is_outdoor {
            outdoor.push(entry);
        } else {
            indoor.push(entry);
        }
    }
    if indoor.is_empty() && outdoor.is_empty() {
        return Err(SolveError::Internal("empty room set after partitioning".into()));
    }

    let all_types: Vec<RoomType> = states.iter().map(|s| s.room_type).collect();
    // house_facing redirects the entrance's potential as well as its pull.
    let field_overrides: Vec<(RoomType, Direction)> = house_facing
        .map(|d| (RoomType::Entrance, d))
        .into_iter()
        .collect();
    let field = VastuField::with_overrides(
        &plot.polygon,
        &all_types,
        &field_overrides,
        FieldParams::default(),
    );

    let placer_params = PlacerParams::default();
    let refiner_params = refiner_params_for(request, min_gap);
    let mut rng = ChaCha8Rng::seed_from_u64(request.seed.unwrap_or(DEFAULT_SEED));

    let mut iterations: u32 = 0;
    let mut converged = true;
    let mut warnings: Vec<String> = Vec::new();

    let two_phase = !outdoor.is_empty() && !indoor.is_empty();
    let mut solved: Vec<(usize, RoomState)> = Vec::with_capacity(n);

    if two_phase {
        observer.info(&format!(
            "two-phase solve: {} indoor + {} outdoor rooms",
            indoor.len(),
            outdoor.len()
        ));
        // Phase 1: indoor rooms alone, exactly as an indoor-only request.
        let mut rooms: Vec<RoomState> = indoor.iter().map(|(_, r, _)| r.clone()).collect();
        let dirs: Vec<Direction> = indoor.iter().map(|(_, _, d)| *d).collect();
        let graph = build_graph(&rooms);
        run_phase(
            &mut rooms,
            &dirs,
            &graph,
            &plot,
            &field,
            &HashSet::new(),
            &placer_params,
            &refiner_params,
            request.refine,
            &mut rng,
            observer,
            &mut iterations,
            &mut converged,
            &mut warnings,
        )?;

        // Phase 2: outdoor rooms settle around the frozen indoor core.
        let frozen: HashSet<usize> = (0..rooms.len()).collect();
        let mut combined = rooms;
        let mut combined_dirs = dirs;
        for (_, r, d) in &outdoor {
            combined.push(r.clone());
            combined_dirs.push(*d);
        }
        let graph = build_graph(&combined);
        run_phase(
            &mut combined,
            &combined_dirs,
            &graph,
            &plot,
            &field,
            &frozen,
            &placer_params,
            &refiner_params,
            request.refine,
            &mut rng,
            observer,
            &mut iterations,
            &mut converged,
            &mut warnings,
        )?;

        for (slot, room) in combined.into_iter().enumerate() {
            let orig = if slot < indoor.len() {
                indoor[slot].0
            } else {
                outdoor[slot - indoor.len()].0
            };
            solved.push((orig, room));
        }
    } else {
        let source = if indoor.is_empty() { &outdoor } else { &indoor };
        let mut rooms: Vec<RoomState> = source.iter().map(|(_, r, _)| r.clone()).collect();
        let dirs: Vec<Direction> = source.iter().map(|(_, _, d)| *d).collect();
        let graph = build_graph(&rooms);
        run_phase(
            &mut rooms,
            &dirs,
            &graph,
            &plot,
            &field,
            &HashSet::new(),
            &placer_params,
            &refiner_params,
            request.refine,
            &mut rng,
            observer,
            &mut iterations,
            &mut converged,
            &mut warnings,
        )?;
        for (slot, room) in rooms.into_iter().enumerate() {
            solved.push((source[slot].0, room));
        }
    }

    // Back to request order.
    solved.sort_by_key(|&(orig, _)| orig);
    let final_rooms: Vec<RoomState> = solved.into_iter().map(|(_, r)| r).collect();

    // Containment warnings past numerical tolerance.
    for r in &final_rooms {
        let escaped = r.footprint().iter().any(|&c| {
            !plot.contains_point(c)
                && vastuplan_logic::geometry::distance_to_boundary(c, &plot.polygon)
                    > CONTAINMENT_EPS
        });
        if escaped {
            warnings.push(format!("room {} extends outside the plot", r.id));
        }
    }

    let graph = build_graph(&final_rooms);
    let (score, metrics) = compute_score(
        &final_rooms,
        &graph,
        &plot,
        &field,
        min_gap,
        &ScoreWeights::default(),
    );
    if !score.is_finite() {
        return Err(SolveError::Internal("non-finite final score".into()));
    }

    let rooms = final_rooms
        .iter()
        .map(|r| PlacedRoom {
            id: r.id.clone(),
            name: r.name.clone(),
            room_type: r.room_type.as_tag().to_string(),
            x: r.center.x - r.w / 2.0,
            y: r.center.y - r.h / 2.0,
            width: r.w,
            height: r.h,
            direction: Direction::label(r.center, plot.width, plot.length)
                .as_tag()
                .to_string(),
        })
        .collect();

    observer.info(&format!(
        "solve finished: score {score:.1}, {iterations} iterations, {} warnings",
        warnings.len()
    ));

    Ok(SolveResponse {
        rooms,
        score,
        iterations,
        converged,
        warnings,
        metrics: Some(metrics),
    })
}

/// One placer (+ optional refiner) pass over a room vector.
#[allow(clippy::too_many_arguments)]
fn run_phase(
    rooms: &mut Vec<RoomState>,
    directions: &[Direction],
    graph: &AdjacencyGraph,
    plot: &Plot,
    field: &VastuField,
    fixed: &HashSet<usize>,
    placer_params: &PlacerParams,
    refiner_params: &RefinerParams,
    refine: bool,
    rng: &mut ChaCha8Rng,
    observer: &mut Observer,
    iterations: &mut u32,
    converged: &mut bool,
    warnings: &mut Vec<String>,
) -> Result<(), SolveError> {
    let placed = run_placer(
        rooms,
        directions,
        graph,
        plot,
        field,
        fixed,
        placer_params,
        rng,
        observer,
    );
    *iterations += placed.iterations;
    *converged &= placed.converged;
    // The refiner routinely clears residual placer overlaps; only surface
    // placer warnings when they are final.
    if !refine {
        warnings.extend(placed.warnings);
        return Ok(());
    }
    let refined = run_refiner(
        rooms,
        graph,
        plot,
        field,
        fixed,
        refiner_params,
        rng,
        observer,
    )?;
    *iterations += refined.iterations;
    warnings.extend(refined.warnings);
    Ok(())
}

/// Build one room state plus its resolved pull direction.
fn build_room(
    spec: &crate::request::RoomSpec,
    house_facing: Option<Direction>,
) -> (RoomState, Direction) {
    let room_type = RoomType::from_tag(&spec.room_type);
    let envelope = size_spec(room_type);
    let w = spec
        .width
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(envelope.preferred_w)
        .clamp(envelope.min_w, envelope.max_w);
    let h = spec
        .height
        .filter(|h| h.is_finite() && *h > 0.0)
        .unwrap_or(envelope.preferred_h)
        .clamp(envelope.min_h, envelope.max_h);

    let pref = vastu_preference(room_type);
    let direction = spec
        .direction
        .as_deref()
        .and_then(Direction::from_tag)
        .or(if room_type == RoomType::Entrance {
            house_facing
        } else {
            None
        })
        .or_else(|| pref.preferred.first().copied())
        .unwrap_or(Direction::Center);

    let state = RoomState {
        id: spec.id.clone(),
        name: spec.name.clone().unwrap_or_else(|| spec.id.clone()),
        room_type,
        center: Point::new(0.0, 0.0),
        w,
        h,
        theta: 0.0,
        original_area: w * h,
    };
    (state, direction)
}

/// Adjacency graph over a room slice from the per-type pair table.
pub fn build_graph(rooms: &[RoomState]) -> AdjacencyGraph {
    let mut edges = Vec::new();
    for i in 0..rooms.len() {
        for j in (i + 1)..rooms.len() {
            if let Some(w) = adjacency_weight(rooms[i].room_type, rooms[j].room_type) {
                edges.push((i, j, w));
            }
        }
    }
    AdjacencyGraph { edges }
}

fn outdoor_tag_set(request: &SolveRequest) -> HashSet<String> {
    request
        .outdoor_fixtures
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|s| s.trim().to_ascii_lowercase().replace([' ', '-'], "_"))
        .collect()
}

/// Refiner parameters derived from the request's optimization level and
/// Vastu school.
fn refiner_params_for(request: &SolveRequest, min_gap: f64) -> RefinerParams {
    let (max_iters, alpha) = match request.optimization_level {
        1 => (1500, 0.990),
        3 => (6000, 0.997),
        _ => (3000, 0.995),
    };
    let vastu_scale = match request.vastu_school.to_ascii_lowercase().as_str() {
        "modern" => 0.6,
        "flexible" => 0.3,
        _ => 1.0,
    };
    RefinerParams {
        max_iters,
        alpha,
        vastu_scale,
        min_gap,
        ..RefinerParams::default()
    }
}

// ── Plot normalization ──────────────────────────────────────────────────

/// Fold the request's shape/polygon/circle into a normalized `Plot`.
fn normalize_plot(request: &SolveRequest) -> Result<Plot, SolveError> {
    let w = request.plot_width;
    let l = request.plot_length;
    if !w.is_finite() || !l.is_finite() || w <= 0.0 || l <= 0.0 {
        return Err(SolveError::InvalidRequest(format!(
            "plot dimensions must be positive, got {w} x {l}"
        )));
    }

    let shape = PlotShape::from_tag(&request.plot_shape);
    let constraints = request.constraints.clone().unwrap_or_default();
    let polygon = resolve_polygon(request, &constraints)?;

    match shape {
        PlotShape::Rectangular => match polygon {
            None => Ok(Plot::rectangular(w, l)),
            Some(p) if is_axis_rectangle(&p) => {
                let (bw, bl) = polygon_extents(&p);
                Ok(Plot::new(PlotShape::Rectangular, bw, bl, p, None))
            }
            // A declared-rectangular plot with a non-rectangular polygon is
            // really an irregular one.
            Some(p) => {
                let (bw, bl) = polygon_extents(&p);
                Ok(Plot::new(PlotShape::Irregular, bw, bl, p, None))
            }
        },
        PlotShape::Circular => {
            let circle = constraints
                .circle
                .map(|c| (Point::new(c.center[0], c.center[1]), c.radius))
                .unwrap_or((Point::new(w / 2.0, l / 2.0), w.min(l) / 2.0));
            if circle.1 <= 0.0 {
                return Err(SolveError::InvalidRequest(
                    "circular plot radius must be positive".into(),
                ));
            }
            let polygon = polygon.unwrap_or_else(|| {
                vec![
                    Point::new(0.0, 0.0),
                    Point::new(w, 0.0),
                    Point::new(w, l),
                    Point::new(0.0, l),
                ]
            });
            Ok(Plot::new(PlotShape::Circular, w, l, polygon, Some(circle)))
        }
        PlotShape::Triangular => {
            let polygon = polygon.unwrap_or_else(|| {
                vec![Point::new(0.0, 0.0), Point::new(w, 0.0), Point::new(0.0, l)]
            });
            let (bw, bl) = polygon_extents(&polygon);
            // Only the axis-aligned right triangle gets the dedicated
            // hypotenuse handling; any other triangle takes the polygon path.
            let shape = if is_axis_right_triangle(&polygon) {
                PlotShape::Triangular
            } else {
                PlotShape::Irregular
            };
            Ok(Plot::new(shape, bw, bl, polygon, None))
        }
        PlotShape::LShaped | PlotShape::Irregular => {
            let polygon = polygon.ok_or_else(|| {
                SolveError::InvalidRequest(format!(
                    "plot_shape {:?} requires plot_polygon",
                    request.plot_shape
                ))
            })?;
            let (bw, bl) = polygon_extents(&polygon);
            Ok(Plot::new(shape, bw, bl, polygon, None))
        }
    }
}

fn resolve_polygon(
    request: &SolveRequest,
    constraints: &Constraints,
) -> Result<Option<Vec<Point>>, SolveError> {
    let raw = request
        .plot_polygon
        .as_ref()
        .or(constraints.plot_polygon.as_ref());
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.len() < 3 {
        return Err(SolveError::InvalidRequest(format!(
            "plot_polygon needs at least 3 vertices, got {}",
            raw.len()
        )));
    }
    let polygon: Vec<Point> = raw.iter().map(|v| Point::new(v[0], v[1])).collect();
    if polygon_area(&polygon) <= 0.0 {
        return Err(SolveError::InvalidRequest(
            "plot_polygon has zero area".into(),
        ));
    }
    Ok(Some(polygon))
}

fn polygon_extents(polygon: &[Point]) -> (f64, f64) {
    let mut w = 0.0_f64;
    let mut l = 0.0_f64;
    for p in polygon {
        w = w.max(p.x);
        l = l.max(p.y);
    }
    (w.max(1e-6), l.max(1e-6))
}

/// Axis-aligned rectangle with its min corner at the origin.
fn is_axis_rectangle(polygon: &[Point]) -> bool {
    if polygon.len() != 4 {
        return false;
    }
    let (w, l) = polygon_extents(polygon);
    let eps = 1e-6;
    polygon.iter().all(|p| {
        (p.x.abs() < eps || (p.x - w).abs() < eps) && (p.y.abs() < eps || (p.y - l).abs() < eps)
    })
}

/// Right triangle with the right angle at the origin and legs on the axes.
fn is_axis_right_triangle(polygon: &[Point]) -> bool {
    if polygon.len() != 3 {
        return false;
    }
    let eps = 1e-6;
    let has_origin = polygon.iter().any(|p| p.x.abs() < eps && p.y.abs() < eps);
    let on_x = polygon.iter().any(|p| p.y.abs() < eps && p.x > eps);
    let on_y = polygon.iter().any(|p| p.x.abs() < eps && p.y > eps);
    has_origin && on_x && on_y
}
