//! Integration tests for the full solve pipeline.
//!
//! Exercises: request normalization → Vastu field → force-directed placer
//! → simulated-annealing refiner → scoring, over the standard plot shapes
//! (rectangular, triangular, L-shaped) plus the two-phase outdoor path.
//!
//! All tests are pure logic — no I/O, no clock, fixed seeds throughout.

use vastuplan_core::request::{RoomSpec, SolveRequest, SolveResponse};
use vastuplan_core::solver::solve;
use vastuplan_logic::geometry::{distance_to_boundary, point_in_polygon, Point};

// ── Helpers ────────────────────────────────────────────────────────────

fn room(id: &str, ty: &str) -> RoomSpec {
    RoomSpec {
        id: id.to_string(),
        name: None,
        room_type: ty.to_string(),
        width: None,
        height: None,
        direction: None,
    }
}

fn sized_room(id: &str, ty: &str, w: f64, h: f64) -> RoomSpec {
    RoomSpec {
        width: Some(w),
        height: Some(h),
        ..room(id, ty)
    }
}

fn base_request(rooms: Vec<RoomSpec>, w: f64, l: f64) -> SolveRequest {
    SolveRequest {
        rooms,
        plot_width: w,
        plot_length: l,
        plot_shape: "rectangular".to_string(),
        plot_polygon: None,
        orientation: None,
        outdoor_fixtures: None,
        constraints: None,
        optimization_level: 2,
        vastu_school: "classical".to_string(),
        refine: true,
        seed: Some(42),
    }
}

/// S1 fixture: rectangular 10×12 with five rooms at their target areas.
fn five_room_request() -> SolveRequest {
    base_request(
        vec![
            sized_room("living", "living", 5.0, 4.0),   // 20 m²
            sized_room("kitchen", "kitchen", 3.0, 4.0), // 12 m²
            sized_room("master", "master_bedroom", 4.0, 4.0), // 16 m²
            sized_room("bed2", "bedroom", 3.5, 3.5),    // ~12 m²
            sized_room("bath", "bathroom", 2.5, 2.4),   // 6 m²
        ],
        10.0,
        12.0,
    )
}

fn centroid(r: &vastuplan_core::request::PlacedRoom) -> Point {
    Point::new(r.x + r.width / 2.0, r.y + r.height / 2.0)
}

fn corners(r: &vastuplan_core::request::PlacedRoom) -> [Point; 4] {
    [
        Point::new(r.x, r.y),
        Point::new(r.x + r.width, r.y),
        Point::new(r.x + r.width, r.y + r.height),
        Point::new(r.x, r.y + r.height),
    ]
}

fn total_overlap(res: &SolveResponse) -> f64 {
    let mut total = 0.0;
    for i in 0..res.rooms.len() {
        for j in (i + 1)..res.rooms.len() {
            let a = &res.rooms[i];
            let b = &res.rooms[j];
            let w = (a.x + a.width).min(b.x + b.width) - a.x.max(b.x);
            let h = (a.y + a.height).min(b.y + b.height) - a.y.max(b.y);
            if w > 0.0 && h > 0.0 {
                total += w * h;
            }
        }
    }
    total
}

fn geometry_of(res: &SolveResponse) -> Vec<(f64, f64, f64, f64)> {
    res.rooms
        .iter()
        .map(|r| (r.x, r.y, r.width, r.height))
        .collect()
}

/// Corner containment up to tolerance, against an explicit polygon.
fn contained_or_warned(res: &SolveResponse, polygon: &[Point]) {
    for r in &res.rooms {
        for c in corners(r) {
            let inside = point_in_polygon(c, polygon) || distance_to_boundary(c, polygon) <= 1e-6;
            if !inside {
                assert!(
                    !res.warnings.is_empty(),
                    "room {} corner {c:?} outside with no warning",
                    r.id
                );
                return;
            }
        }
    }
}

fn rect_polygon(w: f64, l: f64) -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, l),
        Point::new(0.0, l),
    ]
}

// ── S1: rectangular five-room plan ─────────────────────────────────────

#[test]
fn rectangular_five_rooms_score_and_zones() {
    let res = solve(&five_room_request()).expect("solve should succeed");
    assert_eq!(res.rooms.len(), 5);
    assert!((0.0..=100.0).contains(&res.score));
    assert!(res.score >= 70.0, "score too low: {}", res.score);
    assert!(
        total_overlap(&res) <= 1e-3 * res.rooms.len() as f64 || !res.warnings.is_empty(),
        "silent overlap of {}",
        total_overlap(&res)
    );

    // Kitchen sits in the south-east quadrant (+y runs south), master in
    // the south-west.
    let kitchen = centroid(&res.rooms[1]);
    assert!(
        kitchen.x > 5.0 && kitchen.y > 6.0,
        "kitchen not SE: {kitchen:?}"
    );
    let master = centroid(&res.rooms[2]);
    assert!(
        master.x < 5.0 && master.y > 6.0,
        "master not SW: {master:?}"
    );
}

#[test]
fn rectangular_five_rooms_contained() {
    let res = solve(&five_room_request()).expect("solve should succeed");
    contained_or_warned(&res, &rect_polygon(10.0, 12.0));
}

// ── S2: triangular plot ────────────────────────────────────────────────

#[test]
fn triangular_plot_keeps_centroids_inside() {
    let triangle = vec![[0.0, 0.0], [10.0, 0.0], [0.0, 6.0]];
    let mut req = base_request(
        vec![room("living", "living"), room("kitchen", "kitchen")],
        10.0,
        6.0,
    );
    req.plot_shape = "triangular".to_string();
    req.plot_polygon = Some(triangle.clone());
    let res = solve(&req).expect("solve should succeed");

    let poly: Vec<Point> = triangle.iter().map(|v| Point::new(v[0], v[1])).collect();
    for r in &res.rooms {
        let c = centroid(r);
        assert!(
            point_in_polygon(c, &poly),
            "room {} centroid outside triangle: {c:?}",
            r.id
        );
    }
    assert!((0.0..=100.0).contains(&res.score));
}

// ── S3: L-shaped plot ──────────────────────────────────────────────────

#[test]
fn lshaped_plot_avoids_cutout_and_keeps_adjacency() {
    let l_poly = vec![
        [0.0, 0.0],
        [12.0, 0.0],
        [12.0, 5.0],
        [5.0, 5.0],
        [5.0, 10.0],
        [0.0, 10.0],
    ];
    let mut req = base_request(
        vec![
            room("living", "living"),
            room("kitchen", "kitchen"),
            room("dining", "dining"),
            room("master", "master_bedroom"),
            room("bed2", "bedroom"),
            room("bath", "bathroom"),
        ],
        12.0,
        10.0,
    );
    req.plot_shape = "l-shaped".to_string();
    req.plot_polygon = Some(l_poly.clone());
    let res = solve(&req).expect("solve should succeed");

    let poly: Vec<Point> = l_poly.iter().map(|v| Point::new(v[0], v[1])).collect();
    for r in &res.rooms {
        let c = centroid(r);
        assert!(
            point_in_polygon(c, &poly),
            "room {} centroid in the cut-out: {c:?}",
            r.id
        );
        assert!(
            !(c.x > 5.0 && c.y > 5.0),
            "room {} centroid in the removed rectangle: {c:?}",
            r.id
        );
    }

    // Required adjacencies: kitchen–dining, kitchen–living, living–dining,
    // master–bath, bed2–bath. Most should end up near each other.
    let pairs = [(1, 2), (1, 0), (0, 2), (3, 5), (4, 5)];
    let close = pairs
        .iter()
        .filter(|&&(a, b)| centroid(&res.rooms[a]).distance_to(centroid(&res.rooms[b])) < 10.0)
        .count();
    assert!(close >= 3, "only {close} adjacent pairs within range");
}

// ── S4: outdoor two-phase ──────────────────────────────────────────────

fn indoor_rooms() -> Vec<RoomSpec> {
    vec![
        room("living", "living"),
        room("kitchen", "kitchen"),
        room("master", "master_bedroom"),
    ]
}

#[test]
fn two_phase_preserves_indoor_layout() {
    let indoor_only = base_request(indoor_rooms(), 15.0, 15.0);
    let indoor_res = solve(&indoor_only).expect("indoor solve should succeed");

    let mut full_rooms = indoor_rooms();
    full_rooms.push(room("garden", "garden"));
    full_rooms.push(room("parking", "parking"));
    let full = base_request(full_rooms, 15.0, 15.0);
    let full_res = solve(&full).expect("two-phase solve should succeed");

    // Indoor geometry is bit-identical: the indoor subset runs first on the
    // same seeded stream, then freezes.
    for (a, b) in indoor_res.rooms.iter().zip(full_res.rooms.iter().take(3)) {
        assert_eq!(a.id, b.id);
        assert_eq!((a.x, a.y, a.width, a.height), (b.x, b.y, b.width, b.height));
    }
}

#[test]
fn two_phase_outdoor_zones() {
    // Indoor anchors (SE, SW, W) leave the garden's NE corner free.
    let rooms = vec![
        room("kitchen", "kitchen"),
        room("master", "master_bedroom"),
        room("dining", "dining"),
        room("garden", "garden"),
        room("parking", "parking"),
    ];
    let res = solve(&base_request(rooms, 15.0, 15.0)).expect("solve should succeed");

    let garden = centroid(&res.rooms[3]);
    assert!(
        garden.x > 7.5 && garden.y < 7.5,
        "garden not in NE: {garden:?}"
    );
    let parking = centroid(&res.rooms[4]);
    let in_se = parking.x > 7.5 && parking.y > 7.5;
    let in_nw = parking.x < 7.5 && parking.y < 7.5;
    assert!(in_se || in_nw, "parking not in SE/NW: {parking:?}");
}

// ── S5: degenerate overpack ────────────────────────────────────────────

#[test]
fn overpacked_plot_returns_best_effort_with_warnings() {
    // Ten master bedrooms ≈ 168 m² of target area on a 100 m² plot.
    let rooms: Vec<RoomSpec> = (0..10)
        .map(|i| room(&format!("m{i}"), "master_bedroom"))
        .collect();
    let res = solve(&base_request(rooms, 10.0, 10.0)).expect("overpack must still answer");

    assert_eq!(res.rooms.len(), 10);
    assert!(
        res.warnings.iter().any(|w| w.contains("overlap")),
        "expected an overlap warning, got {:?}",
        res.warnings
    );
    assert!(res.score < 50.0, "overpacked score too generous: {}", res.score);
    assert!((0.0..=100.0).contains(&res.score));
}

// ── S6 and universal properties ────────────────────────────────────────

#[test]
fn repeated_solves_are_bitwise_identical() {
    let a = solve(&five_room_request()).expect("first solve");
    let b = solve(&five_room_request()).expect("second solve");
    assert_eq!(geometry_of(&a), geometry_of(&b));
    assert_eq!(a.score, b.score);
    assert_eq!(a.iterations, b.iterations);
    assert_eq!(a.warnings, b.warnings);
}

#[test]
fn different_seeds_may_vary_but_stay_valid() {
    let mut distinct = std::collections::HashSet::new();
    for seed in 0..5u64 {
        let mut req = five_room_request();
        req.seed = Some(seed);
        let res = solve(&req).expect("solve should succeed");
        assert!((0.0..=100.0).contains(&res.score));
        distinct.insert(format!("{:?}", geometry_of(&res)));
    }
    assert!(distinct.len() > 1, "all seeds produced identical layouts");
}

#[test]
fn default_seed_is_deterministic() {
    let mut req = five_room_request();
    req.seed = None;
    let a = solve(&req).expect("first solve");
    let b = solve(&req).expect("second solve");
    assert_eq!(geometry_of(&a), geometry_of(&b));
}

#[test]
fn placer_only_path_answers() {
    let mut req = five_room_request();
    req.refine = false;
    let res = solve(&req).expect("placer-only solve should succeed");
    assert_eq!(res.rooms.len(), 5);
    assert!((0.0..=100.0).contains(&res.score));
    contained_or_warned(&res, &rect_polygon(10.0, 12.0));
}

#[test]
fn vastu_school_scales_are_accepted() {
    for school in ["classical", "modern", "flexible", "???"] {
        let mut req = five_room_request();
        req.vastu_school = school.to_string();
        let res = solve(&req).expect("solve should succeed");
        assert!((0.0..=100.0).contains(&res.score), "school {school}");
    }
}

#[test]
fn optimization_levels_all_answer() {
    for level in [1u8, 2, 3] {
        let mut req = five_room_request();
        req.optimization_level = level;
        req.rooms.truncate(3); // keep level 3 quick
        let res = solve(&req).expect("solve should succeed");
        assert_eq!(res.rooms.len(), 3);
    }
}

#[test]
fn response_serializes_to_json() {
    let res = solve(&five_room_request()).expect("solve should succeed");
    let text = serde_json::to_string(&res).expect("response should serialize");
    let back: SolveResponse = serde_json::from_str(&text).expect("response should round-trip");
    assert_eq!(back.rooms.len(), res.rooms.len());
    assert_eq!(back.score, res.score);
}

#[test]
fn house_facing_steers_the_entrance() {
    let mut req = base_request(
        vec![room("entry", "entrance"), room("living", "living")],
        12.0,
        12.0,
    );
    req.constraints = Some(vastuplan_core::request::Constraints {
        house_facing: Some("west".to_string()),
        ..Default::default()
    });
    let res = solve(&req).expect("solve should succeed");
    let entry = centroid(&res.rooms[0]);
    // Pulled toward the west anchor rather than the default NE.
    assert!(entry.x < 6.0, "entrance not west: {entry:?}");
}
