//! Headless solve harness.
//!
//! Runs the standard demo cases (rectangular, L-shaped, triangular, outdoor
//! two-phase) through the full pipeline and prints one JSON summary per case
//! to stdout. No files, no network — this exists to eyeball solver behavior
//! and catch regressions from the command line:
//!
//! ```text
//! cargo run -p vastuplan-simtest
//! ```

use vastuplan_core::request::{RoomSpec, SolveRequest};
use vastuplan_core::solver::solve;

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

fn base(rooms: Vec<RoomSpec>, w: f64, l: f64) -> SolveRequest {
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

fn demo_cases() -> Vec<(&'static str, SolveRequest)> {
    let rectangular = base(
        vec![
            room("living", "living"),
            room("kitchen", "kitchen"),
            room("bed1", "master_bedroom"),
            room("bath", "bathroom"),
        ],
        10.0,
        8.0,
    );

    let mut lshaped = base(
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
    lshaped.plot_shape = "l-shaped".to_string();
    lshaped.plot_polygon = Some(vec![
        [0.0, 0.0],
        [12.0, 0.0],
        [12.0, 5.0],
        [5.0, 5.0],
        [5.0, 10.0],
        [0.0, 10.0],
    ]);

    let mut triangular = base(
        vec![
            room("living", "living"),
            room("kitchen", "kitchen"),
            room("bed1", "bedroom"),
        ],
        10.0,
        8.0,
    );
    triangular.plot_shape = "triangular".to_string();
    triangular.plot_polygon = Some(vec![[0.0, 0.0], [10.0, 0.0], [0.0, 8.0]]);

    let outdoor = base(
        vec![
            room("living", "living"),
            room("kitchen", "kitchen"),
            room("master", "master_bedroom"),
            room("garden", "garden"),
            room("parking", "parking"),
        ],
        15.0,
        15.0,
    );

    vec![
        ("rectangular_4room", rectangular),
        ("lshaped_6room", lshaped),
        ("triangular_3room", triangular),
        ("outdoor_two_phase", outdoor),
    ]
}

fn main() {
    env_logger::init();

    let mut failures = 0;
    for (name, request) in demo_cases() {
        match solve(&request) {
            Ok(response) => {
                let summary = serde_json::json!({
                    "case": name,
                    "score": response.score,
                    "iterations": response.iterations,
                    "converged": response.converged,
                    "warnings": response.warnings,
                    "rooms": response.rooms,
                });
                match serde_json::to_string_pretty(&summary) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        log::error!("{name}: failed to serialize summary: {e}");
                        failures += 1;
                    }
                }
            }
            Err(e) => {
                log::error!("{name}: solve failed: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}
