//! Request and response types for the solve operation.
//!
//! These are the only types that cross the crate boundary: the caller owns
//! the request and the response; everything in between is solve-scoped.
//! Dimensions are meters, polygons are counter-clockwise vertex lists.

use serde::{Deserialize, Serialize};

/// One requested room. `type` is a free string folded into the sealed
/// room-type table; unknown tags solve as untyped rooms with a flat field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub room_type: String,
    /// Optional target width in meters; overrides the type's preferred width.
    #[serde(default)]
    pub width: Option<f64>,
    /// Optional target height in meters; overrides the type's preferred height.
    #[serde(default)]
    pub height: Option<f64>,
    /// Optional preferred compass direction ("southeast" or "SE").
    #[serde(default)]
    pub direction: Option<String>,
}

/// Circle constraint for circular plots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CircleSpec {
    pub center: [f64; 2],
    pub radius: f64,
}

/// Recognized constraint keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraints {
    /// Overrides the entrance room's preferred direction.
    #[serde(default)]
    pub house_facing: Option<String>,
    #[serde(default)]
    pub circle: Option<CircleSpec>,
    /// Fallback location for the plot polygon.
    #[serde(default)]
    pub plot_polygon: Option<Vec<[f64; 2]>>,
    /// Minimum circulation gap between rooms in meters (default 0.8).
    #[serde(default)]
    pub min_circulation: Option<f64>,
}

/// A complete solve request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveRequest {
    pub rooms: Vec<RoomSpec>,
    pub plot_width: f64,
    pub plot_length: f64,
    #[serde(default = "default_plot_shape")]
    pub plot_shape: String,
    #[serde(default)]
    pub plot_polygon: Option<Vec<[f64; 2]>>,
    /// Free-form orientation metadata (e.g. hypotenuse direction).
    #[serde(default)]
    pub orientation: Option<String>,
    /// Room ids or type tags to treat as outdoor (triggers the two-phase solve).
    #[serde(default)]
    pub outdoor_fixtures: Option<Vec<String>>,
    #[serde(default)]
    pub constraints: Option<Constraints>,
    /// 1 = fast, 2 = default, 3 = thorough; scales the refiner budget.
    #[serde(default = "default_optimization_level")]
    pub optimization_level: u8,
    /// classical | modern | flexible; scales the Vastu energy weight.
    #[serde(default = "default_vastu_school")]
    pub vastu_school: String,
    /// When false, return the placer's layout without annealing.
    #[serde(default = "default_refine")]
    pub refine: bool,
    /// RNG seed; a fixed default is used when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_plot_shape() -> String {
    "rectangular".to_string()
}

fn default_optimization_level() -> u8 {
    2
}

fn default_vastu_school() -> String {
    "classical".to_string()
}

fn default_refine() -> bool {
    true
}

/// One placed room in the response. `(x, y)` is the bottom-left corner of
/// the axis-aligned rectangle; `direction` is the compass zone of the
/// room's centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedRoom {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub direction: String,
}

/// Per-term score breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub overlap_area: f64,
    pub vastu_score: f64,
    pub aspect_ratio_score: f64,
    pub boundary_score: f64,
    pub circulation_score: f64,
    pub adjacency_score: f64,
    pub total_score: f64,
}

/// A complete solve response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResponse {
    pub rooms: Vec<PlacedRoom>,
    /// Layout quality in [0, 100].
    pub score: f64,
    /// Total steps across placer and refiner.
    pub iterations: u32,
    pub converged: bool,
    pub warnings: Vec<String>,
    #[serde(default)]
    pub metrics: Option<ScoreMetrics>,
}

/// Solve failure reasons. Degenerate-but-solvable layouts are *not* errors:
/// they come back as a successful response with warnings.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The request cannot be solved as stated; the solve does not start.
    InvalidRequest(String),
    /// Unreachable-by-contract condition (NaN energy, empty partition).
    /// Callers should log and retry with a different seed.
    Internal(String),
}

impl std::fmt::Display for SolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            SolveError::Internal(msg) => write!(f, "internal solver error: {msg}"),
        }
    }
}

impl std::error::Error for SolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_with_defaults() {
        let json = r#"{
            "rooms": [{"id": "r1", "type": "kitchen"}],
            "plot_width": 10.0,
            "plot_length": 12.0
        }"#;
        let req: SolveRequest = serde_json::from_str(json).expect("request should parse");
        assert_eq!(req.plot_shape, "rectangular");
        assert_eq!(req.optimization_level, 2);
        assert_eq!(req.vastu_school, "classical");
        assert!(req.refine);
        assert!(req.seed.is_none());
        assert_eq!(req.rooms[0].room_type, "kitchen");
    }

    #[test]
    fn test_constraints_parse() {
        let json = r#"{
            "rooms": [{"id": "r1", "type": "living"}],
            "plot_width": 12.0,
            "plot_length": 12.0,
            "plot_shape": "circular",
            "constraints": {
                "house_facing": "east",
                "circle": {"center": [6.0, 6.0], "radius": 6.0},
                "min_circulation": 1.0
            }
        }"#;
        let req: SolveRequest = serde_json::from_str(json).expect("request should parse");
        let c = req.constraints.expect("constraints present");
        assert_eq!(c.house_facing.as_deref(), Some("east"));
        assert_eq!(c.circle.map(|c| c.radius), Some(6.0));
        assert_eq!(c.min_circulation, Some(1.0));
    }

    #[test]
    fn test_error_display() {
        let e = SolveError::InvalidRequest("empty rooms".into());
        assert!(e.to_string().contains("empty rooms"));
    }
}
