//! Room-type tables: Vastu preferences, dimensional envelopes, adjacency.
//!
//! The type tag is a sealed enum; unknown request strings funnel to
//! `RoomType::Untyped`, which solves with a flat potential and neutral sizes
//! instead of failing. Outdoor types carry a separate, gentler preference
//! table — they are placed in a second phase around the frozen indoor rooms.

use crate::direction::Direction;
use serde::{Deserialize, Serialize};

/// Canonical room types plus the `Untyped` sentinel for unknown tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoomType {
    // Indoor
    Entrance,
    Kitchen,
    MasterBedroom,
    Bedroom,
    Bathroom,
    Toilet,
    Pooja,
    Living,
    Hall,
    Dining,
    Study,
    Store,
    Balcony,
    // Outdoor
    Garden,
    Lawn,
    Parking,
    SwimmingPool,
    Driveway,
    Deck,
    Patio,
    Terrace,
    Trees,
    BoreWell,
    WaterTank,
    // Sentinel
    Untyped,
}

impl RoomType {
    /// Fold a free-form request tag into a sealed type. Aliases and common
    /// spellings collapse onto the canonical tag; anything else is `Untyped`.
    pub fn from_tag(tag: &str) -> RoomType {
        let norm: String = tag
            .trim()
            .to_ascii_lowercase()
            .replace([' ', '-'], "_");
        match norm.as_str() {
            "entrance" | "entry" | "foyer" => RoomType::Entrance,
            "kitchen" => RoomType::Kitchen,
            "master_bedroom" | "master" => RoomType::MasterBedroom,
            "bedroom" | "bed" | "guest_bedroom" | "kids_bedroom" => RoomType::Bedroom,
            "bathroom" | "bath" => RoomType::Bathroom,
            "toilet" | "wc" | "powder_room" => RoomType::Toilet,
            "pooja" | "pooja_room" | "puja" | "prayer_room" => RoomType::Pooja,
            "living" | "living_room" => RoomType::Living,
            "hall" => RoomType::Hall,
            "dining" | "dining_room" => RoomType::Dining,
            "study" | "office" | "home_office" => RoomType::Study,
            "store" | "storage" | "store_room" | "utility" => RoomType::Store,
            "balcony" => RoomType::Balcony,
            "garden" => RoomType::Garden,
            "lawn" => RoomType::Lawn,
            "parking" | "carport" | "garage" => RoomType::Parking,
            "swimming_pool" | "pool" => RoomType::SwimmingPool,
            "driveway" => RoomType::Driveway,
            "deck" => RoomType::Deck,
            "patio" => RoomType::Patio,
            "terrace" => RoomType::Terrace,
            "trees" | "tree" | "orchard" => RoomType::Trees,
            "bore_well" | "borewell" | "well" => RoomType::BoreWell,
            "water_tank" | "tank" | "sump" => RoomType::WaterTank,
            _ => RoomType::Untyped,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            RoomType::Entrance => "entrance",
            RoomType::Kitchen => "kitchen",
            RoomType::MasterBedroom => "master_bedroom",
            RoomType::Bedroom => "bedroom",
            RoomType::Bathroom => "bathroom",
            RoomType::Toilet => "toilet",
            RoomType::Pooja => "pooja",
            RoomType::Living => "living",
            RoomType::Hall => "hall",
            RoomType::Dining => "dining",
            RoomType::Study => "study",
            RoomType::Store => "store",
            RoomType::Balcony => "balcony",
            RoomType::Garden => "garden",
            RoomType::Lawn => "lawn",
            RoomType::Parking => "parking",
            RoomType::SwimmingPool => "swimming_pool",
            RoomType::Driveway => "driveway",
            RoomType::Deck => "deck",
            RoomType::Patio => "patio",
            RoomType::Terrace => "terrace",
            RoomType::Trees => "trees",
            RoomType::BoreWell => "bore_well",
            RoomType::WaterTank => "water_tank",
            RoomType::Untyped => "untyped",
        }
    }

    /// Outdoor types are placed in the second solve phase.
    pub fn is_outdoor(self) -> bool {
        matches!(
            self,
            RoomType::Garden
                | RoomType::Lawn
                | RoomType::Parking
                | RoomType::SwimmingPool
                | RoomType::Driveway
                | RoomType::Deck
                | RoomType::Patio
                | RoomType::Terrace
                | RoomType::Trees
                | RoomType::BoreWell
                | RoomType::WaterTank
        )
    }
}

// ── Vastu preference table ──────────────────────────────────────────────

/// Directional preference entry for one room type.
#[derive(Debug, Clone, Copy)]
pub struct VastuPreference {
    pub preferred: &'static [Direction],
    pub acceptable: &'static [Direction],
    pub avoid: &'static [Direction],
    /// Rule strictness in [0, 1]; scales the potential field and forces.
    pub weight: f64,
    /// Placement order; lower is placed first.
    pub priority: u8,
}

use Direction::*;

/// Vastu preference for a room type. Indoor types follow the classical
/// placement rules; outdoor types use the gentler garden-plan table.
pub fn vastu_preference(t: RoomType) -> VastuPreference {
    match t {
        RoomType::Entrance => pref(&[NorthEast, North, East], &[West], &[South, SouthWest], 0.9, 0),
        RoomType::Pooja => pref(&[NorthEast], &[East, North], &[South, SouthWest], 1.0, 1),
        RoomType::Kitchen => pref(&[SouthEast], &[NorthWest], &[NorthEast, SouthWest], 0.9, 1),
        RoomType::MasterBedroom => pref(&[SouthWest], &[South, West], &[NorthEast], 0.8, 1),
        RoomType::Bedroom => pref(&[West, South], &[NorthWest, SouthWest], &[NorthEast], 0.6, 2),
        RoomType::Living => pref(&[NorthEast, North], &[East, Center], &[SouthWest], 0.7, 2),
        RoomType::Hall => pref(&[North, East], &[Center], &[], 0.6, 2),
        RoomType::Dining => pref(&[West, East], &[Center, South], &[], 0.5, 3),
        RoomType::Bathroom => pref(&[NorthWest], &[West], &[NorthEast, Center], 0.7, 4),
        RoomType::Toilet => pref(&[NorthWest, West], &[South], &[NorthEast, Center], 0.7, 4),
        RoomType::Study => pref(&[West, NorthEast], &[North, East], &[], 0.5, 5),
        RoomType::Store => pref(&[SouthWest, NorthWest], &[South], &[NorthEast], 0.4, 5),
        RoomType::Balcony => pref(&[North, East], &[NorthEast], &[SouthWest], 0.3, 5),
        // Outdoor table — low weights, late priority.
        RoomType::Garden => pref(&[NorthEast, North, East], &[Center], &[], 0.4, 6),
        RoomType::Lawn => pref(&[North, East], &[NorthEast], &[], 0.3, 6),
        RoomType::Parking => pref(&[SouthEast, NorthWest], &[South], &[NorthEast], 0.4, 6),
        RoomType::SwimmingPool => pref(&[NorthEast, North], &[East], &[SouthEast, SouthWest], 0.4, 6),
        RoomType::BoreWell => pref(&[NorthEast, North], &[East], &[SouthEast, SouthWest], 0.4, 6),
        RoomType::WaterTank => pref(&[SouthWest, West], &[South], &[NorthEast], 0.3, 6),
        RoomType::Driveway => pref(&[East, North], &[SouthEast], &[], 0.3, 7),
        RoomType::Deck => pref(&[North, East], &[NorthEast], &[], 0.2, 7),
        RoomType::Patio => pref(&[East, NorthEast], &[North], &[], 0.2, 7),
        RoomType::Terrace => pref(&[North, East], &[NorthEast], &[], 0.2, 7),
        RoomType::Trees => pref(&[South, West, SouthWest], &[NorthWest], &[NorthEast], 0.3, 7),
        RoomType::Untyped => pref(&[], &[], &[], 0.5, 7),
    }
}

fn pref(
    preferred: &'static [Direction],
    acceptable: &'static [Direction],
    avoid: &'static [Direction],
    weight: f64,
    priority: u8,
) -> VastuPreference {
    VastuPreference {
        preferred,
        acceptable,
        avoid,
        weight,
        priority,
    }
}

// ── Size table ──────────────────────────────────────────────────────────

/// Dimensional envelope for one room type. Lengths in meters, areas in m².
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoomSize {
    pub min_w: f64,
    pub max_w: f64,
    pub preferred_w: f64,
    pub min_h: f64,
    pub max_h: f64,
    pub preferred_h: f64,
    pub min_area: f64,
    pub max_area: f64,
    pub ideal_aspect: f64,
    pub aspect_tol: f64,
}

/// Dimensional envelope for a room type.
pub fn size_spec(t: RoomType) -> RoomSize {
    match t {
        RoomType::Entrance => size(1.5, 3.0, 2.0, 1.0, 2.5, 1.6, 2.0, 7.0, 1.3, 0.4),
        RoomType::Kitchen => size(2.4, 4.5, 3.0, 2.4, 4.5, 3.5, 7.0, 16.0, 1.2, 0.3),
        RoomType::MasterBedroom => size(3.0, 5.2, 4.0, 3.0, 5.2, 4.2, 12.0, 22.0, 1.1, 0.3),
        RoomType::Bedroom => size(2.7, 4.5, 3.5, 2.7, 4.5, 3.6, 9.0, 18.0, 1.1, 0.3),
        RoomType::Bathroom => size(1.5, 3.0, 2.2, 1.2, 2.7, 2.0, 3.0, 8.0, 1.2, 0.5),
        RoomType::Toilet => size(1.0, 2.0, 1.2, 1.2, 2.2, 1.8, 1.5, 4.0, 1.4, 0.5),
        RoomType::Pooja => size(1.2, 3.0, 1.8, 1.2, 3.0, 1.8, 2.0, 7.0, 1.0, 0.3),
        RoomType::Living => size(3.5, 6.5, 5.0, 3.0, 5.5, 4.2, 14.0, 30.0, 1.25, 0.4),
        RoomType::Hall => size(3.0, 6.0, 4.5, 2.7, 5.0, 3.8, 11.0, 26.0, 1.2, 0.4),
        RoomType::Dining => size(2.7, 4.5, 3.6, 2.4, 4.2, 3.2, 8.0, 18.0, 1.15, 0.35),
        RoomType::Study => size(2.4, 4.0, 3.0, 2.2, 3.6, 2.8, 6.0, 13.0, 1.1, 0.35),
        RoomType::Store => size(1.5, 3.0, 2.0, 1.5, 3.0, 2.2, 3.0, 8.0, 1.1, 0.5),
        RoomType::Balcony => size(2.0, 5.0, 3.2, 1.0, 2.2, 1.5, 3.0, 9.0, 2.0, 0.6),
        RoomType::Garden => size(3.0, 8.0, 5.0, 2.5, 7.0, 4.2, 10.0, 40.0, 1.2, 0.6),
        RoomType::Lawn => size(3.0, 8.0, 4.5, 2.5, 7.0, 4.0, 10.0, 36.0, 1.2, 0.6),
        RoomType::Parking => size(2.7, 6.0, 3.0, 4.5, 6.5, 5.5, 12.0, 30.0, 1.8, 0.5),
        RoomType::SwimmingPool => size(3.0, 8.0, 4.5, 2.0, 6.0, 3.0, 12.0, 40.0, 1.6, 0.5),
        RoomType::Driveway => size(2.7, 4.0, 3.0, 4.0, 10.0, 6.0, 12.0, 36.0, 2.0, 0.8),
        RoomType::Deck => size(2.5, 5.0, 3.5, 2.0, 4.5, 2.8, 6.0, 20.0, 1.3, 0.5),
        RoomType::Patio => size(2.5, 5.0, 3.5, 2.0, 4.5, 2.8, 6.0, 20.0, 1.3, 0.5),
        RoomType::Terrace => size(2.5, 5.5, 3.8, 2.0, 4.5, 3.0, 6.0, 22.0, 1.3, 0.5),
        RoomType::Trees => size(1.5, 4.0, 2.5, 1.5, 4.0, 2.5, 3.0, 12.0, 1.0, 0.5),
        RoomType::BoreWell => size(1.0, 2.0, 1.2, 1.0, 2.0, 1.2, 1.0, 3.0, 1.0, 0.3),
        RoomType::WaterTank => size(1.0, 2.5, 1.5, 1.0, 2.5, 1.5, 1.0, 5.0, 1.0, 0.3),
        RoomType::Untyped => size(2.0, 5.0, 3.0, 2.0, 5.0, 3.0, 4.0, 20.0, 1.0, 0.5),
    }
}

#[allow(clippy::too_many_arguments)]
fn size(
    min_w: f64,
    max_w: f64,
    preferred_w: f64,
    min_h: f64,
    max_h: f64,
    preferred_h: f64,
    min_area: f64,
    max_area: f64,
    ideal_aspect: f64,
    aspect_tol: f64,
) -> RoomSize {
    RoomSize {
        min_w,
        max_w,
        preferred_w,
        min_h,
        max_h,
        preferred_h,
        min_area,
        max_area,
        ideal_aspect,
        aspect_tol,
    }
}

// ── Adjacency table ─────────────────────────────────────────────────────

/// Functional "should be near" pairs. Weight 2.0 marks critical adjacencies.
pub fn adjacency_pairs() -> &'static [(RoomType, RoomType, f64)] {
    &[
        (RoomType::Kitchen, RoomType::Dining, 2.0),
        (RoomType::Entrance, RoomType::Living, 2.0),
        (RoomType::Kitchen, RoomType::Living, 1.0),
        (RoomType::Living, RoomType::Dining, 1.0),
        (RoomType::MasterBedroom, RoomType::Bathroom, 1.0),
        (RoomType::Bedroom, RoomType::Bathroom, 1.0),
        (RoomType::Pooja, RoomType::Living, 1.0),
        (RoomType::Hall, RoomType::Living, 1.0),
        (RoomType::Hall, RoomType::Entrance, 1.0),
        (RoomType::Parking, RoomType::Driveway, 2.0),
        (RoomType::Parking, RoomType::Entrance, 1.0),
        (RoomType::Garden, RoomType::Living, 1.0),
        (RoomType::Lawn, RoomType::Garden, 1.0),
        (RoomType::Terrace, RoomType::Living, 1.0),
        (RoomType::Deck, RoomType::Living, 1.0),
        (RoomType::Patio, RoomType::Dining, 1.0),
        (RoomType::SwimmingPool, RoomType::Deck, 1.0),
    ]
}

/// Adjacency weight between two types, if the pair is in the table.
pub fn adjacency_weight(a: RoomType, b: RoomType) -> Option<f64> {
    adjacency_pairs()
        .iter()
        .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, _, w)| *w)
}
