//! Compass directions for Vastu placement.
//!
//! Plot coordinates follow the drawing convention used throughout the solver:
//! the origin is the north-west corner and **+y runs south**, so south-east is
//! larger x and larger y. All anchor fractions, unit vectors, and zone labels
//! in this module assume that frame.

use crate::geometry::Point;

/// The eight compass octants plus the plot center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Center,
}

impl Direction {
    pub const ALL: [Direction; 9] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
        Direction::Center,
    ];

    /// Canonical anchor position as a fraction of the plot bounding box,
    /// on the {0.25, 0.5, 0.75}² grid.
    pub fn anchor_fraction(self) -> (f64, f64) {
        match self {
            Direction::North => (0.5, 0.25),
            Direction::NorthEast => (0.75, 0.25),
            Direction::East => (0.75, 0.5),
            Direction::SouthEast => (0.75, 0.75),
            Direction::South => (0.5, 0.75),
            Direction::SouthWest => (0.25, 0.75),
            Direction::West => (0.25, 0.5),
            Direction::NorthWest => (0.25, 0.25),
            Direction::Center => (0.5, 0.5),
        }
    }

    /// Unit vector pointing toward this direction from the plot center.
    /// `Center` maps to the zero vector.
    pub fn unit_vector(self) -> (f64, f64) {
        let d = std::f64::consts::FRAC_1_SQRT_2;
        match self {
            Direction::North => (0.0, -1.0),
            Direction::NorthEast => (d, -d),
            Direction::East => (1.0, 0.0),
            Direction::SouthEast => (d, d),
            Direction::South => (0.0, 1.0),
            Direction::SouthWest => (-d, d),
            Direction::West => (-1.0, 0.0),
            Direction::NorthWest => (-d, -d),
            Direction::Center => (0.0, 0.0),
        }
    }

    /// Parse a direction tag. Accepts full lowercase words ("southeast") and
    /// compass abbreviations ("SE", case-insensitive).
    pub fn from_tag(tag: &str) -> Option<Direction> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "northeast" | "north-east" | "ne" => Some(Direction::NorthEast),
            "east" | "e" => Some(Direction::East),
            "southeast" | "south-east" | "se" => Some(Direction::SouthEast),
            "south" | "s" => Some(Direction::South),
            "southwest" | "south-west" | "sw" => Some(Direction::SouthWest),
            "west" | "w" => Some(Direction::West),
            "northwest" | "north-west" | "nw" => Some(Direction::NorthWest),
            "center" | "centre" | "c" => Some(Direction::Center),
            _ => None,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::NorthEast => "northeast",
            Direction::East => "east",
            Direction::SouthEast => "southeast",
            Direction::South => "south",
            Direction::SouthWest => "southwest",
            Direction::West => "west",
            Direction::NorthWest => "northwest",
            Direction::Center => "center",
        }
    }

    /// Compass zone of a point within a `w × l` bounding box, on a thirds
    /// grid: the middle third in both axes is `Center`.
    pub fn label(p: Point, w: f64, l: f64) -> Direction {
        let col = third(p.x, w);
        let row = third(p.y, l);
        match (col, row) {
            (0, 0) => Direction::NorthWest,
            (1, 0) => Direction::North,
            (2, 0) => Direction::NorthEast,
            (0, 1) => Direction::West,
            (1, 1) => Direction::Center,
            (2, 1) => Direction::East,
            (0, 2) => Direction::SouthWest,
            (1, 2) => Direction::South,
            _ => Direction::SouthEast,
        }
    }
}

fn third(v: f64, extent: f64) -> u8 {
    if extent <= 0.0 {
        return 1;
    }
    let f = v / extent;
    if f < 1.0 / 3.0 {
        0
    } else if f < 2.0 / 3.0 {
        1
    } else {
        2
    }
}
