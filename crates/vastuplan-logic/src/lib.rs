//! Pure layout logic for Vastuplan.
//!
//! This crate contains the deterministic, allocation-light building blocks of
//! the floor-plan solver: polygon and rectangle geometry, the compass
//! direction tables, per-room-type Vastu preference and size tables, and the
//! grid-based spatial index. Everything here is a pure function of its
//! arguments — no RNG, no logging, no I/O — which keeps it unit-testable and
//! reusable from any host.

pub mod direction;
pub mod geometry;
pub mod rooms;
pub mod spatial;
