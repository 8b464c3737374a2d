//! Floor-plan layout engine for Vastuplan.
//!
//! Given a polygonal plot and a list of rooms with soft dimensional targets,
//! the engine assigns each room an axis-aligned rectangle inside the plot:
//! a force-directed placer produces an initial layout from the adjacency
//! graph and the Vastu potential field, then a simulated-annealing refiner
//! polishes it against a multi-term energy. The whole pipeline is a pure
//! function of `(request, seed)` — one seeded RNG stream, no globals.
//!
//! Entry point: [`solver::solve`].

pub mod field;
pub mod layout;
pub mod observer;
pub mod placer;
pub mod plot;
pub mod refiner;
pub mod request;
pub mod score;
pub mod solver;
