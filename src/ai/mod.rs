//! Autoplay pathfinding
//!
//! Two tiers: a coarse best-first search over reach hops picks waypoints,
//! then a frame-driven backtracking search finds the exact moves between
//! them. Both only read the interaction index; the engine applies every move.

pub mod autoplay;
pub mod coarse;
pub mod local;
pub mod reach;

pub use autoplay::{Autoplay, AutoplayStatus, play_solution, solve_level};
pub use coarse::ReachabilityPlanner;
pub use local::LocalMovePlanner;
pub use reach::{connected_reach, reach, remove_invalid_neighbors};
