//! Hadik - a gravity snake puzzle game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, interaction index, engine)
//! - `ai`: Autoplay pathfinding (coarse reachability search + local backtracking)
//! - `level`: Level file loading
//! - `progress`: Persisted player progress and level unlocking

pub mod ai;
pub mod error;
pub mod level;
pub mod progress;
pub mod sim;

pub use error::{AutoplayError, ConfigError, LoadError, ProgressError};
pub use progress::PlayerData;

use glam::IVec2;

/// Game configuration constants
pub mod consts {
    /// Frames a single gravity step is held on screen
    pub const FALLING_FREEZE_FRAMES: u32 = 6;
    /// Frames between tail blocks disappearing after reaching the finish
    pub const FINISHING_FREEZE_FRAMES: u32 = 10;

    /// Finish footprint (always 4x3)
    pub const FINISH_WIDTH: i32 = 4;
    pub const FINISH_HEIGHT: i32 = 3;

    /// Number of levels shipped with the game
    pub const LEVEL_COUNT: u32 = 16;
}

/// Side-adjacent offsets in the order up, down, left, right
pub const SIDE_OFFSETS: [IVec2; 4] = [IVec2::NEG_Y, IVec2::Y, IVec2::NEG_X, IVec2::X];

/// Taxicab distance between two cells
#[inline]
pub fn taxicab(a: IVec2, b: IVec2) -> i32 {
    let d = (a - b).abs();
    d.x + d.y
}

/// Squared euclidean distance between two cells
#[inline]
pub fn distance_squared(a: IVec2, b: IVec2) -> i32 {
    (a - b).length_squared()
}

/// Whether a cell lies inside the playable area (border cells excluded)
#[inline]
pub fn in_bounds(pos: IVec2, width: i32, height: i32) -> bool {
    0 < pos.x && pos.x <= width && 0 < pos.y && pos.y <= height
}

/// The four side neighbours of a cell
#[inline]
pub fn side_neighbors(pos: IVec2) -> [IVec2; 4] {
    SIDE_OFFSETS.map(|offset| pos + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxicab() {
        assert_eq!(taxicab(IVec2::new(1, 1), IVec2::new(4, -1)), 5);
        assert_eq!(taxicab(IVec2::new(3, 3), IVec2::new(3, 3)), 0);
    }

    #[test]
    fn test_in_bounds_excludes_border() {
        assert!(in_bounds(IVec2::new(1, 1), 10, 10));
        assert!(in_bounds(IVec2::new(10, 10), 10, 10));
        assert!(!in_bounds(IVec2::new(0, 5), 10, 10));
        assert!(!in_bounds(IVec2::new(5, 11), 10, 10));
    }
}
