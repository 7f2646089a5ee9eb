//! Where a snake of a given length can get its head in one hop

use glam::IVec2;

use crate::in_bounds;
use crate::sim::{Interaction, InteractionIndex, group_containing};

/// Every cell the head could plausibly reach from `current`.
///
/// Cells closer than `length` (taxicab) are always reachable; cells exactly
/// `length` away only when they have ground below, otherwise the snake would
/// fall off before getting there. An airborne head reaches nothing.
pub fn reach(current: IVec2, index: &InteractionIndex, length: i32) -> Vec<IVec2> {
    if !has_ground(index, current) {
        return Vec::new();
    }

    let mut cells = Vec::new();
    for dx in -length..=length {
        for dy in -length..=length {
            // Straight up or down the snake cannot get this far
            if dx == 0 && (dy == -length || dy == length - 1 || dy == length) {
                continue;
            }

            let target = current + IVec2::new(dx, dy);
            let distance = dx.abs() + dy.abs();
            if distance < length || (distance == length && has_ground(index, target)) {
                cells.push(target);
            }
        }
    }
    cells
}

/// Drop cells outside the level and cells inside walls (food is walkable)
pub fn remove_invalid_neighbors(
    cells: &[IVec2],
    index: &InteractionIndex,
    width: i32,
    height: i32,
) -> Vec<IVec2> {
    cells
        .iter()
        .copied()
        .filter(|&cell| in_bounds(cell, width, height) && index.get_interactions(cell).is_passable())
        .collect()
}

/// Valid reach that is actually connected to `current` by side-adjacent cells
pub fn connected_reach(
    current: IVec2,
    index: &InteractionIndex,
    length: i32,
    width: i32,
    height: i32,
) -> Vec<IVec2> {
    let cells = reach(current, index, length);
    let valid = remove_invalid_neighbors(&cells, index, width, height);
    group_containing(&valid, current)
}

pub(crate) fn has_ground(index: &InteractionIndex, pos: IVec2) -> bool {
    index
        .get_interactions(pos + IVec2::Y)
        .contains(Interaction::Wall)
}
