//! Connected-component grouping
//!
//! Both flood fills use an explicit work stack so large levels cannot blow
//! the call stack.

use ahash::AHashSet;
use glam::IVec2;

use super::entity::{EntityId, Footprint};
use crate::side_neighbors;

/// The side-connected group of `cells` containing `origin`, in `cells` order.
///
/// Empty when `origin` is not one of the cells.
pub fn group_containing(cells: &[IVec2], origin: IVec2) -> Vec<IVec2> {
    let all: AHashSet<IVec2> = cells.iter().copied().collect();
    if !all.contains(&origin) {
        return Vec::new();
    }

    let mut seen = AHashSet::with_capacity(all.len());
    seen.insert(origin);
    let mut stack = vec![origin];
    while let Some(current) = stack.pop() {
        for neighbor in side_neighbors(current) {
            if all.contains(&neighbor) && seen.insert(neighbor) {
                stack.push(neighbor);
            }
        }
    }

    cells.iter().copied().filter(|cell| seen.contains(cell)).collect()
}

/// Group conductive entities that share charge.
///
/// Entity A reaches entity B when one of A's electricity cells is one of B's
/// collision cells. Groups are the transitive closure of that relation,
/// explored from the last conductive entity backwards.
pub fn connected_conductive_groups<E: Footprint>(entities: &[E]) -> Vec<Vec<EntityId>> {
    let mut remaining: Vec<EntityId> = entities
        .iter()
        .enumerate()
        .filter(|(_, entity)| entity.conductive())
        .map(|(id, _)| id)
        .collect();

    let collisions: Vec<AHashSet<IVec2>> = entities
        .iter()
        .map(|entity| entity.collision_coords().into_iter().collect())
        .collect();

    let mut groups = Vec::new();
    while let Some(seed) = remaining.pop() {
        let mut group = Vec::new();
        let mut stack = vec![seed];

        while let Some(current) = stack.pop() {
            let reach: AHashSet<IVec2> = entities[current].electricity_coords().into_iter().collect();

            let (connected, rest): (Vec<EntityId>, Vec<EntityId>) = remaining
                .into_iter()
                .partition(|&other| !reach.is_disjoint(&collisions[other]));
            remaining = rest;
            stack.extend(connected);

            group.push(current);
        }
        groups.push(group);
    }

    groups
}
