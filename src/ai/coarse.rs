//! Coarse path planning over reach hops
//!
//! Finds waypoints from the snake head to a target where each hop stays
//! within what a snake of the current length can reach. Only runs a couple of
//! times per level (once per target, again after eating), so the costs are
//! kept simple.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use glam::IVec2;

use super::reach::connected_reach;
use crate::distance_squared;
use crate::sim::{Interaction, InteractionIndex};

/// Node in the open set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathNode {
    coord: IVec2,
    f_cost: i64,
    /// Insertion order, breaks ties first-in first-out
    seq: u64,
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first search over reach hops
#[derive(Debug, Clone)]
pub struct ReachabilityPlanner {
    width: i32,
    height: i32,
    snake_length: i32,
}

impl ReachabilityPlanner {
    pub fn new(width: i32, height: i32, snake_length: usize) -> Self {
        Self {
            width,
            height,
            snake_length: snake_length as i32,
        }
    }

    /// Call whenever the snake eats; reach depends on length
    pub fn update_length(&mut self, snake_length: usize) {
        self.snake_length = snake_length as i32;
    }

    pub fn snake_length(&self) -> usize {
        self.snake_length as usize
    }

    /// Cells one hop away from `current`
    pub fn neighbors(&self, current: IVec2, index: &InteractionIndex) -> Vec<IVec2> {
        connected_reach(current, index, self.snake_length, self.width, self.height)
    }

    /// Waypoints from `start` (exclusive) to `goal` (inclusive).
    ///
    /// Returns `None` when the goal cannot be reached hop by hop, and an
    /// empty list when already standing on it.
    pub fn find_path(
        &self,
        start: IVec2,
        goal: IVec2,
        index: &InteractionIndex,
    ) -> Option<Vec<IVec2>> {
        if start == goal {
            return Some(Vec::new());
        }

        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<IVec2, IVec2> = HashMap::new();
        let mut g_scores: HashMap<IVec2, i64> = HashMap::new();
        let mut closed: HashSet<IVec2> = HashSet::new();
        let mut seq = 0u64;

        g_scores.insert(start, 0);
        open_set.push(PathNode {
            coord: start,
            f_cost: heuristic(start, goal),
            seq,
        });

        while let Some(current) = open_set.pop() {
            if current.coord == goal {
                let path = reconstruct_path(&came_from, current.coord);
                log::debug!(
                    "Coarse path {start} -> {goal}: {} waypoints, {} nodes closed",
                    path.len(),
                    closed.len()
                );
                return Some(path);
            }
            if !closed.insert(current.coord) {
                continue;
            }

            let current_g = g_scores.get(&current.coord).copied().unwrap_or(i64::MAX);

            for neighbor in self.neighbors(current.coord, index) {
                if neighbor == current.coord || closed.contains(&neighbor) {
                    continue;
                }
                // Stepping on a finish ends the level, so only the goal may be one
                if neighbor != goal
                    && index
                        .get_interactions(neighbor)
                        .contains(Interaction::Finish)
                {
                    continue;
                }

                let tentative_g = current_g + distance_squared(current.coord, neighbor) as i64;
                let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(i64::MAX);

                if tentative_g < neighbor_g {
                    came_from.insert(neighbor, current.coord);
                    g_scores.insert(neighbor, tentative_g);

                    seq += 1;
                    open_set.push(PathNode {
                        coord: neighbor,
                        f_cost: tentative_g + heuristic(neighbor, goal),
                        seq,
                    });
                }
            }
        }

        log::debug!("No coarse path {start} -> {goal}");
        None
    }
}

/// Squared euclidean distance; not admissible, but cheap and points the right way
fn heuristic(from: IVec2, goal: IVec2) -> i64 {
    distance_squared(from, goal) as i64
}

/// Walk `came_from` back to the start, which is left out
fn reconstruct_path(came_from: &HashMap<IVec2, IVec2>, mut current: IVec2) -> Vec<IVec2> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.pop();
    path.reverse();
    path
}
