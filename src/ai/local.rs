//! Brute-force search for the exact moves to one waypoint
//!
//! Depth-first with backtracking, bounded by the snake length. The planner
//! never touches the engine: every call returns one action and the caller
//! applies it before asking again, so the search always continues from the
//! real engine state.

use glam::IVec2;

use super::reach::has_ground;
use crate::sim::{Action, Interaction, InteractionIndex};
use crate::{in_bounds, taxicab};

/// One step of the search
#[derive(Debug, Clone)]
struct SearchNode {
    coords: IVec2,
    depth: usize,
    /// Untried moves, best last
    moves: Vec<(IVec2, Action)>,
}

/// Bounds and target shared by every node of one search
#[derive(Debug, Clone, Copy)]
struct SearchBounds {
    destination: IVec2,
    width: i32,
    height: i32,
    max_depth: usize,
}

impl SearchNode {
    fn new(
        coords: IVec2,
        parent: Option<IVec2>,
        depth: usize,
        bounds: &SearchBounds,
        index: &InteractionIndex,
    ) -> Self {
        let mut moves = vec![
            (coords + IVec2::Y, Action::MoveDown),
            (coords + IVec2::NEG_X, Action::MoveLeft),
            (coords + IVec2::X, Action::MoveRight),
        ];
        // Deep enough that going up would leave the snake hanging
        if depth + 1 < bounds.max_depth {
            moves.push((coords + IVec2::NEG_Y, Action::MoveUp));
        }

        let last_step = depth + 1 >= bounds.max_depth;
        // Bounds are the whole level, not a band around the start row: the
        // depth limit already keeps the search from wandering far down
        moves.retain(|&(target, _)| {
            if Some(target) == parent || !in_bounds(target, bounds.width, bounds.height) {
                return false;
            }
            let interactions = index.get_interactions(target);
            if !interactions.is_passable() {
                return false;
            }
            if interactions.contains(Interaction::Finish) && target != bounds.destination {
                return false;
            }
            !last_step || has_ground(index, target)
        });

        // Greedy ordering; ties keep down, left, right, up
        moves.sort_by_key(|&(target, _)| taxicab(target, bounds.destination));
        moves.reverse();

        Self {
            coords,
            depth,
            moves,
        }
    }
}

/// Frame-driven bounded backtracking search
#[derive(Debug, Clone)]
pub struct LocalMovePlanner {
    start: IVec2,
    bounds: SearchBounds,
    stack: Vec<SearchNode>,
    is_finished: bool,
    /// Meaningful once finished: whether the destination was reached
    found: bool,
    backtracks: usize,
}

impl LocalMovePlanner {
    pub fn new(
        start: IVec2,
        destination: IVec2,
        index: &InteractionIndex,
        snake_length: usize,
        width: i32,
        height: i32,
    ) -> Self {
        let bounds = SearchBounds {
            destination,
            width,
            height,
            max_depth: snake_length,
        };
        let root = SearchNode::new(start, None, 0, &bounds, index);
        let reached = start == destination;
        Self {
            start,
            bounds,
            stack: vec![root],
            is_finished: reached,
            found: reached,
            backtracks: 0,
        }
    }

    pub fn start(&self) -> IVec2 {
        self.start
    }

    pub fn destination(&self) -> IVec2 {
        self.bounds.destination
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    pub fn found(&self) -> bool {
        self.found
    }

    /// Times the search had to step back
    pub fn backtracks(&self) -> usize {
        self.backtracks
    }

    /// Where the head should be if every returned action was applied
    pub fn expected_head(&self) -> Option<IVec2> {
        self.stack.last().map(|node| node.coords)
    }

    /// Next action for the engine.
    ///
    /// Returns a move while searching, `UndoMovement` to step back out of a
    /// dead end, and `DoNothing` once the search is over.
    pub fn get_next_move(&mut self, index: &InteractionIndex) -> Action {
        if self.is_finished {
            return Action::DoNothing;
        }
        let Some(mut node) = self.stack.pop() else {
            self.finish(false);
            return Action::DoNothing;
        };

        if node.depth < self.bounds.max_depth {
            if let Some((target, action)) = node.moves.pop() {
                let child = SearchNode::new(
                    target,
                    Some(node.coords),
                    node.depth + 1,
                    &self.bounds,
                    index,
                );
                self.stack.push(node);
                self.stack.push(child);

                if target == self.bounds.destination {
                    self.finish(true);
                }
                return action;
            }
        }

        if node.depth == 0 {
            self.finish(false);
            return Action::DoNothing;
        }
        self.backtracks += 1;
        Action::UndoMovement
    }

    /// The engine did not end up at `expected_head` (the snake fell or the
    /// move was refused). Drops that node; the caller undoes the move itself.
    pub fn abandon_current(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
            self.backtracks += 1;
        }
        self.is_finished = false;
        self.found = false;
    }

    fn finish(&mut self, found: bool) {
        self.is_finished = true;
        self.found = found;
        log::debug!(
            "Local search {} -> {} finished: found={found}, backtracks={}",
            self.start,
            self.bounds.destination,
            self.backtracks
        );
    }
}
