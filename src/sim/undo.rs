//! Undo log entries
//!
//! Each record holds what the world looked like right before one frame that
//! moved the snake.

use std::collections::VecDeque;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;

/// Food consumed during the recorded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EatenFood {
    pub pos: IVec2,
    pub entity: EntityId,
}

/// Pre-move snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoRecord {
    pub snake: VecDeque<IVec2>,
    /// Whether the snake was mid-fall before the frame
    pub falling: bool,
    pub events: Vec<EatenFood>,
}

impl UndoRecord {
    pub fn new(snake: VecDeque<IVec2>, falling: bool) -> Self {
        Self {
            snake,
            falling,
            events: Vec::new(),
        }
    }
}
