//! Level data owned by the engine during a run
//!
//! A `Level` is cheap to deep-copy; the caller keeps one aside to restart.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, Finish, Food, Footprint, Snake};
use crate::in_bounds;

/// Everything placed in a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Playable width (coordinates 1..=width)
    pub width: i32,
    /// Playable height (coordinates 1..=height)
    pub height: i32,
    /// Initial camera offset for the renderer
    #[serde(default)]
    pub camera_offset: IVec2,
    pub snake: Snake,
    /// Static entities (walls, food, finish)
    pub entities: Vec<Entity>,
}

impl Level {
    pub fn new(width: i32, height: i32, snake: Snake, entities: Vec<Entity>) -> Self {
        Self {
            width,
            height,
            camera_offset: IVec2::ZERO,
            snake,
            entities,
        }
    }

    pub fn contains(&self, pos: IVec2) -> bool {
        in_bounds(pos, self.width, self.height)
    }

    /// Food still on the map, with its entity id
    pub fn uneaten_food(&self) -> impl Iterator<Item = (EntityId, &Food)> {
        self.entities
            .iter()
            .enumerate()
            .filter_map(|(id, entity)| entity.as_food().map(|food| (id, food)))
            .filter(|(_, food)| !food.eaten)
    }

    pub fn food(&self, id: EntityId) -> Option<&Food> {
        self.entities.get(id).and_then(Entity::as_food)
    }

    pub fn food_mut(&mut self, id: EntityId) -> Option<&mut Food> {
        self.entities.get_mut(id).and_then(Entity::as_food_mut)
    }

    pub fn finishes(&self) -> impl Iterator<Item = &Finish> {
        self.entities.iter().filter_map(|entity| match entity {
            Entity::Finish(finish) => Some(finish),
            _ => None,
        })
    }

    /// Cells the snake has to step on to finish the level
    pub fn finish_cells(&self) -> Vec<IVec2> {
        self.finishes()
            .flat_map(|finish| finish.interact_coords())
            .collect()
    }

    pub fn all_food_eaten(&self) -> bool {
        self.uneaten_food().next().is_none()
    }
}
