//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One action per tick, no wall-clock time
//! - Stable iteration order (entities by index, snake head first)
//! - No rendering or platform dependencies

pub mod entity;
pub mod grouping;
pub mod interaction;
pub mod state;
pub mod tick;
pub mod undo;

pub use entity::{Entity, EntityId, Finish, Food, Footprint, InteractKind, Snake, Wall};
pub use grouping::{connected_conductive_groups, group_containing};
pub use interaction::{
    GroupId, Interaction, InteractionGroup, InteractionIndex, InteractionSet, InteractionType,
};
pub use state::Level;
pub use tick::{Action, Engine, EngineConfig, EnginePhase};
pub use undo::{EatenFood, UndoRecord};
