//! Level entities and their interaction footprints
//!
//! Every entity reports the cells where it collides, hurts, conducts and
//! interacts. Static entities are hashed once into the interaction index;
//! the snake is queried on demand every frame.

use std::collections::VecDeque;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{FINISH_HEIGHT, FINISH_WIDTH};
use crate::side_neighbors;

/// Index of a static entity inside `Level::entities`
pub type EntityId = usize;

/// What stepping onto an entity's interact cells means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractKind {
    None,
    Food,
    Finish,
}

/// Coordinate footprints shared by all entities
pub trait Footprint {
    /// Cells moving entities cannot enter
    fn collision_coords(&self) -> Vec<IVec2>;
    /// Cells where the entity cuts the snake
    fn hurt_coords(&self) -> Vec<IVec2>;
    /// Cells that receive charge while the entity is charged
    fn electricity_coords(&self) -> Vec<IVec2>;
    /// Cells where the entity reacts to the snake
    fn interact_coords(&self) -> Vec<IVec2>;

    fn conductive(&self) -> bool;
    fn charged(&self) -> bool;
    fn set_charge(&mut self, charge: bool);

    fn interact_kind(&self) -> InteractKind {
        InteractKind::None
    }
}

/// Solid rectangle, always conductive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    /// Top-left corner
    pub pos: IVec2,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub charge: bool,
}

impl Wall {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            pos: IVec2::new(x, y),
            width,
            height,
            charge: false,
        }
    }
}

impl Footprint for Wall {
    fn collision_coords(&self) -> Vec<IVec2> {
        let mut coords = Vec::with_capacity((self.width * self.height).max(0) as usize);
        for dy in 0..self.height {
            for dx in 0..self.width {
                coords.push(self.pos + IVec2::new(dx, dy));
            }
        }
        coords
    }

    fn hurt_coords(&self) -> Vec<IVec2> {
        Vec::new()
    }

    fn electricity_coords(&self) -> Vec<IVec2> {
        let mut coords = Vec::with_capacity(2 * (self.width + self.height).max(0) as usize);
        for dx in 0..self.width {
            coords.push(self.pos + IVec2::new(dx, -1));
            coords.push(self.pos + IVec2::new(dx, self.height));
        }
        for dy in 0..self.height {
            coords.push(self.pos + IVec2::new(-1, dy));
            coords.push(self.pos + IVec2::new(self.width, dy));
        }
        coords
    }

    fn interact_coords(&self) -> Vec<IVec2> {
        Vec::new()
    }

    fn conductive(&self) -> bool {
        true
    }

    fn charged(&self) -> bool {
        self.charge
    }

    fn set_charge(&mut self, charge: bool) {
        self.charge = charge;
    }
}

/// Single cell of food, grows the snake by one when eaten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub pos: IVec2,
    #[serde(default)]
    pub eaten: bool,
}

impl Food {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            pos: IVec2::new(x, y),
            eaten: false,
        }
    }
}

impl Footprint for Food {
    fn collision_coords(&self) -> Vec<IVec2> {
        Vec::new()
    }

    fn hurt_coords(&self) -> Vec<IVec2> {
        Vec::new()
    }

    fn electricity_coords(&self) -> Vec<IVec2> {
        Vec::new()
    }

    fn interact_coords(&self) -> Vec<IVec2> {
        vec![self.pos]
    }

    fn conductive(&self) -> bool {
        false
    }

    fn charged(&self) -> bool {
        false
    }

    fn set_charge(&mut self, _charge: bool) {}

    fn interact_kind(&self) -> InteractKind {
        InteractKind::Food
    }
}

/// The level exit: a solid 4x3 block entered from the row above it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finish {
    /// Top-left corner
    pub pos: IVec2,
}

impl Finish {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            pos: IVec2::new(x, y),
        }
    }
}

impl Footprint for Finish {
    fn collision_coords(&self) -> Vec<IVec2> {
        let mut coords = Vec::with_capacity((FINISH_WIDTH * FINISH_HEIGHT) as usize);
        for dy in 0..FINISH_HEIGHT {
            for dx in 0..FINISH_WIDTH {
                coords.push(self.pos + IVec2::new(dx, dy));
            }
        }
        coords
    }

    fn hurt_coords(&self) -> Vec<IVec2> {
        Vec::new()
    }

    fn electricity_coords(&self) -> Vec<IVec2> {
        Vec::new()
    }

    fn interact_coords(&self) -> Vec<IVec2> {
        (0..FINISH_WIDTH)
            .map(|dx| self.pos + IVec2::new(dx, -1))
            .collect()
    }

    fn conductive(&self) -> bool {
        false
    }

    fn charged(&self) -> bool {
        false
    }

    fn set_charge(&mut self, _charge: bool) {}

    fn interact_kind(&self) -> InteractKind {
        InteractKind::Finish
    }
}

/// Static level entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Wall(Wall),
    Food(Food),
    Finish(Finish),
}

impl Entity {
    pub fn as_food(&self) -> Option<&Food> {
        match self {
            Entity::Food(food) => Some(food),
            _ => None,
        }
    }

    pub fn as_food_mut(&mut self) -> Option<&mut Food> {
        match self {
            Entity::Food(food) => Some(food),
            _ => None,
        }
    }
}

/// Forwards a call to whichever variant an `Entity` holds
macro_rules! dispatch {
    ($entity:expr, $inner:ident => $call:expr) => {
        match $entity {
            Entity::Wall($inner) => $call,
            Entity::Food($inner) => $call,
            Entity::Finish($inner) => $call,
        }
    };
}

impl Footprint for Entity {
    fn collision_coords(&self) -> Vec<IVec2> {
        dispatch!(self, e => e.collision_coords())
    }

    fn hurt_coords(&self) -> Vec<IVec2> {
        dispatch!(self, e => e.hurt_coords())
    }

    fn electricity_coords(&self) -> Vec<IVec2> {
        dispatch!(self, e => e.electricity_coords())
    }

    fn interact_coords(&self) -> Vec<IVec2> {
        dispatch!(self, e => e.interact_coords())
    }

    fn conductive(&self) -> bool {
        dispatch!(self, e => e.conductive())
    }

    fn charged(&self) -> bool {
        dispatch!(self, e => e.charged())
    }

    fn set_charge(&mut self, charge: bool) {
        dispatch!(self, e => e.set_charge(charge))
    }

    fn interact_kind(&self) -> InteractKind {
        dispatch!(self, e => e.interact_kind())
    }
}

impl From<Wall> for Entity {
    fn from(wall: Wall) -> Self {
        Entity::Wall(wall)
    }
}

impl From<Food> for Entity {
    fn from(food: Food) -> Self {
        Entity::Food(food)
    }
}

impl From<Finish> for Entity {
    fn from(finish: Finish) -> Self {
        Entity::Finish(finish)
    }
}

/// The player-controlled snake (head first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snake {
    pub blocks: VecDeque<IVec2>,
    #[serde(default)]
    pub charge: bool,
}

impl Snake {
    pub fn new(blocks: impl IntoIterator<Item = IVec2>) -> Self {
        Self {
            blocks: blocks.into_iter().collect(),
            charge: false,
        }
    }

    /// Starting 2x2 snake as placed by level files
    pub fn spawn(x: i32, y: i32) -> Self {
        Self::new([
            IVec2::new(x, y),
            IVec2::new(x, y + 1),
            IVec2::new(x + 1, y + 1),
            IVec2::new(x + 1, y),
        ])
    }

    pub fn head(&self) -> Option<IVec2> {
        self.blocks.front().copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Index of the block occupying a cell
    pub fn position_of(&self, pos: IVec2) -> Option<usize> {
        self.blocks.iter().position(|&block| block == pos)
    }

    /// Cells where at least one solid entity is needed to not fall
    pub fn gravity_coords(&self) -> Vec<IVec2> {
        self.blocks.iter().map(|&block| block + IVec2::Y).collect()
    }

    /// Copy of the snake moved by an offset, keeping its shape
    pub fn shifted(&self, offset: IVec2) -> Self {
        Self {
            blocks: self.blocks.iter().map(|&block| block + offset).collect(),
            charge: self.charge,
        }
    }
}

impl Footprint for Snake {
    fn collision_coords(&self) -> Vec<IVec2> {
        self.blocks.iter().copied().collect()
    }

    fn hurt_coords(&self) -> Vec<IVec2> {
        Vec::new()
    }

    fn electricity_coords(&self) -> Vec<IVec2> {
        self.blocks
            .iter()
            .flat_map(|&block| side_neighbors(block))
            .collect()
    }

    fn interact_coords(&self) -> Vec<IVec2> {
        Vec::new()
    }

    fn conductive(&self) -> bool {
        true
    }

    fn charged(&self) -> bool {
        self.charge
    }

    fn set_charge(&mut self, charge: bool) {
        self.charge = charge;
    }
}
