//! Frame-by-frame simulation
//!
//! The engine owns a level for the duration of a run and advances it one
//! action per tick: player movement, self-folding, eating, gravity, the
//! finish animation and the undo log.

use std::path::Path;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::entity::Snake;
use super::interaction::{Interaction, InteractionIndex};
use super::state::Level;
use super::undo::{EatenFood, UndoRecord};
use crate::consts::{FALLING_FREEZE_FRAMES, FINISHING_FREEZE_FRAMES};
use crate::error::ConfigError;

/// Input for a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Action {
    #[default]
    DoNothing,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    /// Debug pause
    StopMovement,
    /// Revert the last frame that moved the snake
    UndoMovement,
}

impl Action {
    pub const MOVES: [Action; 4] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
    ];

    /// Grid offset of a move action
    pub fn direction(self) -> Option<IVec2> {
        match self {
            Action::MoveLeft => Some(IVec2::NEG_X),
            Action::MoveRight => Some(IVec2::X),
            Action::MoveUp => Some(IVec2::NEG_Y),
            Action::MoveDown => Some(IVec2::Y),
            _ => None,
        }
    }

    /// Move action for a unit offset
    pub fn from_direction(delta: IVec2) -> Option<Action> {
        Action::MOVES
            .into_iter()
            .find(|action| action.direction() == Some(delta))
    }

    pub fn is_move(self) -> bool {
        self.direction().is_some()
    }

    /// Single-letter form used for printing solutions
    pub fn as_char(self) -> char {
        match self {
            Action::DoNothing => '.',
            Action::MoveLeft => 'L',
            Action::MoveRight => 'R',
            Action::MoveUp => 'U',
            Action::MoveDown => 'D',
            Action::StopMovement => 'S',
            Action::UndoMovement => 'Z',
        }
    }

    pub fn from_char(c: char) -> Option<Action> {
        match c.to_ascii_uppercase() {
            '.' => Some(Action::DoNothing),
            'L' => Some(Action::MoveLeft),
            'R' => Some(Action::MoveRight),
            'U' => Some(Action::MoveUp),
            'D' => Some(Action::MoveDown),
            'S' => Some(Action::StopMovement),
            'Z' => Some(Action::UndoMovement),
            _ => None,
        }
    }
}

/// Engine state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    /// Accepting input
    Running,
    /// Snake is dropping one row every few frames
    Falling,
    /// Snake reached the finish and is dissolving tail first
    Finishing,
    /// Debug pause
    Stopped,
    /// Level won
    Finished,
}

/// Animation pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frames per gravity step while falling
    pub falling_freeze_frames: u32,
    /// Frames per removed block while finishing
    pub finishing_freeze_frames: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            falling_freeze_frames: FALLING_FREEZE_FRAMES,
            finishing_freeze_frames: FINISHING_FREEZE_FRAMES,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.falling_freeze_frames = config.falling_freeze_frames.max(1);
        config.finishing_freeze_frames = config.finishing_freeze_frames.max(1);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// No animation delays (every frame advances), used by solvers
    pub fn instant() -> Self {
        Self {
            falling_freeze_frames: 1,
            finishing_freeze_frames: 1,
        }
    }
}

/// Owns a level and advances it one tick at a time
#[derive(Debug, Clone)]
pub struct Engine {
    level: Level,
    /// Untouched copy of the level as loaded, for restarts
    initial: Level,
    index: InteractionIndex,
    config: EngineConfig,
    phase: EnginePhase,
    /// Phase to return to when a stop is lifted
    stopped_from: EnginePhase,
    countdown: u32,
    undo: Vec<UndoRecord>,
    movement_happened: bool,
    last_movement: Action,
    frame: u64,
}

impl Engine {
    pub fn new(level: Level, config: EngineConfig) -> Self {
        let index = InteractionIndex::build(&level.entities);
        log::debug!(
            "Engine started on {}x{} level with {} entities",
            level.width,
            level.height,
            level.entities.len()
        );
        Self {
            initial: level.clone(),
            level,
            index,
            config,
            phase: EnginePhase::Running,
            stopped_from: EnginePhase::Running,
            countdown: 0,
            undo: Vec::new(),
            movement_happened: false,
            last_movement: Action::DoNothing,
            frame: 0,
        }
    }

    /// Fresh engine on the level as it was loaded, same config
    pub fn restart(&self) -> Self {
        log::debug!("Restarting level after {} frames", self.frame);
        Self::new(self.initial.clone(), self.config)
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn index(&self) -> &InteractionIndex {
        &self.index
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn level_finished(&self) -> bool {
        self.phase == EnginePhase::Finished
    }

    /// Whether the last frame moved the snake (move, fall or undo)
    pub fn movement_happened(&self) -> bool {
        self.movement_happened
    }

    /// Direction of the most recent movement, for camera follow
    pub fn last_movement(&self) -> Action {
        self.last_movement
    }

    pub fn snake_head(&self) -> Option<IVec2> {
        self.level.snake.head()
    }

    pub fn snake_len(&self) -> usize {
        self.level.snake.len()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Frames processed so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// At least one block rests on a wall
    pub fn is_supported(&self) -> bool {
        self.level
            .snake
            .gravity_coords()
            .into_iter()
            .any(|pos| self.index.get_interactions(pos).contains(Interaction::Wall))
    }

    /// Ready for the next move: running and standing on something
    pub fn is_settled(&self) -> bool {
        self.phase == EnginePhase::Running && self.is_supported()
    }

    /// Advance one tick
    pub fn process_frame(&mut self, action: Action) {
        self.movement_happened = false;
        self.frame += 1;

        if self.phase == EnginePhase::Finished {
            return;
        }

        match action {
            Action::StopMovement => {
                if self.phase != EnginePhase::Stopped {
                    self.stopped_from = self.phase;
                    self.set_phase(EnginePhase::Stopped);
                }
                return;
            }
            Action::DoNothing if self.phase == EnginePhase::Stopped => return,
            _ => {}
        }
        if self.phase == EnginePhase::Stopped {
            self.set_phase(self.stopped_from);
        }

        if action == Action::UndoMovement {
            self.undo_last();
            return;
        }

        match self.phase {
            EnginePhase::Falling | EnginePhase::Finishing => {
                self.countdown = self.countdown.saturating_sub(1);
                if self.countdown > 0 {
                    return;
                }
                if self.phase == EnginePhase::Finishing {
                    self.dissolve_tail();
                    return;
                }
                self.countdown = self.config.falling_freeze_frames;
            }
            _ => {}
        }

        let falling = self.phase == EnginePhase::Falling;
        let mut record = UndoRecord::new(self.level.snake.blocks.clone(), falling);

        let mut moved = false;
        if !falling {
            moved |= self.move_player(action, &mut record);
        }
        if self.phase != EnginePhase::Finishing {
            moved |= self.apply_gravity();
        }

        if moved {
            self.movement_happened = true;
            self.undo.push(record);
        }
    }

    /// Try to move the head one cell; returns whether the snake moved
    fn move_player(&mut self, action: Action, record: &mut UndoRecord) -> bool {
        let Some(delta) = action.direction() else {
            return false;
        };
        let Some(head) = self.level.snake.head() else {
            return false;
        };

        let target = head + delta;
        if !self.level.contains(target) {
            return false;
        }

        let interactions = self.index.get_interactions(target);
        let mut grow = false;
        if interactions.contains(Interaction::Food) {
            if let Some(entity) = self.index.update_eaten_food(target) {
                if let Some(food) = self.level.food_mut(entity) {
                    food.eaten = true;
                }
                record.events.push(EatenFood { pos: target, entity });
                grow = true;
                log::debug!("Food eaten at {target}");
            }
        } else if interactions.contains(Interaction::Finish) {
            self.enter_finishing();
            return false;
        } else if interactions.contains(Interaction::Wall) {
            return false;
        }

        let snake = &mut self.level.snake;
        match snake.position_of(target) {
            // Moving into the body folds it instead of cutting it
            Some(i) => {
                snake.blocks.remove(i);
            }
            None if !grow => {
                snake.blocks.pop_back();
            }
            None => {}
        }
        snake.blocks.push_front(target);

        self.last_movement = action;
        true
    }

    /// Drop the snake one row if nothing holds it; returns whether it fell
    fn apply_gravity(&mut self) -> bool {
        if self.level.snake.is_empty() {
            return false;
        }
        if self.is_supported() {
            if self.phase == EnginePhase::Falling {
                self.set_phase(EnginePhase::Running);
            }
            return false;
        }

        let fallen = self.level.snake.shifted(IVec2::Y);
        let reaches_finish = fallen
            .blocks
            .iter()
            .any(|&pos| self.index.get_interactions(pos).contains(Interaction::Finish));
        if reaches_finish {
            self.enter_finishing();
            return false;
        }

        self.level.snake = fallen;
        self.last_movement = Action::MoveDown;

        if self.is_supported() {
            self.set_phase(EnginePhase::Running);
        } else if self.phase != EnginePhase::Falling {
            self.set_phase(EnginePhase::Falling);
            self.countdown = self.config.falling_freeze_frames;
        }
        true
    }

    fn undo_last(&mut self) {
        let Some(record) = self.undo.pop() else {
            return;
        };
        let old_head = self.level.snake.head();

        for event in record.events.iter().rev() {
            if let Some(food) = self.level.food_mut(event.entity) {
                food.eaten = false;
            }
            self.index.restore_food(event.pos, event.entity);
        }

        let charge = self.level.snake.charge;
        self.level.snake = Snake {
            blocks: record.snake,
            charge,
        };

        // The finish animation keeps running on the restored snake
        if self.phase != EnginePhase::Finishing {
            if record.falling {
                self.set_phase(EnginePhase::Falling);
                self.countdown = self.config.falling_freeze_frames;
            } else {
                self.set_phase(EnginePhase::Running);
            }
        }

        self.movement_happened = true;
        self.last_movement = match (old_head, self.level.snake.head()) {
            (Some(old), Some(new)) => dominant_direction(new - old),
            _ => Action::DoNothing,
        };
    }

    fn enter_finishing(&mut self) {
        self.set_phase(EnginePhase::Finishing);
        self.countdown = self.config.finishing_freeze_frames;
    }

    fn dissolve_tail(&mut self) {
        self.level.snake.blocks.pop_back();
        if self.level.snake.is_empty() {
            self.set_phase(EnginePhase::Finished);
            log::info!("Level finished after {} frames", self.frame);
        } else {
            self.countdown = self.config.finishing_freeze_frames;
        }
    }

    fn set_phase(&mut self, phase: EnginePhase) {
        if self.phase != phase {
            log::debug!("Engine phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

/// Move action along the larger axis of an offset
fn dominant_direction(delta: IVec2) -> Action {
    let step = if delta.x.abs() >= delta.y.abs() {
        IVec2::new(delta.x.signum(), 0)
    } else {
        IVec2::new(0, delta.y.signum())
    };
    Action::from_direction(step).unwrap_or(Action::DoNothing)
}
