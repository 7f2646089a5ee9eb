//! Autoplay: coarse waypoints refined by the local search, one action per frame
//!
//! The driver only ever looks at the engine; it never mutates it. Every
//! action it returns is meant to be fed straight into
//! [`Engine::process_frame`]. Alongside, it keeps a clean trace of the moves
//! that survived backtracking, which replays the level from its start.

use std::collections::VecDeque;

use glam::IVec2;

use super::coarse::ReachabilityPlanner;
use super::local::LocalMovePlanner;
use super::reach::has_ground;
use crate::error::AutoplayError;
use crate::sim::{Action, Engine, EngineConfig, EnginePhase, Interaction, Level};
use crate::{distance_squared, in_bounds, taxicab};

/// Consecutive failed waypoints before giving up
const MAX_WAYPOINT_FAILURES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoplayStatus {
    Searching,
    /// The final move into the finish has been issued
    Solved,
    Stuck(AutoplayError),
}

/// Frame-driven solver for one level
#[derive(Debug, Clone)]
pub struct Autoplay {
    coarse: ReachabilityPlanner,
    width: i32,
    height: i32,
    /// Remaining waypoints of the current coarse path
    path: VecDeque<IVec2>,
    local: Option<LocalMovePlanner>,
    /// Cell above the finish the snake is heading into, once all food is eaten
    victory_square: Option<IVec2>,
    /// Engine undo depth before each move of the running local search
    move_depths: Vec<usize>,
    /// Undo until the engine is back at this depth
    undo_to: Option<usize>,
    /// A local-search move was issued and its landing is not yet checked
    awaiting_check: bool,
    waypoint_failures: u32,
    drops: i32,
    trace: Vec<Action>,
    status: AutoplayStatus,
}

impl Autoplay {
    pub fn new(engine: &Engine) -> Self {
        let level = engine.level();
        Self {
            coarse: ReachabilityPlanner::new(level.width, level.height, engine.snake_len()),
            width: level.width,
            height: level.height,
            path: VecDeque::new(),
            local: None,
            victory_square: None,
            move_depths: Vec::new(),
            undo_to: None,
            awaiting_check: false,
            waypoint_failures: 0,
            drops: 0,
            trace: Vec::new(),
            status: AutoplayStatus::Searching,
        }
    }

    pub fn status(&self) -> &AutoplayStatus {
        &self.status
    }

    pub fn is_done(&self) -> bool {
        self.status != AutoplayStatus::Searching
    }

    /// Moves that survived backtracking, in order
    pub fn solution(&self) -> &[Action] {
        &self.trace
    }

    pub fn victory_square(&self) -> Option<IVec2> {
        self.victory_square
    }

    /// Decide the action for the coming frame
    pub fn next_action(&mut self, engine: &Engine) -> Action {
        loop {
            if self.is_done() {
                return Action::DoNothing;
            }
            if matches!(
                engine.phase(),
                EnginePhase::Finishing | EnginePhase::Finished
            ) {
                log::info!("Autoplay reached the finish in {} moves", self.trace.len());
                self.status = AutoplayStatus::Solved;
                return Action::DoNothing;
            }

            // Unwinding a dead end, one engine undo per frame
            if let Some(depth) = self.undo_to {
                if engine.undo_depth() > depth {
                    return Action::UndoMovement;
                }
                self.undo_to = None;
            }

            if !engine.is_settled() {
                return Action::DoNothing;
            }
            let Some(head) = engine.snake_head() else {
                return Action::DoNothing;
            };

            if self.awaiting_check {
                self.awaiting_check = false;
                if let Some(local) = self.local.as_mut() {
                    if local.expected_head() != Some(head) {
                        log::debug!(
                            "Head at {head}, expected {:?}; abandoning move",
                            local.expected_head()
                        );
                        local.abandon_current();
                        self.retract_move();
                        continue;
                    }
                }
            }

            if let Some(victory) = self.victory_square {
                if taxicab(head, victory) == 1 {
                    if let Some(action) = Action::from_direction(victory - head) {
                        self.trace.push(action);
                        self.status = AutoplayStatus::Solved;
                        log::info!("Autoplay solved the level in {} moves", self.trace.len());
                        return action;
                    }
                }
            }

            if let Some(action) = self.step_local(engine) {
                match action {
                    Action::UndoMovement => {
                        self.retract_move();
                        continue;
                    }
                    action => {
                        self.move_depths.push(engine.undo_depth());
                        self.trace.push(action);
                        self.awaiting_check = true;
                        return action;
                    }
                }
            }

            if let Some(waypoint) = self.path.pop_front() {
                self.local = Some(LocalMovePlanner::new(
                    head,
                    waypoint,
                    engine.index(),
                    engine.snake_len(),
                    self.width,
                    self.height,
                ));
                continue;
            }

            if !has_ground(engine.index(), head) {
                return self.drop_head(engine, head);
            }
            self.drops = 0;

            if let Err(err) = self.plan(engine, head) {
                log::warn!("Autoplay gave up: {err}");
                self.status = AutoplayStatus::Stuck(err);
                return Action::DoNothing;
            }
        }
    }

    /// Advance the running local search. `None` once there is nothing to
    /// search, in which case the finished planner has been cleared.
    fn step_local(&mut self, engine: &Engine) -> Option<Action> {
        let local = self.local.as_mut()?;
        if !local.is_finished() {
            let action = local.get_next_move(engine.index());
            if action != Action::DoNothing {
                return Some(action);
            }
        }

        let found = local.found();
        let destination = local.destination();
        self.local = None;
        self.move_depths.clear();

        if found {
            self.waypoint_failures = 0;
            // Reach grows with the snake, so the rest of the path is stale
            if engine.snake_len() != self.coarse.snake_length() {
                self.path.clear();
            }
        } else {
            self.waypoint_failures += 1;
            log::debug!(
                "Local search failed to reach {destination} ({} in a row)",
                self.waypoint_failures
            );
            self.path.clear();
        }
        None
    }

    /// Take back the most recent local-search move
    fn retract_move(&mut self) {
        self.trace.pop();
        self.undo_to = self.move_depths.pop();
    }

    /// The head is hanging over its own body; step down onto it
    fn drop_head(&mut self, engine: &Engine, head: IVec2) -> Action {
        let below = head + IVec2::Y;
        let interactions = engine.index().get_interactions(below);
        self.drops += 1;
        if self.drops > self.height
            || !in_bounds(below, self.width, self.height)
            || !interactions.is_passable()
            || interactions.contains(Interaction::Finish)
        {
            let err = AutoplayError::Stuck {
                head,
                target: below,
            };
            log::warn!("Autoplay gave up: {err}");
            self.status = AutoplayStatus::Stuck(err);
            return Action::DoNothing;
        }
        self.trace.push(Action::MoveDown);
        Action::MoveDown
    }

    /// Pick the next target and fill `path` with waypoints to it
    fn plan(&mut self, engine: &Engine, head: IVec2) -> Result<(), AutoplayError> {
        if self.waypoint_failures >= MAX_WAYPOINT_FAILURES {
            return Err(AutoplayError::Stuck {
                head,
                target: self.victory_square.unwrap_or(head),
            });
        }

        let target = self.choose_target(engine.level(), head)?;
        self.coarse.update_length(engine.snake_len());
        let path = self
            .coarse
            .find_path(head, target, engine.index())
            .filter(|path| !path.is_empty())
            .ok_or(AutoplayError::Stuck { head, target })?;

        log::debug!("Heading for {target} via {} waypoints", path.len());
        self.path = path.into();
        Ok(())
    }

    /// Nearest uneaten food, or the nearest cell above a finish once none is left
    fn choose_target(&mut self, level: &Level, head: IVec2) -> Result<IVec2, AutoplayError> {
        let food = level
            .uneaten_food()
            .map(|(_, food)| food.pos)
            .min_by_key(|&pos| distance_squared(head, pos));
        if let Some(pos) = food {
            return Ok(pos);
        }

        let victory = level
            .finish_cells()
            .into_iter()
            .min_by_key(|&pos| distance_squared(head, pos))
            .ok_or(AutoplayError::NoTarget(head))?;
        self.victory_square = Some(victory);
        Ok(victory)
    }
}

/// Run autoplay on a fresh engine until it solves the level.
///
/// Returns the clean move list that replays the level from its start.
pub fn solve_level(
    level: &Level,
    config: EngineConfig,
    frame_budget: usize,
) -> Result<Vec<Action>, AutoplayError> {
    let mut engine = Engine::new(level.clone(), config);
    let mut autoplay = Autoplay::new(&engine);

    for _ in 0..frame_budget {
        match autoplay.status() {
            AutoplayStatus::Solved => return Ok(autoplay.solution().to_vec()),
            AutoplayStatus::Stuck(err) => return Err(err.clone()),
            AutoplayStatus::Searching => {}
        }
        let action = autoplay.next_action(&engine);
        engine.process_frame(action);
    }

    match autoplay.status() {
        AutoplayStatus::Solved => Ok(autoplay.solution().to_vec()),
        AutoplayStatus::Stuck(err) => Err(err.clone()),
        AutoplayStatus::Searching => Err(AutoplayError::FrameBudget(frame_budget)),
    }
}

/// Replay a move list on a fresh engine, issuing each move once settled.
///
/// Returns the engine after the level finished.
pub fn play_solution(
    level: &Level,
    config: EngineConfig,
    actions: &[Action],
    frame_budget: usize,
) -> Result<Engine, AutoplayError> {
    let mut engine = Engine::new(level.clone(), config);
    let mut pending = actions.iter().copied();

    for _ in 0..frame_budget {
        if engine.level_finished() {
            return Ok(engine);
        }
        let action = if engine.is_settled() {
            pending.next().ok_or(AutoplayError::PlaybackFailed)?
        } else {
            Action::DoNothing
        };
        engine.process_frame(action);
    }

    if engine.level_finished() {
        Ok(engine)
    } else {
        Err(AutoplayError::FrameBudget(frame_budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Entity, Finish, Food, Snake, Wall};

    const BUDGET: usize = 20_000;

    /// 14x9 room: floor on row 10, food on the floor, finish to the right
    fn corridor_level() -> Level {
        let entities: Vec<Entity> = vec![
            Wall::new(0, 10, 16, 1).into(),
            Wall::new(0, 0, 1, 11).into(),
            Wall::new(15, 0, 1, 11).into(),
            Food::new(6, 9).into(),
            Finish::new(10, 7).into(),
        ];
        Level::new(14, 9, Snake::spawn(2, 7), entities)
    }

    #[test]
    fn test_waits_for_landing() {
        let engine = Engine::new(corridor_level(), EngineConfig::instant());
        let mut autoplay = Autoplay::new(&engine);
        assert!(!engine.is_settled());
        assert_eq!(autoplay.next_action(&engine), Action::DoNothing);
    }

    #[test]
    fn test_first_move_drops_head_onto_ground() {
        let mut engine = Engine::new(corridor_level(), EngineConfig::instant());
        let mut autoplay = Autoplay::new(&engine);
        while !engine.is_settled() {
            engine.process_frame(autoplay.next_action(&engine));
        }
        assert_eq!(engine.snake_head(), Some(IVec2::new(2, 8)));
        assert_eq!(autoplay.next_action(&engine), Action::MoveDown);
    }

    #[test]
    fn test_solves_corridor() {
        let level = corridor_level();
        let solution = solve_level(&level, EngineConfig::instant(), BUDGET).expect("solution");
        assert!(!solution.is_empty());
        assert!(solution.iter().all(|action| action.is_move()));

        let engine = play_solution(&level, EngineConfig::instant(), &solution, BUDGET)
            .expect("replay finishes");
        assert_eq!(engine.phase(), EnginePhase::Finished);
        assert!(engine.level().all_food_eaten());
    }

    #[test]
    fn test_solution_independent_of_freeze_frames() {
        let level = corridor_level();
        let solution = solve_level(&level, EngineConfig::instant(), BUDGET).expect("solution");
        let slow = EngineConfig {
            falling_freeze_frames: 4,
            finishing_freeze_frames: 3,
        };
        let engine = play_solution(&level, slow, &solution, BUDGET).expect("replay finishes");
        assert!(engine.level_finished());
    }

    #[test]
    fn test_unreachable_food_gets_stuck() {
        let mut level = corridor_level();
        // Food sealed in the ceiling corner behind walls
        level.entities.push(Food::new(13, 1).into());
        level.entities.push(Wall::new(12, 1, 1, 2).into());
        level.entities.push(Wall::new(13, 2, 2, 1).into());

        let err = solve_level(&level, EngineConfig::instant(), BUDGET).unwrap_err();
        assert!(matches!(
            err,
            AutoplayError::Stuck { .. } | AutoplayError::FrameBudget(_)
        ));
    }

    #[test]
    fn test_no_finish_is_reported() {
        let entities: Vec<Entity> = vec![Wall::new(0, 10, 16, 1).into()];
        let level = Level::new(14, 9, Snake::spawn(2, 8), entities);
        let err = solve_level(&level, EngineConfig::instant(), BUDGET).unwrap_err();
        assert!(matches!(err, AutoplayError::NoTarget(_)));
    }

    #[test]
    fn test_playback_runs_out_of_moves() {
        let level = corridor_level();
        let err = play_solution(&level, EngineConfig::instant(), &[Action::MoveRight], BUDGET)
            .unwrap_err();
        assert_eq!(err, AutoplayError::PlaybackFailed);
    }

    #[test]
    fn test_frame_budget() {
        let level = corridor_level();
        let err = solve_level(&level, EngineConfig::default(), 3).unwrap_err();
        assert_eq!(err, AutoplayError::FrameBudget(3));
    }
}
