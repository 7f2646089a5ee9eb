use glam::IVec2;
use hadik::ai::{ReachabilityPlanner, play_solution, solve_level};
use hadik::level::{level_path, load_level, parse_level};
use hadik::progress::SAVE_FILE;
use hadik::sim::{Action, Engine, EngineConfig, EnginePhase, InteractionIndex};
use hadik::{AutoplayError, PlayerData};

const FRAME_BUDGET: usize = 50_000;

/// One food on the floor, finish to the right
const CORRIDOR: &str = "\
DIMENSIONS
14;9
SNAKE
2;7
WALL
0;10;16;1
0;0;1;11
15;0;1;11
FOOD
6;9
FINISH
10;7
";

/// Food on a one-block step
const STEP: &str = "\
DIMENSIONS
14;9
CAMERA_OFFSET
1;1
SNAKE
2;8
WALL
0;10;16;1
0;0;1;11
15;0;1;11
7;9;2;1
FOOD
8;8
FINISH
10;7
";

fn solve_and_replay(text: &str) -> (Vec<Action>, Engine) {
    let level = parse_level(text).expect("level parses");
    let solution = solve_level(&level, EngineConfig::instant(), FRAME_BUDGET).expect("solvable");
    let engine = play_solution(&level, EngineConfig::default(), &solution, FRAME_BUDGET)
        .expect("solution replays");
    (solution, engine)
}

#[test]
fn corridor_level_is_solved_and_replayed() {
    let (solution, engine) = solve_and_replay(CORRIDOR);

    assert!(engine.level_finished());
    assert_eq!(engine.phase(), EnginePhase::Finished);
    assert!(engine.level().all_food_eaten());
    assert!(engine.level().snake.is_empty());
    assert!(solution.iter().all(|action| action.is_move()));
}

#[test]
fn food_on_a_step_is_solved() {
    let (_, engine) = solve_and_replay(STEP);
    assert!(engine.level_finished());
    assert!(engine.level().all_food_eaten());
}

#[test]
fn finished_engine_ignores_further_input() {
    let (_, mut engine) = solve_and_replay(CORRIDOR);
    let frame = engine.frame();
    for action in [Action::MoveLeft, Action::UndoMovement, Action::StopMovement] {
        engine.process_frame(action);
        assert_eq!(engine.phase(), EnginePhase::Finished);
        assert!(!engine.movement_happened());
    }
    assert_eq!(engine.frame(), frame + 3);
}

#[test]
fn coarse_path_steps_down_from_a_shelf() {
    // 10x10 room; the snake starts on a two-high shelf, food on the floor
    let text = "\
DIMENSIONS
10;10
SNAKE
2;7
WALL
0;11;12;1
0;0;12;1
0;0;1;12
11;0;1;12
1;9;4;2
FOOD
8;10
";
    let level = parse_level(text).expect("level parses");
    let index = InteractionIndex::build(&level.entities);
    let planner = ReachabilityPlanner::new(level.width, level.height, 4);
    let start = IVec2::new(2, 8);
    let goal = IVec2::new(8, 10);

    let path = planner.find_path(start, goal, &index).expect("path");
    assert!(!path.is_empty());
    assert!(planner.neighbors(start, &index).contains(&path[0]));
    assert_eq!(path.last(), Some(&goal));
    for pair in path.windows(2) {
        assert!(planner.neighbors(pair[0], &index).contains(&pair[1]));
    }
}

#[test]
fn sealed_food_makes_autoplay_give_up() {
    let text = format!("{CORRIDOR}FOOD\n13;1\nWALL\n12;1;1;2\n13;2;2;1\n");
    let level = parse_level(&text).expect("level parses");
    let err = solve_level(&level, EngineConfig::instant(), FRAME_BUDGET).unwrap_err();
    assert!(matches!(
        err,
        AutoplayError::Stuck { .. } | AutoplayError::FrameBudget(_)
    ));
}

#[test]
fn level_files_and_progress_on_disk() {
    let dir = std::env::temp_dir().join(format!("hadik-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");

    let path = level_path(&dir, 1);
    std::fs::write(&path, CORRIDOR).expect("write level");
    let level = load_level(&path).expect("load level");
    assert_eq!((level.width, level.height), (14, 9));
    assert!(load_level(&level_path(&dir, 2)).is_err());

    let save = dir.join(SAVE_FILE);
    let mut data = PlayerData::load(&save).expect("fresh data");
    assert!(data.is_unlocked(1));
    assert!(!data.is_unlocked(2));
    data.mark_completed(1).expect("valid level");
    data.save(&save).expect("save");

    assert!(
        std::fs::read_to_string(&save)
            .expect("save written")
            .contains("LEVELS\n1\n")
    );
    let reloaded = PlayerData::load(&save).expect("reload");
    assert!(reloaded.is_completed(1));
    assert!(reloaded.is_unlocked(2));

    let _ = std::fs::remove_dir_all(&dir);
}
