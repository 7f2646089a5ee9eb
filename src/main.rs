//! Hadik headless runner
//!
//! Loads a level, solves it with autoplay (or takes a move string from the
//! command line), replays the moves on a fresh engine to confirm them and
//! prints the move list.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use hadik::PlayerData;
use hadik::ai::{play_solution, solve_level};
use hadik::level::{level_path, load_level};
use hadik::progress::SAVE_FILE;
use hadik::sim::{Action, EngineConfig};

/// Solve Hadik levels headlessly
#[derive(Parser, Debug)]
#[command(name = "hadik")]
#[command(about = "Solve a Hadik level with autoplay and verify the solution")]
struct Args {
    /// Level file to solve
    #[arg(conflicts_with = "level")]
    file: Option<PathBuf>,

    /// Level number, looked up as <levels-dir>/<n>.hadik
    #[arg(long, short = 'l')]
    level: Option<u32>,

    /// Directory holding numbered level files
    #[arg(long, default_value = "resources")]
    levels_dir: PathBuf,

    /// Engine config JSON (freeze frames)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check this move string (L, R, U, D) instead of solving
    #[arg(long)]
    moves: Option<String>,

    /// Frames autoplay may spend before giving up
    #[arg(long, default_value_t = 200_000)]
    max_frames: usize,

    /// Record the level as completed (needs --level)
    #[arg(long, requires = "level")]
    record: bool,

    /// Player data file [default: <levels-dir>/player_data.save]
    #[arg(long)]
    progress: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct SolveReport {
    level: String,
    moves: usize,
    solution: String,
    replay_frames: u64,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let path = match (&args.file, args.level) {
        (Some(file), _) => file.clone(),
        (None, Some(number)) => level_path(&args.levels_dir, number),
        (None, None) => return Err("pass a level file or --level <n>".into()),
    };

    let config = match &args.config {
        Some(config) => EngineConfig::load(config)?,
        None => EngineConfig::default(),
    };
    let level = load_level(&path)?;

    let solution = match &args.moves {
        Some(moves) => parse_moves(moves)?,
        None => solve_level(&level, config, args.max_frames)?,
    };
    let engine = play_solution(&level, config, &solution, args.max_frames)?;
    log::info!(
        "Solution verified: {} moves, {} frames",
        solution.len(),
        engine.frame()
    );

    let report = SolveReport {
        level: path.display().to_string(),
        moves: solution.len(),
        solution: solution.iter().copied().map(Action::as_char).collect(),
        replay_frames: engine.frame(),
    };
    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Level:    {}", report.level);
        println!("Moves:    {}", report.moves);
        println!("Frames:   {}", report.replay_frames);
        println!("Solution: {}", report.solution);
    }

    if let (true, Some(number)) = (args.record, args.level) {
        let progress = args
            .progress
            .clone()
            .unwrap_or_else(|| args.levels_dir.join(SAVE_FILE));
        let mut data = PlayerData::load(&progress)?;
        if data.mark_completed(number)? {
            data.save(&progress)?;
        }
    }
    Ok(())
}

fn parse_moves(moves: &str) -> Result<Vec<Action>, String> {
    moves
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match Action::from_char(c) {
            Some(action) if action.is_move() => Ok(action),
            _ => Err(format!("'{c}' is not a move (expected L, R, U or D)")),
        })
        .collect()
}
