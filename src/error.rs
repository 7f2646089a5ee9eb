use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading a level description
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Level {0:?} not implemented")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Missing {0} section")]
    MissingSection(&'static str),
}

/// Failures while reading or writing player progress
#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid level number in progress file: {0}")]
    InvalidLevel(String),
}

/// Failures while loading engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons autoplay gave up on a level
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutoplayError {
    #[error("No path found to {target:?} from {head:?}")]
    Stuck {
        head: glam::IVec2,
        target: glam::IVec2,
    },

    #[error("Nothing left to head for from {0:?}: no food and no finish")]
    NoTarget(glam::IVec2),

    #[error("Frame budget of {0} frames exhausted")]
    FrameBudget(usize),

    #[error("Solution playback ended without finishing the level")]
    PlaybackFailed,
}
