//! Player progress and preferences
//!
//! Persisted as a small marker-based text file next to the levels:
//!
//! ```text
//! FULLSCREEN
//! False
//!
//! AUTOPLAY
//! True
//!
//! LEVELS
//! 1;2;5
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::LEVEL_COUNT;
use crate::error::ProgressError;

/// Default save file name
pub const SAVE_FILE: &str = "player_data.save";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    pub fullscreen: bool,
    /// Let the solver play levels
    pub autoplay: bool,
    /// Finished levels, numbered from 1
    completed: BTreeSet<u32>,
}

impl PlayerData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, level: u32) -> bool {
        self.completed.contains(&level)
    }

    /// The first level is always open; every other one opens once the
    /// previous level is finished
    pub fn is_unlocked(&self, level: u32) -> bool {
        match level {
            0 => false,
            1 => true,
            n if n > LEVEL_COUNT => false,
            n => self.is_completed(n - 1),
        }
    }

    /// Record a finished level; returns whether it was new
    pub fn mark_completed(&mut self, level: u32) -> Result<bool, ProgressError> {
        if level == 0 || level > LEVEL_COUNT {
            return Err(ProgressError::InvalidLevel(level.to_string()));
        }
        Ok(self.completed.insert(level))
    }

    pub fn completed_levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.completed.iter().copied()
    }

    /// Parse the save file format
    pub fn parse(text: &str) -> Result<Self, ProgressError> {
        let mut data = Self::new();
        let mut lines = text.lines();

        while let Some(line) = lines.next() {
            if line.contains("FULLSCREEN") {
                data.fullscreen = parse_flag(lines.next());
            } else if line.contains("AUTOPLAY") {
                data.autoplay = parse_flag(lines.next());
            } else if line.contains("LEVELS") {
                let Some(levels) = lines.next() else {
                    continue;
                };
                for field in levels.trim().split(';').filter(|f| !f.is_empty()) {
                    let level = field
                        .trim()
                        .parse()
                        .map_err(|_| ProgressError::InvalidLevel(field.to_string()))?;
                    data.mark_completed(level)?;
                }
            }
        }
        Ok(data)
    }

    /// Render in the save file format
    pub fn to_save_string(&self) -> String {
        let levels: Vec<String> = self.completed.iter().map(u32::to_string).collect();
        format!(
            "FULLSCREEN\n{}\n\nAUTOPLAY\n{}\n\nLEVELS\n{}\n\n",
            format_flag(self.fullscreen),
            format_flag(self.autoplay),
            levels.join(";")
        )
    }

    /// Load from disk; a missing file means a fresh player
    pub fn load(path: &Path) -> Result<Self, ProgressError> {
        if !path.exists() {
            log::info!("No save at {}, starting fresh", path.display());
            return Ok(Self::new());
        }
        let data = Self::parse(&fs::read_to_string(path)?)?;
        log::info!(
            "Player data loaded ({} levels completed)",
            data.completed.len()
        );
        Ok(data)
    }

    pub fn save(&self, path: &Path) -> Result<(), ProgressError> {
        fs::write(path, self.to_save_string())?;
        log::info!("Player data saved to {}", path.display());
        Ok(())
    }
}

fn parse_flag(line: Option<&str>) -> bool {
    line.is_some_and(|line| line.trim() == "True")
}

fn format_flag(flag: bool) -> &'static str {
    if flag { "True" } else { "False" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_rule() {
        let mut data = PlayerData::new();
        assert!(data.is_unlocked(1));
        assert!(!data.is_unlocked(2));
        assert!(!data.is_unlocked(0));

        data.mark_completed(1).unwrap();
        assert!(data.is_unlocked(2));
        assert!(!data.is_unlocked(3));
        assert!(!data.is_unlocked(LEVEL_COUNT + 1));
    }

    #[test]
    fn test_mark_completed() {
        let mut data = PlayerData::new();
        assert!(data.mark_completed(3).unwrap());
        assert!(!data.mark_completed(3).unwrap());
        assert!(data.mark_completed(0).is_err());
        assert!(data.mark_completed(LEVEL_COUNT + 1).is_err());
        assert_eq!(data.completed_levels().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_parse_save_file() {
        let text = "FULLSCREEN\nTrue\n\nAUTOPLAY\nFalse\n\nLEVELS\n1;2;5\n\n";
        let data = PlayerData::parse(text).unwrap();
        assert!(data.fullscreen);
        assert!(!data.autoplay);
        assert_eq!(data.completed_levels().collect::<Vec<_>>(), vec![1, 2, 5]);
        assert_eq!(data.to_save_string(), text);
    }

    #[test]
    fn test_empty_levels_line() {
        let data = PlayerData::parse("LEVELS\n\n").unwrap();
        assert_eq!(data, PlayerData::new());
    }

    #[test]
    fn test_rejects_bad_level() {
        assert!(matches!(
            PlayerData::parse("LEVELS\n1;x\n"),
            Err(ProgressError::InvalidLevel(_))
        ));
        assert!(PlayerData::parse("LEVELS\n99\n").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("hadik-progress-{}.save", std::process::id()));
        let mut data = PlayerData::new();
        data.autoplay = true;
        data.mark_completed(4).unwrap();
        data.save(&path).unwrap();

        let loaded = PlayerData::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_missing_save_is_fresh() {
        let path = std::env::temp_dir().join("hadik-no-such-save.save");
        assert_eq!(PlayerData::load(&path).unwrap(), PlayerData::new());
    }
}
