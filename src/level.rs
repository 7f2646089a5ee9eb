//! Level file loading
//!
//! Levels are plain text, `<n>.hadik`. Marker lines name a section and the
//! data lines after them hold `;`-separated integers:
//!
//! ```text
//! DIMENSIONS
//! 40;20
//! SNAKE
//! 3;17
//! WALL
//! 0;19;42;2
//! 0;0;1;20
//! FOOD
//! 12;18
//! FINISH
//! 30;16
//! ```
//!
//! `WALL` and `FOOD` take every following line that contains a `;`; the other
//! sections take exactly one line.

use std::fs;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Lines;

use glam::IVec2;

use crate::error::LoadError;
use crate::sim::{Entity, Finish, Food, Level, Snake, Wall};

/// Extension of level files
pub const LEVEL_EXTENSION: &str = "hadik";

/// Path of level `number` inside `dir`
pub fn level_path(dir: &Path, number: u32) -> PathBuf {
    dir.join(format!("{number}.{LEVEL_EXTENSION}"))
}

/// Read and parse a level file
pub fn load_level(path: &Path) -> Result<Level, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let level = parse_level(&text)?;
    log::info!(
        "Loaded level {} ({}x{}, {} entities)",
        path.display(),
        level.width,
        level.height,
        level.entities.len()
    );
    Ok(level)
}

/// Parse the text of a level file
pub fn parse_level(text: &str) -> Result<Level, LoadError> {
    let mut cursor = LineCursor::new(text);
    let mut dimensions = None;
    let mut camera_offset = IVec2::ZERO;
    let mut snake = None;
    let mut entities: Vec<Entity> = Vec::new();

    while let Some((line_no, line)) = cursor.next_line() {
        if line.contains("DIMENSIONS") {
            let [width, height] = cursor.data_line::<2>(line_no)?;
            if width <= 0 || height <= 0 {
                return Err(malformed(line_no + 1, "level dimensions must be positive"));
            }
            dimensions = Some((width, height));
        } else if line.contains("CAMERA_OFFSET") {
            let [x, y] = cursor.data_line::<2>(line_no)?;
            camera_offset = IVec2::new(x, y);
        } else if line.contains("SNAKE") {
            let [x, y] = cursor.data_line::<2>(line_no)?;
            snake = Some(Snake::spawn(x, y));
        } else if line.contains("WALL") {
            while let Some((number, [x, y, width, height])) = cursor.repeated_data::<4>()? {
                if width <= 0 || height <= 0 {
                    return Err(malformed(number, "wall size must be positive"));
                }
                entities.push(Wall::new(x, y, width, height).into());
            }
        } else if line.contains("FOOD") {
            while let Some((_, [x, y])) = cursor.repeated_data::<2>()? {
                entities.push(Food::new(x, y).into());
            }
        } else if line.contains("FINISH") {
            let [x, y] = cursor.data_line::<2>(line_no)?;
            entities.push(Finish::new(x, y).into());
        }
    }

    let (width, height) = dimensions.ok_or(LoadError::MissingSection("DIMENSIONS"))?;
    let snake = snake.ok_or(LoadError::MissingSection("SNAKE"))?;

    let mut level = Level::new(width, height, snake, entities);
    level.camera_offset = camera_offset;
    Ok(level)
}

fn malformed(line: usize, reason: impl Into<String>) -> LoadError {
    LoadError::Malformed {
        line,
        reason: reason.into(),
    }
}

/// Line reader with 1-based line numbers
struct LineCursor<'a> {
    lines: Peekable<std::iter::Enumerate<Lines<'a>>>,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate().peekable(),
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        self.lines.next().map(|(i, line)| (i + 1, line))
    }

    /// The single data line following the marker on `marker_line`
    fn data_line<const N: usize>(&mut self, marker_line: usize) -> Result<[i32; N], LoadError> {
        match self.next_line() {
            Some((number, line)) => parse_numbers(number, line),
            None => Err(malformed(marker_line, "section has no data line")),
        }
    }

    /// Next line of a repeated section, or `None` once the lines stop
    /// containing `;`
    fn repeated_data<const N: usize>(&mut self) -> Result<Option<(usize, [i32; N])>, LoadError> {
        let is_data = matches!(self.lines.peek(), Some((_, line)) if line.contains(';'));
        if !is_data {
            return Ok(None);
        }
        let Some((number, line)) = self.next_line() else {
            return Ok(None);
        };
        parse_numbers(number, line).map(|values| Some((number, values)))
    }
}

fn parse_numbers<const N: usize>(number: usize, line: &str) -> Result<[i32; N], LoadError> {
    let fields: Vec<&str> = line.trim().split(';').collect();
    if fields.len() != N {
        return Err(malformed(
            number,
            format!("expected {N} values, found {}", fields.len()),
        ));
    }

    let mut values = [0; N];
    for (value, field) in values.iter_mut().zip(&fields) {
        *value = field
            .trim()
            .parse()
            .map_err(|_| malformed(number, format!("'{field}' is not an integer")))?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Footprint;

    const SAMPLE: &str = "\
DIMENSIONS
20;10
CAMERA_OFFSET
-2;3
SNAKE
3;7
WALL
0;10;22;1
0;0;1;10
FOOD
8;9
12;9
FINISH
15;7
";

    #[test]
    fn test_parse_sample() {
        let level = parse_level(SAMPLE).expect("valid level");
        assert_eq!((level.width, level.height), (20, 10));
        assert_eq!(level.camera_offset, IVec2::new(-2, 3));
        assert_eq!(
            level.snake.blocks.iter().copied().collect::<Vec<_>>(),
            vec![
                IVec2::new(3, 7),
                IVec2::new(3, 8),
                IVec2::new(4, 8),
                IVec2::new(4, 7)
            ]
        );
        assert_eq!(level.entities.len(), 5);
        assert_eq!(level.uneaten_food().count(), 2);
        assert_eq!(level.finishes().count(), 1);
        assert_eq!(level.entities[0].collision_coords().len(), 22);
    }

    #[test]
    fn test_sections_in_any_order() {
        let text = "FOOD\n4;4\nSNAKE\n1;1\nDIMENSIONS\n8;8\n";
        let level = parse_level(text).expect("valid level");
        assert_eq!(level.width, 8);
        assert_eq!(level.uneaten_food().count(), 1);
        assert_eq!(level.camera_offset, IVec2::ZERO);
    }

    #[test]
    fn test_missing_sections() {
        assert!(matches!(
            parse_level("SNAKE\n1;1\n"),
            Err(LoadError::MissingSection("DIMENSIONS"))
        ));
        assert!(matches!(
            parse_level("DIMENSIONS\n5;5\n"),
            Err(LoadError::MissingSection("SNAKE"))
        ));
    }

    #[test]
    fn test_malformed_lines() {
        let err = parse_level("DIMENSIONS\n5;x\n").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 2, .. }));

        let err = parse_level("DIMENSIONS\n5;5\nWALL\n1;2;3\n").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 4, .. }));

        let err = parse_level("DIMENSIONS\n5;5\nSNAKE").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 3, .. }));
    }

    #[test]
    fn test_level_path() {
        assert_eq!(
            level_path(Path::new("levels"), 7),
            PathBuf::from("levels/7.hadik")
        );
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("hadik-no-such-level.hadik");
        assert!(matches!(load_level(&path), Err(LoadError::NotFound(_))));
    }
}
