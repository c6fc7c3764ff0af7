use crate::components::Direction;
use crate::level::Maze;
use crate::movement::{can_move, resolve_move};

#[derive(Debug, Clone)]
pub struct Pacman {
    pub index: usize,
    pub direction: Option<Direction>,
    /// A hinted turn that was not possible yet and is still being waited on.
    pub turn_pending: bool,
}

impl Pacman {
    pub fn new(start: usize) -> Self {
        Self {
            index: start,
            direction: None,
            turn_pending: false,
        }
    }

    /// Takes the hinted direction when it leads somewhere, otherwise keeps
    /// going the current way. Returns the previous index.
    pub fn steer(&mut self, maze: &Maze, hint: Option<Direction>) -> usize {
        let from = self.index;
        match hint {
            Some(dir) if can_move(maze, from, dir) => {
                self.direction = Some(dir);
                self.turn_pending = false;
            }
            Some(dir) => self.turn_pending = self.direction != Some(dir),
            None => self.turn_pending = false,
        }
        if let Some(dir) = self.direction {
            self.index = resolve_move(maze, from, dir);
        }
        from
    }
}

/// Maps the recognizer's label onto a direction. Anything unrecognised,
/// including the empty string and `none`, is no hint at all.
pub fn parse_prediction(label: &str) -> Option<Direction> {
    match label.trim().to_ascii_lowercase().as_str() {
        "left" => Some(Direction::Left),
        "right" => Some(Direction::Right),
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        _ => None,
    }
}
