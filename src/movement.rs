//! Grid stepping shared by the player and the ghosts.
//!
//! Cells are addressed by their row-major index. Horizontal steps never
//! wrap onto the neighbouring row; the only way across a side edge is a
//! tunnel portal.

use crate::components::Direction;
use crate::level::Maze;

/// The cell one step away from `index`, or `None` when the step leaves the
/// grid. Ignores what the target cell contains.
pub fn neighbor(maze: &Maze, index: usize, dir: Direction) -> Option<usize> {
    let width = maze.width();
    match dir {
        Direction::Left => {
            if index % width != 0 {
                Some(index - 1)
            } else {
                maze.portals().iter().find(|p| p.left == index).map(|p| p.right)
            }
        }
        Direction::Right => {
            if (index + 1) % width != 0 {
                Some(index + 1)
            } else {
                maze.portals().iter().find(|p| p.right == index).map(|p| p.left)
            }
        }
        Direction::Up => index.checked_sub(width),
        Direction::Down => Some(index + width).filter(|i| *i < maze.len()),
    }
}

/// Where the player ends up after trying to step `dir` from `index`.
/// Illegal moves leave the index unchanged.
pub fn resolve_move(maze: &Maze, index: usize, dir: Direction) -> usize {
    match neighbor(maze, index, dir) {
        Some(target) if maze.is_passable(target) => target,
        _ => index,
    }
}

pub fn can_move(maze: &Maze, index: usize, dir: Direction) -> bool {
    resolve_move(maze, index, dir) != index
}
