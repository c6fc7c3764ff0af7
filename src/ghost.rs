use std::time::Duration;

use rand::Rng;

use crate::components::Direction;
use crate::level::{CellType, GhostSpawn, Maze};
use crate::movement::neighbor;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum GhostKind {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostKind {
    pub fn name(self) -> &'static str {
        match self {
            GhostKind::Blinky => "blinky",
            GhostKind::Pinky => "pinky",
            GhostKind::Inky => "inky",
            GhostKind::Clyde => "clyde",
        }
    }

    /// Time between two steps of this ghost.
    pub fn period(self) -> Duration {
        match self {
            GhostKind::Blinky => Duration::from_millis(350),
            GhostKind::Pinky => Duration::from_millis(500),
            GhostKind::Inky => Duration::from_millis(400),
            GhostKind::Clyde => Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ghost {
    pub kind: GhostKind,
    pub start: usize,
    pub index: usize,
    pub scared: bool,
    pub heading: Direction,
}

/// What happened when a ghost and the player shared a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Apart,
    /// A scared ghost got eaten and went back to its start.
    Eaten,
    /// The player got caught.
    Caught,
}

impl Ghost {
    pub fn new(spawn: GhostSpawn) -> Self {
        Self {
            kind: spawn.kind,
            start: spawn.index,
            index: spawn.index,
            scared: false,
            heading: Direction::Left,
        }
    }

    pub fn period(&self) -> Duration {
        self.kind.period()
    }

    pub fn reset(&mut self) {
        self.index = self.start;
        self.scared = false;
    }

    /// One tick of the random walk. Keeps going the same way while the way
    /// is clear; when blocked, stalls and draws a fresh heading for the next
    /// tick. Returns whether the ghost moved.
    pub fn step(
        &mut self,
        maze: &Maze,
        occupied: impl Fn(usize) -> bool,
        rng: &mut impl Rng,
    ) -> bool {
        let target = neighbor(maze, self.index, self.heading)
            .filter(|t| maze.classify(*t) != CellType::Wall && !occupied(*t));
        match target {
            Some(target) => {
                self.index = target;
                true
            }
            None => {
                self.heading = random_heading(rng);
                false
            }
        }
    }

    pub fn touch(&mut self, player: usize) -> Contact {
        if self.index != player {
            return Contact::Apart;
        }
        if self.scared {
            self.index = self.start;
            Contact::Eaten
        } else {
            Contact::Caught
        }
    }
}

pub fn random_heading(rng: &mut impl Rng) -> Direction {
    Direction::ALL[rng.gen_range(0..Direction::ALL.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Layout;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn corridor() -> (Maze, Ghost) {
        let layout = Layout::from_ascii(&[
            "#####",
            "#b .#",
            "#P..#",
            "#...#",
            "#####",
        ])
        .unwrap();
        let ghost = Ghost::new(layout.ghost_starts[0]);
        (Maze::build(&layout), ghost)
    }

    #[test]
    fn keeps_heading_while_clear() {
        let (maze, mut ghost) = corridor();
        let mut rng = StdRng::seed_from_u64(7);
        ghost.heading = Direction::Right;
        assert!(ghost.step(&maze, |_| false, &mut rng));
        assert_eq!(ghost.index, 7);
        assert!(ghost.step(&maze, |_| false, &mut rng));
        assert_eq!(ghost.index, 8);
        assert_eq!(ghost.heading, Direction::Right);
    }

    #[test]
    fn stalls_one_tick_when_blocked() {
        let (maze, mut ghost) = corridor();
        let mut rng = StdRng::seed_from_u64(7);
        ghost.heading = Direction::Up;
        assert!(!ghost.step(&maze, |_| false, &mut rng));
        assert_eq!(ghost.index, 6);

        ghost.heading = Direction::Right;
        assert!(!ghost.step(&maze, |i| i == 7, &mut rng));
        assert_eq!(ghost.index, 6);
    }

    #[test]
    fn may_cross_the_lair_but_not_walls() {
        let layout = Layout::from_ascii(&["#####", "#b=P#", "#####", "#####", "#####"]).unwrap();
        let maze = Maze::build(&layout);
        let mut ghost = Ghost::new(layout.ghost_starts[0]);
        let mut rng = StdRng::seed_from_u64(1);
        ghost.heading = Direction::Right;
        assert!(ghost.step(&maze, |_| false, &mut rng));
        assert_eq!(maze.classify(ghost.index), CellType::GhostLair);
    }

    #[test]
    fn scared_ghost_is_sent_home() {
        let (_, mut ghost) = corridor();
        ghost.index = 11;
        ghost.scared = true;
        assert_eq!(ghost.touch(11), Contact::Eaten);
        assert_eq!(ghost.index, ghost.start);
        assert!(ghost.scared);
    }

    #[test]
    fn plain_ghost_catches_player() {
        let (_, mut ghost) = corridor();
        ghost.index = 11;
        assert_eq!(ghost.touch(11), Contact::Caught);
        assert_eq!(ghost.touch(12), Contact::Apart);
    }

    #[test]
    fn headings_cover_all_directions() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(random_heading(&mut rng));
        }
        assert_eq!(seen.len(), 4);
    }
}
