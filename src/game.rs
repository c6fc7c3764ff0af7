//! The synchronous heart of a session: maze, player, ghosts, score and the
//! running/won/lost flags. Timers live in [`crate::session`]; everything
//! here is a plain state transition.

use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::components::{Direction, Marker, MarkerSet, PelletKind};
use crate::ghost::{random_heading, Contact, Ghost};
use crate::level::{Layout, Maze};
use crate::player::Pacman;

pub const DOT_POINTS: u32 = 1;
pub const POWER_PELLET_POINTS: u32 = 10;
pub const GHOST_POINTS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

impl Outcome {
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Won => "Congratulations, you won!",
            Outcome::Lost => "Too bad, you lost. Better luck next time!",
        }
    }
}

/// Result of a single player or ghost tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is not running; nothing happened.
    Idle,
    Continue,
    /// A power pellet was eaten and every ghost is now scared.
    Scared,
    /// The tick ended the session, which is already reset.
    Finished(Outcome),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFlags {
    pub running: bool,
    pub lost: bool,
    pub won: bool,
}

/// Everything a front-end needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub width: usize,
    pub cells: Vec<MarkerSet>,
    pub score: u32,
    pub running: bool,
    pub notice: Option<Outcome>,
    pub direction: Option<Direction>,
    pub turn_pending: bool,
}

pub struct Game {
    layout: Layout,
    maze: Maze,
    pacman: Pacman,
    ghosts: Vec<Ghost>,
    score: u32,
    flags: SessionFlags,
    notice: Option<Outcome>,
    rng: StdRng,
}

impl Game {
    pub fn new(layout: Layout, rng: StdRng) -> Self {
        let maze = Maze::build(&layout);
        let pacman = Pacman::new(layout.player_start);
        let ghosts = layout.ghost_starts.iter().copied().map(Ghost::new).collect();
        Self {
            layout,
            maze,
            pacman,
            ghosts,
            score: 0,
            flags: SessionFlags::default(),
            notice: None,
            rng,
        }
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn pacman(&self) -> &Pacman {
        &self.pacman
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn flags(&self) -> SessionFlags {
        self.flags
    }

    pub fn is_running(&self) -> bool {
        self.flags.running
    }

    /// The outcome of the last finished session, until the next start.
    pub fn notice(&self) -> Option<Outcome> {
        self.notice
    }

    /// Stopped -> Running. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.flags.running {
            return false;
        }
        self.flags = SessionFlags {
            running: true,
            lost: false,
            won: false,
        };
        self.notice = None;
        for ghost in &mut self.ghosts {
            ghost.heading = random_heading(&mut self.rng);
        }
        info!("session started");
        true
    }

    /// Running -> Stopped. Rebuilds the maze and puts everyone back on their
    /// start cells. Returns the outcome if the session was won or lost.
    pub fn stop(&mut self) -> Option<Outcome> {
        if !self.flags.running {
            return None;
        }
        self.flags.running = false;
        self.maze = Maze::build(&self.layout);
        self.score = 0;
        self.pacman = Pacman::new(self.layout.player_start);
        self.ghosts.iter_mut().for_each(Ghost::reset);

        let outcome = if self.flags.lost {
            Some(Outcome::Lost)
        } else if self.flags.won {
            Some(Outcome::Won)
        } else {
            None
        };
        self.notice = outcome;
        info!(?outcome, "session stopped");
        outcome
    }

    pub fn player_tick(&mut self, hint: Option<Direction>) -> TickOutcome {
        if !self.flags.running {
            return TickOutcome::Idle;
        }
        let from = self.pacman.steer(&self.maze, hint);
        let at = self.pacman.index;
        if from != at {
            debug!(from, to = at, "pacman moved");
        }

        let mut scared = false;
        match self.maze.consume(at) {
            Some(PelletKind::Normal) => {
                self.score += DOT_POINTS;
                if self.maze.dots_remaining() == 0 {
                    return self.finish(Outcome::Won);
                }
            }
            Some(PelletKind::Power) => {
                self.score += POWER_PELLET_POINTS;
                self.ghosts.iter_mut().for_each(|g| g.scared = true);
                scared = true;
                debug!(at, "power pellet eaten");
            }
            None => {}
        }

        if self.ghosts.iter().any(|g| g.index == at && !g.scared) {
            return self.finish(Outcome::Lost);
        }
        if scared {
            TickOutcome::Scared
        } else {
            TickOutcome::Continue
        }
    }

    /// Advances the ghost at `slot` (its position in [`Game::ghosts`]).
    pub fn ghost_tick(&mut self, slot: usize) -> TickOutcome {
        if !self.flags.running {
            return TickOutcome::Idle;
        }
        let others: Vec<usize> = self
            .ghosts
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != slot)
            .map(|(_, g)| g.index)
            .collect();

        let ghost = &mut self.ghosts[slot];
        ghost.step(&self.maze, |i| others.contains(&i), &mut self.rng);
        let kind = ghost.kind;
        match ghost.touch(self.pacman.index) {
            Contact::Apart => TickOutcome::Continue,
            Contact::Eaten => {
                self.score += GHOST_POINTS;
                debug!(ghost = kind.name(), "ghost eaten");
                TickOutcome::Continue
            }
            Contact::Caught => self.finish(Outcome::Lost),
        }
    }

    pub fn unscare_all(&mut self) {
        if self.ghosts.iter().any(|g| g.scared) {
            debug!("ghosts calm down");
        }
        self.ghosts.iter_mut().for_each(|g| g.scared = false);
    }

    pub fn markers(&self, index: usize) -> MarkerSet {
        let mut set = MarkerSet::default().with(self.maze.classify(index).marker());
        if self.pacman.index == index {
            set.insert(Marker::Player);
        }
        for ghost in self.ghosts.iter().filter(|g| g.index == index) {
            set.insert(Marker::Ghost);
            set.insert(ghost.kind.into());
            if ghost.scared {
                set.insert(Marker::ScaredGhost);
            }
        }
        set
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.maze.width(),
            cells: (0..self.maze.len()).map(|i| self.markers(i)).collect(),
            score: self.score,
            running: self.flags.running,
            notice: self.notice,
            direction: self.pacman.direction,
            turn_pending: self.pacman.turn_pending,
        }
    }

    fn finish(&mut self, outcome: Outcome) -> TickOutcome {
        match outcome {
            Outcome::Won => self.flags.won = true,
            Outcome::Lost => self.flags.lost = true,
        }
        info!(?outcome, score = self.score, "game over");
        self.stop();
        TickOutcome::Finished(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::CellType;
    use rand::SeedableRng;

    fn game(rows: &[&str]) -> Game {
        let layout = Layout::from_ascii(rows).unwrap();
        let mut game = Game::new(layout, StdRng::seed_from_u64(11));
        assert!(game.start());
        game
    }

    #[test]
    fn eating_a_dot_scores_one() {
        let mut game = game(&[
            "#####",
            "#P..#",
            "#...#",
            "#...#",
            "#####",
        ]);
        assert_eq!(game.player_tick(Some(Direction::Right)), TickOutcome::Continue);
        assert_eq!(game.pacman().index, 7);
        assert_eq!(game.score(), 1);
        assert_eq!(game.maze().classify(7), CellType::Empty);
        assert!(game.markers(7).contains(Marker::Player));
        assert!(!game.markers(6).contains(Marker::Player));
    }

    #[test]
    fn last_dot_wins_and_resets() {
        let mut game = game(&["###", "P.#", "###"]);
        assert_eq!(
            game.player_tick(Some(Direction::Right)),
            TickOutcome::Finished(Outcome::Won)
        );
        assert!(!game.is_running());
        assert!(game.flags().won);
        assert_eq!(game.notice(), Some(Outcome::Won));
        assert_eq!(game.score(), 0);
        assert_eq!(game.pacman().index, 3);
        assert_eq!(game.maze().dots_remaining(), 1);
    }

    #[test]
    fn pellet_scares_every_ghost() {
        let mut game = game(&[
            "######",
            "#Po  #",
            "#    #",
            "# b=i#",
            "#    #",
            "######",
        ]);
        assert_eq!(game.player_tick(Some(Direction::Right)), TickOutcome::Scared);
        assert_eq!(game.score(), 10);
        assert!(game.ghosts().iter().all(|g| g.scared));
        game.unscare_all();
        assert!(game.ghosts().iter().all(|g| !g.scared));
    }

    #[test]
    fn walking_into_a_ghost_loses() {
        let mut game = game(&["#####", "#P  #", "#b###", "#####", "#####"]);
        game.ghosts[0].index = 8;
        game.player_tick(Some(Direction::Right));
        assert_eq!(game.pacman().index, 7);
        assert_eq!(
            game.player_tick(Some(Direction::Right)),
            TickOutcome::Finished(Outcome::Lost)
        );
        assert_eq!(game.notice(), Some(Outcome::Lost));
        assert!(!game.is_running());
    }

    #[test]
    fn ghost_walking_into_the_player_loses() {
        let mut game = game(&["#####", "#P b#", "#####", "#####", "#####"]);
        game.ghosts[0].heading = Direction::Left;
        assert_eq!(game.ghost_tick(0), TickOutcome::Continue);
        assert_eq!(game.ghost_tick(0), TickOutcome::Finished(Outcome::Lost));
        assert!(game.flags().lost);
    }

    #[test]
    fn eating_a_scared_ghost_only_resets_that_ghost() {
        let mut game = game(&[
            "######",
            "#oP b#",
            "#    #",
            "#  i #",
            "#    #",
            "######",
        ]);
        game.player_tick(Some(Direction::Left));
        assert_eq!(game.score(), 10);
        game.player_tick(Some(Direction::Right));
        assert_eq!(game.pacman().index, 8);

        game.ghosts[0].heading = Direction::Left;
        game.ghost_tick(0);
        game.ghost_tick(0);
        assert_eq!(game.score(), 10 + GHOST_POINTS);
        assert_eq!(game.ghosts()[0].index, game.ghosts()[0].start);
        assert!(game.ghosts()[0].scared);
        assert!(game.ghosts()[1].scared);
        assert!(game.is_running());
    }

    #[test]
    fn walking_onto_a_scared_ghost_is_harmless() {
        let mut game = game(&["#####", "#Po #", "#b###", "#####", "#####"]);
        assert_eq!(game.player_tick(Some(Direction::Right)), TickOutcome::Scared);
        game.ghosts[0].index = 8;

        assert_eq!(game.player_tick(Some(Direction::Right)), TickOutcome::Continue);
        assert_eq!(game.pacman().index, 8);
        assert!(game.is_running());
        assert_eq!(game.ghosts()[0].index, 8);
        assert!(game.ghosts()[0].scared);
        assert_eq!(game.score(), POWER_PELLET_POINTS);
    }

    #[test]
    fn ghosts_do_not_stack() {
        let mut game = game(&["#####", "#bi #", "#P  #", "#   #", "#####"]);
        game.ghosts[0].heading = Direction::Right;
        game.ghost_tick(0);
        assert_eq!(game.ghosts()[0].index, 6);
    }

    #[test]
    fn stop_restores_everything() {
        let mut game = Game::new(Layout::classic().unwrap(), StdRng::seed_from_u64(5));
        let full = game.maze().dots_remaining();
        for _ in 0..3 {
            game.start();
            for _ in 0..6 {
                game.player_tick(Some(Direction::Right));
                for slot in 0..4 {
                    game.ghost_tick(slot);
                }
            }
            game.stop();
            assert_eq!(game.score(), 0);
            assert_eq!(game.pacman().index, 490);
            assert_eq!(game.maze().dots_remaining(), full);
            for ghost in game.ghosts() {
                assert_eq!(ghost.index, ghost.start);
                assert!(!ghost.scared);
            }
        }
    }

    #[test]
    fn idle_when_stopped() {
        let mut game = Game::new(Layout::classic().unwrap(), StdRng::seed_from_u64(5));
        assert_eq!(game.player_tick(Some(Direction::Right)), TickOutcome::Idle);
        assert_eq!(game.ghost_tick(0), TickOutcome::Idle);
        assert_eq!(game.stop(), None);
    }

    #[test]
    fn snapshot_carries_render_markers() {
        let game = Game::new(Layout::classic().unwrap(), StdRng::seed_from_u64(5));
        let snap = game.snapshot();
        assert_eq!(snap.cells.len(), 784);
        assert_eq!(snap.cells[490].class_names(), vec!["empty", "player"]);
        assert_eq!(snap.cells[348].class_names(), vec!["ghost-lair", "ghost", "blinky"]);
        assert!(!snap.running);
    }
}
