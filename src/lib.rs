//! Pac-Man steered by hand gestures.
//!
//! A recognizer service is polled for the latest direction label; the
//! player turns when the label allows it and otherwise keeps going. Ghosts
//! random-walk on their own timers.

pub mod components;
pub mod config;
pub mod error;
pub mod game;
pub mod ghost;
pub mod level;
pub mod movement;
pub mod player;
pub mod remote;
pub mod session;

pub use components::{Direction, Marker, MarkerSet};
pub use config::Config;
pub use error::{Error, Result};
pub use game::{Game, Outcome, Snapshot, TickOutcome};
pub use level::{Layout, Maze};
pub use session::{Session, Transition};
