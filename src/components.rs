use std::fmt;

use crate::ghost::GhostKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Down,
        Direction::Up,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the player swallowed on a cell.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PelletKind {
    Normal,
    Power,
}

/// Semantic render markers. A front-end only needs to reflect which of
/// these sit on each cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Dot,
    Wall,
    GhostLair,
    PowerPellet,
    Empty,
    Player,
    Ghost,
    ScaredGhost,
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl Marker {
    pub fn class_name(self) -> &'static str {
        match self {
            Marker::Dot => "dot",
            Marker::Wall => "wall",
            Marker::GhostLair => "ghost-lair",
            Marker::PowerPellet => "power-pellet",
            Marker::Empty => "empty",
            Marker::Player => "player",
            Marker::Ghost => "ghost",
            Marker::ScaredGhost => "scared-ghost",
            Marker::Blinky => "blinky",
            Marker::Pinky => "pinky",
            Marker::Inky => "inky",
            Marker::Clyde => "clyde",
        }
    }

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl From<GhostKind> for Marker {
    fn from(kind: GhostKind) -> Self {
        match kind {
            GhostKind::Blinky => Marker::Blinky,
            GhostKind::Pinky => Marker::Pinky,
            GhostKind::Inky => Marker::Inky,
            GhostKind::Clyde => Marker::Clyde,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerSet(u16);

impl MarkerSet {
    pub fn with(mut self, marker: Marker) -> Self {
        self.insert(marker);
        self
    }

    pub fn insert(&mut self, marker: Marker) {
        self.0 |= marker.bit();
    }

    pub fn remove(&mut self, marker: Marker) {
        self.0 &= !marker.bit();
    }

    pub fn contains(self, marker: Marker) -> bool {
        self.0 & marker.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn class_names(self) -> Vec<&'static str> {
        ALL_MARKERS
            .iter()
            .filter(|m| self.contains(**m))
            .map(|m| m.class_name())
            .collect()
    }
}

const ALL_MARKERS: [Marker; 12] = [
    Marker::Dot,
    Marker::Wall,
    Marker::GhostLair,
    Marker::PowerPellet,
    Marker::Empty,
    Marker::Player,
    Marker::Ghost,
    Marker::ScaredGhost,
    Marker::Blinky,
    Marker::Pinky,
    Marker::Inky,
    Marker::Clyde,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_set_tracks_membership() {
        let mut set = MarkerSet::default().with(Marker::Ghost).with(Marker::Inky);
        assert!(set.contains(Marker::Ghost));
        assert!(!set.contains(Marker::Player));
        set.remove(Marker::Ghost);
        assert_eq!(set.class_names(), vec!["inky"]);
    }
}
