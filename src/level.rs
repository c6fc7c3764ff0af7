use crate::components::{Marker, PelletKind};
use crate::error::{Error, Result};
use crate::ghost::GhostKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    Dot,
    Wall,
    GhostLair,
    PowerPellet,
    Empty,
}

impl CellType {
    pub fn marker(self) -> Marker {
        match self {
            CellType::Dot => Marker::Dot,
            CellType::Wall => Marker::Wall,
            CellType::GhostLair => Marker::GhostLair,
            CellType::PowerPellet => Marker::PowerPellet,
            CellType::Empty => Marker::Empty,
        }
    }

    pub fn is_passable(self) -> bool {
        !matches!(self, CellType::Wall | CellType::GhostLair)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostSpawn {
    pub kind: GhostKind,
    pub index: usize,
}

/// A tunnel: leaving `left` through the west edge lands on `right`, and
/// leaving `right` through the east edge lands on `left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Portal {
    pub left: usize,
    pub right: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub width: usize,
    pub cells: Vec<CellType>,
    pub player_start: usize,
    pub ghost_starts: Vec<GhostSpawn>,
    pub portals: Vec<Portal>,
}

// Legend:  '#'=wall  '.'=dot  'o'=power pellet  '='=ghost lair  ' '=empty
//          'P'=player start (empty)  'b' 'p' 'i' 'c'=ghost starts (lair)
const CLASSIC: [&str; 28] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##############.####.#",
    "#.####.##############.####.#",
    "#............##............#",
    "######.#####.##.#####.######",
    "######.##          ##.######",
    "######.## ###==### ##.######",
    "######.## #=b==i=# ##.######",
    "      ... #=p==c=# ...      ",
    "######.## #======# ##.######",
    "######.## ######## ##.######",
    "######.## ######## ##.######",
    "#........     P    ........#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##................##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

impl Layout {
    /// The 28x28 maze the game ships with.
    pub fn classic() -> Result<Self> {
        Self::from_ascii(&CLASSIC)
    }

    pub fn from_ascii<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let height = rows.len();
        if height == 0 {
            return Err(Error::Layout("maze has no rows".into()));
        }
        let width = rows[0].as_ref().chars().count();
        if width != height {
            return Err(Error::Layout(format!(
                "maze must be square, got {width} columns and {height} rows"
            )));
        }

        let mut cells = Vec::with_capacity(width * height);
        let mut player_start = None;
        let mut ghost_starts: Vec<GhostSpawn> = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(Error::Layout(format!("row {y} is not {width} wide")));
            }
            for (x, ch) in row.chars().enumerate() {
                let index = y * width + x;
                let cell = match ch {
                    '#' => CellType::Wall,
                    '.' => CellType::Dot,
                    'o' => CellType::PowerPellet,
                    '=' => CellType::GhostLair,
                    ' ' => CellType::Empty,
                    'P' => {
                        if player_start.replace(index).is_some() {
                            return Err(Error::Layout("more than one player start".into()));
                        }
                        CellType::Empty
                    }
                    'b' | 'p' | 'i' | 'c' => {
                        let kind = match ch {
                            'b' => GhostKind::Blinky,
                            'p' => GhostKind::Pinky,
                            'i' => GhostKind::Inky,
                            _ => GhostKind::Clyde,
                        };
                        if ghost_starts.iter().any(|g| g.kind == kind) {
                            return Err(Error::Layout(format!("{} placed twice", kind.name())));
                        }
                        ghost_starts.push(GhostSpawn { kind, index });
                        CellType::GhostLair
                    }
                    other => {
                        return Err(Error::Layout(format!(
                            "unknown cell {other:?} at row {y}, column {x}"
                        )))
                    }
                };
                cells.push(cell);
            }
        }

        let player_start =
            player_start.ok_or_else(|| Error::Layout("no player start".into()))?;
        ghost_starts.sort_by_key(|g| g.kind);

        let portals = (0..height)
            .map(|y| Portal {
                left: y * width,
                right: y * width + width - 1,
            })
            .filter(|p| cells[p.left].is_passable() && cells[p.right].is_passable())
            .collect();

        Ok(Layout {
            width,
            cells,
            player_start,
            ghost_starts,
            portals,
        })
    }
}

/// The live maze: cell types, with dots and pellets turning `Empty` as they
/// get eaten.
#[derive(Debug, Clone)]
pub struct Maze {
    width: usize,
    cells: Vec<CellType>,
    portals: Vec<Portal>,
    dots_left: usize,
}

impl Maze {
    pub fn build(layout: &Layout) -> Self {
        let dots_left = layout.cells.iter().filter(|c| **c == CellType::Dot).count();
        Self {
            width: layout.width,
            cells: layout.cells.clone(),
            portals: layout.portals.clone(),
            dots_left,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn classify(&self, index: usize) -> CellType {
        self.cells[index]
    }

    pub fn is_passable(&self, index: usize) -> bool {
        self.cells[index].is_passable()
    }

    /// Eats whatever sits on `index`. Calling it again is a no-op.
    pub fn consume(&mut self, index: usize) -> Option<PelletKind> {
        let eaten = match self.cells[index] {
            CellType::Dot => {
                self.dots_left -= 1;
                PelletKind::Normal
            }
            CellType::PowerPellet => PelletKind::Power,
            _ => return None,
        };
        self.cells[index] = CellType::Empty;
        Some(eaten)
    }

    pub fn dots_remaining(&self) -> usize {
        self.dots_left
    }

    pub fn count(&self, kind: CellType) -> usize {
        self.cells.iter().filter(|c| **c == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_layout_cell_table() {
        let layout = Layout::classic().unwrap();
        assert_eq!(layout.width, 28);
        assert_eq!(layout.cells.len(), 28 * 28);
        assert_eq!(layout.player_start, 490);
        let starts: Vec<(GhostKind, usize)> =
            layout.ghost_starts.iter().map(|g| (g.kind, g.index)).collect();
        assert_eq!(
            starts,
            vec![
                (GhostKind::Blinky, 348),
                (GhostKind::Pinky, 376),
                (GhostKind::Inky, 351),
                (GhostKind::Clyde, 379),
            ]
        );
        assert_eq!(layout.portals, vec![Portal { left: 364, right: 391 }]);
    }

    #[test]
    fn classic_maze_counts() {
        let maze = Maze::build(&Layout::classic().unwrap());
        assert_eq!(maze.len(), 28 * 28);
        assert!(!maze.is_empty());
        assert_eq!(maze.count(CellType::PowerPellet), 4);
        assert_eq!(maze.dots_remaining(), maze.count(CellType::Dot));
        assert!(maze.dots_remaining() > 200);
    }

    #[test]
    fn passability_excludes_walls_and_lair() {
        let maze = Maze::build(&Layout::classic().unwrap());
        assert!(!maze.is_passable(0));
        assert!(!maze.is_passable(348));
        assert!(maze.is_passable(29));
        assert!(maze.is_passable(490));
        assert_eq!(maze.classify(29), CellType::Dot);
        assert_eq!(maze.classify(85), CellType::PowerPellet);
    }

    #[test]
    fn consume_is_idempotent() {
        let mut maze = Maze::build(&Layout::classic().unwrap());
        let before = maze.dots_remaining();
        assert_eq!(maze.consume(29), Some(PelletKind::Normal));
        assert_eq!(maze.consume(29), None);
        assert_eq!(maze.classify(29), CellType::Empty);
        assert_eq!(maze.dots_remaining(), before - 1);

        assert_eq!(maze.consume(85), Some(PelletKind::Power));
        assert_eq!(maze.consume(85), None);
        assert_eq!(maze.dots_remaining(), before - 1);
        assert_eq!(maze.consume(0), None);
    }

    #[test]
    fn rejects_malformed_drawings() {
        assert!(Layout::from_ascii(&["#P", "##", "##"]).is_err());
        assert!(Layout::from_ascii(&["#.", ".."]).is_err());
        assert!(Layout::from_ascii(&["PP", ".."]).is_err());
        assert!(Layout::from_ascii(&["Px", ".."]).is_err());
        assert!(Layout::from_ascii(&["Pbb", "...", "..."]).is_err());
        assert!(Layout::from_ascii::<&str>(&[]).is_err());
    }

    #[test]
    fn open_rows_become_portals() {
        let layout = Layout::from_ascii(&["###", "P .", "###"]).unwrap();
        assert_eq!(layout.portals, vec![Portal { left: 3, right: 5 }]);
        assert!(layout.ghost_starts.is_empty());
    }
}
