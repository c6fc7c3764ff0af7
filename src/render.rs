use std::io::{self, Stdout, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::QueueableCommand;
use unicode_width::UnicodeWidthStr;

use gesture_pacman::{Marker, MarkerSet, Snapshot};

const CELL_W: usize = 2;

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Ghost,
    Frightened,
    Wall,
    Lair,
    Empty,
    Dot,
    Power,
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

/// Status lines drawn above and below the maze.
pub struct Hud {
    pub top: String,
    pub bottom: String,
}

pub struct Renderer {
    last: Vec<Cell>,
    last_hud: (String, String),
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    pub fn new(cells: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                cells
            ],
            last_hud: (String::new(), String::new()),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }

    pub fn render(&mut self, stdout: &mut Stdout, snap: &Snapshot, hud: &Hud) -> io::Result<()> {
        let width = snap.width;
        let height = snap.cells.len() / width.max(1);
        let needed_h = (height + 2) as u16;
        let needed_w = (width * CELL_W) as u16;

        stdout.queue(MoveTo(0, 0))?;

        let (term_w, term_h) = terminal::size()?;
        if term_w < needed_w || term_h < needed_h {
            stdout.queue(Clear(ClearType::All))?;
            let msg = format!(
                "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
                needed_w, needed_h, term_w, term_h
            );
            stdout.queue(Print(msg))?;
            stdout.flush()?;
            self.needs_full = true;
            return Ok(());
        }

        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + 1;
        if origin_x != self.origin_x || origin_y != self.origin_y {
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
            stdout.queue(Clear(ClearType::All))?;
        }

        if self.needs_full || hud.top != self.last_hud.0 {
            self.status_line(stdout, self.origin_y - 1, &hud.top, Color::White)?;
        }
        if self.needs_full || hud.bottom != self.last_hud.1 {
            let color = if snap.notice.is_some() {
                Color::Yellow
            } else {
                Color::DarkGrey
            };
            self.status_line(stdout, self.origin_y + height as u16, &hud.bottom, color)?;
        }
        self.last_hud = (hud.top.clone(), hud.bottom.clone());

        for (idx, marks) in snap.cells.iter().enumerate() {
            let cell = cell_for(*marks);
            if self.needs_full || self.last.get(idx) != Some(&cell) {
                if let Some(slot) = self.last.get_mut(idx) {
                    *slot = cell;
                }
                self.draw_cell(stdout, idx % width, idx / width, cell)?;
            }
        }
        self.needs_full = false;

        stdout.flush()?;
        Ok(())
    }

    fn status_line(&self, stdout: &mut Stdout, y: u16, text: &str, color: Color) -> io::Result<()> {
        stdout.queue(MoveTo(self.origin_x, y))?;
        stdout.queue(SetForegroundColor(color))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(text))?;
        stdout.queue(ResetColor)?;
        Ok(())
    }

    fn draw_cell(&self, stdout: &mut Stdout, x: usize, y: usize, cell: Cell) -> io::Result<()> {
        let text = match cell.glyph {
            Glyph::Player => "😃",
            Glyph::Ghost => "👻",
            Glyph::Frightened => "😱",
            Glyph::Wall => "██",
            Glyph::Lair => "░░",
            Glyph::Empty => "  ",
            Glyph::Dot => "· ",
            Glyph::Power => "● ",
        };
        let x_pos = self.origin_x + (x * CELL_W) as u16;
        let y_pos = self.origin_y + y as u16;
        stdout.queue(MoveTo(x_pos, y_pos))?;
        stdout.queue(SetForegroundColor(cell.color))?;
        stdout.queue(Print(text))?;
        let w = UnicodeWidthStr::width(text);
        if w < CELL_W {
            for _ in 0..(CELL_W - w) {
                stdout.queue(Print(' '))?;
            }
        }
        stdout.queue(ResetColor)?;
        Ok(())
    }
}

fn cell_for(marks: MarkerSet) -> Cell {
    if marks.contains(Marker::Player) {
        return Cell {
            glyph: Glyph::Player,
            color: Color::Yellow,
        };
    }
    if marks.contains(Marker::Ghost) {
        if marks.contains(Marker::ScaredGhost) {
            return Cell {
                glyph: Glyph::Frightened,
                color: Color::Blue,
            };
        }
        let color = if marks.contains(Marker::Blinky) {
            Color::Red
        } else if marks.contains(Marker::Pinky) {
            Color::Magenta
        } else if marks.contains(Marker::Inky) {
            Color::Cyan
        } else {
            Color::DarkYellow
        };
        return Cell {
            glyph: Glyph::Ghost,
            color,
        };
    }
    let (glyph, color) = if marks.contains(Marker::Wall) {
        (Glyph::Wall, Color::Blue)
    } else if marks.contains(Marker::GhostLair) {
        (Glyph::Lair, Color::DarkBlue)
    } else if marks.contains(Marker::Dot) {
        (Glyph::Dot, Color::White)
    } else if marks.contains(Marker::PowerPellet) {
        (Glyph::Power, Color::Magenta)
    } else {
        (Glyph::Empty, Color::Reset)
    };
    Cell { glyph, color }
}
