use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use nonogram_core::{Cell, MarkState};

/// Draws the grid with ANSI escape sequences.
///
/// Row focus and marks sit in the two columns right of the grid, column focus
/// and marks in the two lines below it.
pub struct TerminalDisplay {
    out: Box<dyn Write>,
    width: usize,
    height: usize,
}

fn glyph(cell: Cell) -> char {
    match cell {
        Cell::Blank => ' ',
        Cell::Dot => '-',
        Cell::Solid => '#',
        Cell::Unknown => '?',
    }
}

fn mark_digit(mark: MarkState) -> char {
    char::from(b'0' + mark.code())
}

fn coord(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

impl TerminalDisplay {
    pub fn new(out: Box<dyn Write>, width: usize, height: usize) -> Self {
        Self { out, width, height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        self.out.flush()
    }

    pub fn move_cursor(&mut self, x: usize, y: usize) -> io::Result<()> {
        queue!(self.out, MoveTo(coord(x), coord(y)))
    }

    pub fn paint_cell(&mut self, x: usize, y: usize, cell: Cell) -> io::Result<()> {
        self.put(x, y, glyph(cell))
    }

    pub fn focus_row(&mut self, row: usize, active: bool) -> io::Result<()> {
        self.put(self.width + 1, row, if active { '!' } else { ' ' })?;
        self.rest_cursor()
    }

    pub fn focus_column(&mut self, column: usize, active: bool) -> io::Result<()> {
        self.put(column, self.height + 1, if active { '!' } else { ' ' })?;
        self.rest_cursor()
    }

    pub fn mark_row(&mut self, row: usize, mark: MarkState) -> io::Result<()> {
        self.put(self.width + 2, row, mark_digit(mark))
    }

    pub fn mark_column(&mut self, column: usize, mark: MarkState) -> io::Result<()> {
        self.put(column, self.height + 2, mark_digit(mark))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn put(&mut self, x: usize, y: usize, c: char) -> io::Result<()> {
        queue!(self.out, MoveTo(coord(x), coord(y)), Print(c))
    }

    // Out of the way of the grid and the column marks
    fn rest_cursor(&mut self) -> io::Result<()> {
        self.move_cursor(1, self.height + 3)
    }
}
