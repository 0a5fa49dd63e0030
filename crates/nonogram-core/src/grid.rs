use crate::{Cell, InvalidGrid, InvariantViolation};

/// Half-open rectangle of cells, `min` inclusive and `max` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Rect {
    pub fn new(min_x: usize, min_y: usize, max_x: usize, max_y: usize) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A single row of a grid of the given width
    pub fn row(y: usize, width: usize) -> Self {
        Self::new(0, y, width, y + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    /// Cell coordinates in column-major order, matching how displays paint them
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.min_x..self.max_x).flat_map(move |x| (self.min_y..self.max_y).map(move |y| (x, y)))
    }
}

/// The width x height cell buffer an engine works on.
///
/// Cells are stored row-major, `col + row * width`. The buffer length always
/// equals `width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid with every cell unknown
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Unknown; width * height],
        }
    }

    /// Adopt an existing buffer, rejecting it unless it holds exactly
    /// `width * height` cells
    pub fn from_buffer(width: usize, height: usize, cells: Vec<Cell>) -> Result<Self, InvalidGrid> {
        let expected = width * height;
        if cells.len() != expected {
            return Err(InvalidGrid {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mutable view of the whole buffer; its length cannot change
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Release the buffer
    pub fn into_buffer(self) -> Vec<Cell> {
        self.cells
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    fn index(&self, x: usize, y: usize) -> Result<usize, InvariantViolation> {
        if x >= self.width || y >= self.height {
            return Err(InvariantViolation::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(x + y * self.width)
    }

    pub fn get(&self, x: usize, y: usize) -> Result<Cell, InvariantViolation> {
        self.index(x, y).map(|i| self.cells[i])
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> Result<(), InvariantViolation> {
        let i = self.index(x, y)?;
        self.cells[i] = cell;
        Ok(())
    }

    /// Cells of one row; panics if `y` is out of range
    pub fn row(&self, y: usize) -> &[Cell] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [Cell] {
        &mut self.cells[y * self.width..(y + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        // chunks() rejects a zero chunk size
        self.cells.chunks(self.width.max(1)).take(self.height)
    }

    pub fn column(&self, x: usize) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).map(move |y| self.cells[x + y * self.width])
    }

    /// Reset every cell to unknown
    pub fn clear(&mut self) {
        self.cells.fill(Cell::Unknown);
    }

    pub fn unknown_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_known()).count()
    }
}

/// Run-length clue of a line: lengths of consecutive solid groups
pub fn line_clue(line: impl IntoIterator<Item = Cell>) -> Vec<usize> {
    let mut clue = Vec::new();
    let mut run = 0;
    for cell in line {
        if cell == Cell::Solid {
            run += 1;
        } else if run > 0 {
            clue.push(run);
            run = 0;
        }
    }
    if run > 0 {
        clue.push(run);
    }
    clue
}
