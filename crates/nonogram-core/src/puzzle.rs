use serde::{Deserialize, Serialize};

use crate::grid::line_clue;
use crate::{Cell, Grid, NoteError, Notes, PuzzleError, PuzzleLoadError};

/// Run-length sequence describing the solid groups of one line
pub type Clue = Vec<usize>;

/// A nonogram: dimensions, row and column clues, an optional title and notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    width: usize,
    height: usize,
    rows: Vec<Clue>,
    columns: Vec<Clue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Notes::is_empty")]
    notes: Notes,
}

/// Cells a clue occupies at minimum, counting one gap between groups.
///
/// `None` when the count does not fit in a `usize`.
pub(crate) fn min_len(clue: &[usize]) -> Option<usize> {
    let gaps = clue.len().saturating_sub(1);
    clue.iter().try_fold(gaps, |acc, &run| acc.checked_add(run))
}

impl Puzzle {
    /// Build a puzzle from clues, checking that they agree with each other
    pub fn new(rows: Vec<Clue>, columns: Vec<Clue>) -> Result<Self, PuzzleError> {
        let puzzle = Self {
            width: columns.len(),
            height: rows.len(),
            rows,
            columns,
            title: None,
            notes: Notes::new(),
        };
        puzzle.validate()?;
        Ok(puzzle)
    }

    /// Derive the clues of a fully decided picture.
    ///
    /// Any unknown cell makes the picture incomplete.
    pub fn from_grid(grid: &Grid) -> Result<Self, PuzzleLoadError> {
        let unknown = grid.unknown_count();
        if unknown > 0 {
            return Err(PuzzleLoadError::IncompleteGrid { unknown });
        }
        let rows = grid.rows().map(|row| line_clue(row.iter().copied())).collect();
        let columns = (0..grid.width()).map(|x| line_clue(grid.column(x))).collect();
        Ok(Self::new(rows, columns)?)
    }

    /// Check dimensions and that every clue fits its line
    pub fn validate(&self) -> Result<(), PuzzleError> {
        if self.width == 0 || self.height == 0 {
            return Err(PuzzleError::EmptyDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.rows.len() != self.height {
            return Err(PuzzleError::RowCount {
                expected: self.height,
                found: self.rows.len(),
            });
        }
        if self.columns.len() != self.width {
            return Err(PuzzleError::ColumnCount {
                expected: self.width,
                found: self.columns.len(),
            });
        }
        for (index, clue) in self.rows.iter().enumerate() {
            let needed = min_len(clue).ok_or(PuzzleError::ClueTooLarge { axis: "row", index })?;
            if needed > self.width {
                return Err(PuzzleError::RowOverflow {
                    index,
                    needed,
                    len: self.width,
                });
            }
        }
        for (index, clue) in self.columns.iter().enumerate() {
            let needed = min_len(clue).ok_or(PuzzleError::ClueTooLarge {
                axis: "column",
                index,
            })?;
            if needed > self.height {
                return Err(PuzzleError::ColumnOverflow {
                    index,
                    needed,
                    len: self.height,
                });
            }
        }
        Ok(())
    }

    /// Solid cells demanded by the rows minus those demanded by the columns.
    ///
    /// Positive means row-heavy, negative column-heavy. Any non-zero value
    /// means the puzzle cannot have a solution.
    pub fn imbalance(&self) -> i64 {
        let total = |clues: &[Clue]| {
            let sum = clues.iter().flatten().fold(0usize, |acc, &run| acc.saturating_add(run));
            i64::try_from(sum).unwrap_or(i64::MAX)
        };
        total(&self.rows).saturating_sub(total(&self.columns))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn row_clue(&self, y: usize) -> &[usize] {
        &self.rows[y]
    }

    pub fn column_clue(&self, x: usize) -> &[usize] {
        &self.columns[x]
    }

    pub fn row_clues(&self) -> &[Clue] {
        &self.rows
    }

    pub fn column_clues(&self) -> &[Clue] {
        &self.columns
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn notes(&self) -> &Notes {
        &self.notes
    }

    /// Look up a note by name
    pub fn note(&self, name: &str) -> Result<&str, NoteError> {
        self.notes.get(name)
    }

    /// See [`Notes::set`]
    pub fn set_note(&mut self, name: &str, value: &str, safe: bool) -> Result<(), NoteError> {
        self.notes.set(name, value, safe)
    }

    pub fn unset_note(&mut self, name: &str) -> Result<String, NoteError> {
        self.notes.unset(name)
    }

    /// An empty grid buffer sized for this puzzle
    pub fn blank_grid(&self) -> Grid {
        Grid::new(self.width, self.height)
    }

    /// Whether a decided grid satisfies every clue
    pub fn is_solved_by(&self, grid: &Grid) -> bool {
        grid.width() == self.width
            && grid.height() == self.height
            && grid.cells().iter().all(|c| *c != Cell::Unknown)
            && grid
                .rows()
                .zip(&self.rows)
                .all(|(row, clue)| line_clue(row.iter().copied()) == *clue)
            && (0..self.width).all(|x| line_clue(grid.column(x)) == self.columns[x])
    }
}
