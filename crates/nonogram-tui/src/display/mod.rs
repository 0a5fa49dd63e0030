//! Live progress rendering.
//!
//! A [`Display`] mirrors the engine's grid and row/column marks as the search
//! runs. Which backend draws is fixed when the session starts.

mod plotter;
mod terminal;

use std::io::{self, Write};
use std::ops::Range;

use nonogram_core::{Cell, Grid, InvariantViolation, MarkState, Rect};

use crate::config::DisplayKind;

pub use plotter::{PlotterDisplay, PlotterGeometry};
pub use terminal::TerminalDisplay;

/// Rendering failure
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum DisplayError {
    #[display("display output failed: {_0}")]
    Io(#[from] io::Error),
    #[display("{_0}")]
    Invariant(#[from] InvariantViolation),
}

fn check_cell(x: usize, y: usize, width: usize, height: usize) -> Result<(), InvariantViolation> {
    if x >= width || y >= height {
        return Err(InvariantViolation::OutOfBounds { x, y, width, height });
    }
    Ok(())
}

fn check_line(index: usize, len: usize) -> Result<(), InvariantViolation> {
    if index >= len {
        return Err(InvariantViolation::LineOutOfBounds { index, len });
    }
    Ok(())
}

/// The display backend selected for a session
pub enum Display {
    Terminal(TerminalDisplay),
    Plotter(PlotterDisplay),
    /// Accepts every call and draws nothing
    Null { width: usize, height: usize },
}

impl Display {
    /// Build the backend for `kind`, drawing to `out`.
    ///
    /// Returns `None` when the display is off, in which case no display call
    /// is ever made.
    pub fn open(
        kind: DisplayKind,
        width: usize,
        height: usize,
        out: Box<dyn Write>,
    ) -> Option<Self> {
        match kind {
            DisplayKind::Off => None,
            DisplayKind::Terminal => {
                Some(Display::Terminal(TerminalDisplay::new(out, width, height)))
            }
            DisplayKind::Plotter => Some(Display::Plotter(PlotterDisplay::new(
                out,
                width,
                height,
                PlotterGeometry::default(),
            ))),
            DisplayKind::Null => Some(Display::Null { width, height }),
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Display::Terminal(t) => t.width(),
            Display::Plotter(p) => p.width(),
            Display::Null { width, .. } => *width,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Display::Terminal(t) => t.height(),
            Display::Plotter(p) => p.height(),
            Display::Null { height, .. } => *height,
        }
    }

    pub fn clear(&mut self) -> Result<(), DisplayError> {
        match self {
            Display::Terminal(t) => t.clear()?,
            Display::Plotter(p) => p.clear()?,
            Display::Null { .. } => {}
        }
        Ok(())
    }

    pub fn move_cursor(&mut self, x: usize, y: usize) -> Result<(), DisplayError> {
        match self {
            Display::Terminal(t) => t.move_cursor(x, y)?,
            Display::Plotter(p) => p.move_cursor(x, y)?,
            Display::Null { .. } => {}
        }
        Ok(())
    }

    /// Leave the cursor below everything the display draws
    pub fn park_cursor(&mut self) -> Result<(), DisplayError> {
        let below = self.height() + 6;
        self.move_cursor(0, below)?;
        self.flush()
    }

    pub fn paint_cell(&mut self, x: usize, y: usize, cell: Cell) -> Result<(), DisplayError> {
        check_cell(x, y, self.width(), self.height())?;
        match self {
            Display::Terminal(t) => t.paint_cell(x, y, cell)?,
            Display::Plotter(p) => p.paint_cell(x, y, cell)?,
            Display::Null { .. } => {}
        }
        Ok(())
    }

    /// Repaint every cell of `area` from `grid`
    pub fn paint_area(&mut self, grid: &Grid, area: Rect) -> Result<(), DisplayError> {
        for (x, y) in area.cells() {
            let cell = grid.get(x, y)?;
            self.paint_cell(x, y, cell)?;
        }
        self.flush()
    }

    pub fn focus_row(&mut self, row: usize, active: bool) -> Result<(), DisplayError> {
        check_line(row, self.height())?;
        match self {
            Display::Terminal(t) => t.focus_row(row, active)?,
            Display::Plotter(p) => p.focus_row(row, active)?,
            Display::Null { .. } => {}
        }
        self.flush()
    }

    pub fn focus_column(&mut self, column: usize, active: bool) -> Result<(), DisplayError> {
        check_line(column, self.width())?;
        match self {
            Display::Terminal(t) => t.focus_column(column, active)?,
            Display::Plotter(p) => p.focus_column(column, active)?,
            Display::Null { .. } => {}
        }
        self.flush()
    }

    pub fn mark_row(&mut self, row: usize, mark: MarkState) -> Result<(), DisplayError> {
        check_line(row, self.height())?;
        match self {
            Display::Terminal(t) => t.mark_row(row, mark)?,
            Display::Plotter(p) => p.mark_row(row, mark)?,
            Display::Null { .. } => {}
        }
        Ok(())
    }

    pub fn mark_column(&mut self, column: usize, mark: MarkState) -> Result<(), DisplayError> {
        check_line(column, self.width())?;
        match self {
            Display::Terminal(t) => t.mark_column(column, mark)?,
            Display::Plotter(p) => p.mark_column(column, mark)?,
            Display::Null { .. } => {}
        }
        Ok(())
    }

    /// Redraw the marks of the rows in `rows`, looking each one up
    pub fn mark_row_range(
        &mut self,
        rows: Range<usize>,
        mut mark_of: impl FnMut(usize) -> MarkState,
    ) -> Result<(), DisplayError> {
        for row in rows {
            self.mark_row(row, mark_of(row))?;
        }
        self.flush()
    }

    pub fn mark_column_range(
        &mut self,
        columns: Range<usize>,
        mut mark_of: impl FnMut(usize) -> MarkState,
    ) -> Result<(), DisplayError> {
        for column in columns {
            self.mark_column(column, mark_of(column))?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), DisplayError> {
        match self {
            Display::Terminal(t) => t.flush()?,
            Display::Plotter(p) => p.flush()?,
            Display::Null { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nonogram_core::testing::SharedBuffer;

    fn terminal(width: usize, height: usize) -> (Display, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let display = Display::open(DisplayKind::Terminal, width, height, Box::new(buffer.clone()))
            .expect("terminal display");
        (display, buffer)
    }

    #[test]
    fn test_off_builds_nothing() {
        assert!(Display::open(DisplayKind::Off, 3, 3, Box::new(SharedBuffer::new())).is_none());
    }

    #[test]
    fn test_paint_out_of_bounds_is_violation() {
        let (mut display, buffer) = terminal(3, 2);
        let err = display.paint_cell(3, 0, Cell::Solid).unwrap_err();
        assert!(matches!(
            err,
            DisplayError::Invariant(InvariantViolation::OutOfBounds { x: 3, .. })
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_mark_range_queries_each_line() {
        let (mut display, buffer) = terminal(2, 3);
        let mut seen = Vec::new();
        display
            .mark_row_range(0..3, |row| {
                seen.push(row);
                MarkState::Done
            })
            .unwrap();
        assert_eq!(seen, vec![0, 1, 2]);
        assert!(buffer.contents().contains("\x1b[3;5H2"));
    }

    #[test]
    fn test_focus_line_out_of_range() {
        let (mut display, _) = terminal(2, 3);
        assert!(matches!(
            display.focus_column(2, true),
            Err(DisplayError::Invariant(InvariantViolation::LineOutOfBounds { index: 2, len: 2 }))
        ));
    }

    #[test]
    fn test_null_display_accepts_everything() {
        let mut display =
            Display::open(DisplayKind::Null, 2, 2, Box::new(SharedBuffer::new())).unwrap();
        display.clear().unwrap();
        display.paint_cell(1, 1, Cell::Dot).unwrap();
        display.park_cursor().unwrap();
    }
}
