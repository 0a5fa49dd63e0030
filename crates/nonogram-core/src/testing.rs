//! Test utilities for code that drives an [`Engine`].
//!
//! [`ScriptedEngine`] replays a fixed list of solutions, one per step, and
//! records how it was driven so tests can assert on sequencing.
//! [`SharedBuffer`] is an in-memory writer that stays readable after being
//! handed to a display or sink.
//!
//! # Example
//!
//! ```
//! use nonogram_core::testing::ScriptedEngine;
//! use nonogram_core::{Cell, Engine, Grid, Puzzle, SolutionClient, StepStatus};
//!
//! struct Count(usize);
//! impl SolutionClient for Count {
//!     fn on_solution(&mut self, _: &Grid) { self.0 += 1; }
//! }
//!
//! let puzzle = Puzzle::new(vec![vec![1]], vec![vec![1]]).unwrap();
//! let mut engine = ScriptedEngine::repeating(3, vec![Cell::Solid]);
//! let mut grid = puzzle.blank_grid();
//! let mut count = Count(0);
//! engine.load(&puzzle, &mut grid);
//! while engine.step(&mut grid, &mut count, None) == StepStatus::Working {}
//! assert_eq!(count.0, 3);
//! assert_eq!(engine.steps(), 4);
//! ```

use std::cell::{Cell as Counter, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

use crate::{
    Cell, Engine, Grid, MarkDelta, MarkState, ProgressObserver, Puzzle, SolutionClient, StepStatus,
};

/// Engine that reports a scripted sequence of solutions
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    solutions: Vec<Vec<Cell>>,
    next: usize,
    width: usize,
    height: usize,
    loaded: bool,
    steps: usize,
    progress_offered: usize,
    mark_queries: Counter<usize>,
    delta: MarkDelta,
}

impl ScriptedEngine {
    /// Report each buffer as a solution, in order, one per step
    pub fn new(solutions: Vec<Vec<Cell>>) -> Self {
        Self {
            solutions,
            ..Self::default()
        }
    }

    /// Report the same solution `count` times
    pub fn repeating(count: usize, solution: Vec<Cell>) -> Self {
        Self::new(vec![solution; count])
    }

    /// Number of times `step` was called
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of steps that were given a progress observer
    pub fn progress_offered(&self) -> usize {
        self.progress_offered
    }

    /// Number of row or column mark lookups
    pub fn mark_queries(&self) -> usize {
        self.mark_queries.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn mark(&self) -> MarkState {
        self.mark_queries.set(self.mark_queries.get() + 1);
        if self.next == 0 {
            MarkState::Off
        } else {
            MarkState::Done
        }
    }
}

impl Engine for ScriptedEngine {
    fn load(&mut self, puzzle: &Puzzle, grid: &mut Grid) {
        self.width = puzzle.width();
        self.height = puzzle.height();
        self.next = 0;
        self.loaded = true;
        grid.clear();
    }

    fn step(
        &mut self,
        grid: &mut Grid,
        client: &mut dyn SolutionClient,
        progress: Option<&mut dyn ProgressObserver>,
    ) -> StepStatus {
        self.steps += 1;
        let Some(solution) = self.solutions.get(self.next) else {
            return StepStatus::Finished;
        };
        for (cell, value) in grid.cells_mut().iter_mut().zip(solution) {
            *cell = *value;
        }
        if let Some(observer) = progress {
            self.progress_offered += 1;
            let area = grid.bounds();
            observer.cells_changed(grid, area);
        }
        self.next += 1;
        self.delta = MarkDelta {
            rows: 0..self.height,
            columns: 0..self.width,
        };
        client.on_solution(grid);
        StepStatus::Working
    }

    fn row_mark(&self, _row: usize) -> MarkState {
        self.mark()
    }

    fn column_mark(&self, _column: usize) -> MarkState {
        self.mark()
    }

    fn take_mark_delta(&mut self) -> MarkDelta {
        std::mem::take(&mut self.delta)
    }
}

/// Cloneable in-memory writer; every clone appends to the same bytes
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer whose every write fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "writer closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "writer closed"))
    }
}
