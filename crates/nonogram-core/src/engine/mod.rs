//! Contract between a driver and an incremental solving engine.
//!
//! An engine is an opaque stepping machine. The driver loads a puzzle into it,
//! then calls [`Engine::step`] repeatedly; each call performs one bounded unit
//! of work on the driver-owned grid buffer and may call back into the driver:
//!
//! - [`SolutionClient::on_solution`] whenever the grid holds a complete
//!   solution,
//! - [`ProgressObserver`] methods as cells change or lines gain focus, but only
//!   when the driver passed an observer for that step.
//!
//! Both callbacks run synchronously inside `step`. The grid is mutated only by
//! the engine during a step and only read by the callbacks, so no locking is
//! involved. Keep it that way if a driver ever runs on a multi-threaded
//! runtime: the ordering of calls is the only synchronisation.

mod backtrack;

use std::ops::Range;

pub use backtrack::BacktrackEngine;

use crate::{Grid, MarkState, Puzzle, Rect};

/// Outcome of one unit of engine work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// More work remains
    Working,
    /// The search space is exhausted
    Finished,
}

/// Receives complete solutions
pub trait SolutionClient {
    fn on_solution(&mut self, grid: &Grid);
}

/// Receives progress events while a step runs
pub trait ProgressObserver {
    /// Cells inside `area` changed
    fn cells_changed(&mut self, grid: &Grid, area: Rect);

    /// The engine started or stopped working on a row
    fn row_focus(&mut self, row: usize, active: bool);

    /// The engine started or stopped working on a column
    fn column_focus(&mut self, column: usize, active: bool);
}

/// Rows and columns whose marks changed since the last query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkDelta {
    pub rows: Range<usize>,
    pub columns: Range<usize>,
}

impl MarkDelta {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    /// Widen the delta to cover one more row
    pub fn touch_row(&mut self, row: usize) {
        self.rows = widen(&self.rows, row);
    }

    pub fn touch_column(&mut self, column: usize) {
        self.columns = widen(&self.columns, column);
    }
}

fn widen(range: &Range<usize>, index: usize) -> Range<usize> {
    if range.is_empty() {
        index..index + 1
    } else {
        range.start.min(index)..range.end.max(index + 1)
    }
}

/// An incremental solving engine
pub trait Engine {
    /// Prepare to solve `puzzle` into `grid`, discarding any earlier state
    fn load(&mut self, puzzle: &Puzzle, grid: &mut Grid);

    /// Perform one bounded unit of work
    fn step(
        &mut self,
        grid: &mut Grid,
        client: &mut dyn SolutionClient,
        progress: Option<&mut dyn ProgressObserver>,
    ) -> StepStatus;

    fn row_mark(&self, row: usize) -> MarkState;

    fn column_mark(&self, column: usize) -> MarkState;

    /// Take the lines whose marks changed since the last call
    fn take_mark_delta(&mut self) -> MarkDelta;

    /// Verbosity of the engine's own diagnostics
    fn set_log_level(&mut self, _level: u32) {}
}
