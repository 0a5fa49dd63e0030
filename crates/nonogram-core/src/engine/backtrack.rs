use super::{Engine, MarkDelta, ProgressObserver, SolutionClient, StepStatus};
use crate::{Cell, Grid, MarkState, Puzzle, Rect};

/// Exhaustive row-by-row search.
///
/// Every placement of each row clue is enumerated up front. A step either
/// tries the next placement of the current row or, when the row has none
/// left, backs up one row. Column clues prune partial grids. This finds every
/// solution, slowly; it exists so the driver has something to run and is not
/// meant to compete with a line-solving engine.
#[derive(Debug, Default)]
pub struct BacktrackEngine {
    width: usize,
    height: usize,
    columns: Vec<Vec<usize>>,
    options: Vec<Vec<Vec<Cell>>>,
    next: Vec<usize>,
    depth: usize,
    finished: bool,
    row_marks: Vec<MarkState>,
    column_marks: Vec<MarkState>,
    delta: MarkDelta,
    log_level: u32,
}

impl BacktrackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_row_mark(&mut self, row: usize, mark: MarkState) {
        if self.row_marks[row] != mark {
            self.row_marks[row] = mark;
            self.delta.touch_row(row);
        }
    }

    fn set_column_mark(&mut self, column: usize, mark: MarkState) {
        if self.column_marks[column] != mark {
            self.column_marks[column] = mark;
            self.delta.touch_column(column);
        }
    }

    /// Check every column against the rows placed so far and refresh marks
    fn columns_fit(&mut self, grid: &Grid, placed: usize) -> bool {
        let complete = placed == self.height;
        let mut all_fit = true;
        for x in 0..self.width {
            let prefix = grid.column(x).take(placed);
            let fits = prefix_fits(prefix, &self.columns[x], self.height - placed);
            let mark = match (fits, complete) {
                (true, true) => MarkState::Done,
                _ if placed == 0 => MarkState::Off,
                _ => MarkState::InProgress,
            };
            self.set_column_mark(x, mark);
            all_fit &= fits;
        }
        all_fit
    }

    fn clear_row(
        &mut self,
        grid: &mut Grid,
        row: usize,
        progress: &mut Option<&mut dyn ProgressObserver>,
    ) {
        grid.row_mut(row).fill(Cell::Unknown);
        self.set_row_mark(row, MarkState::Off);
        if let Some(observer) = progress.as_mut() {
            observer.cells_changed(grid, Rect::row(row, self.width));
            observer.row_focus(row, false);
        }
    }
}

impl Engine for BacktrackEngine {
    fn load(&mut self, puzzle: &Puzzle, grid: &mut Grid) {
        self.width = puzzle.width();
        self.height = puzzle.height();
        self.columns = puzzle
            .column_clues()
            .iter()
            .map(|clue| clue.iter().copied().filter(|&n| n > 0).collect())
            .collect();
        self.options = puzzle
            .row_clues()
            .iter()
            .map(|clue| {
                let clue: Vec<usize> = clue.iter().copied().filter(|&n| n > 0).collect();
                placements(&clue, self.width)
            })
            .collect();
        self.next = vec![0; self.height];
        self.depth = 0;
        self.finished = self.height == 0;
        self.row_marks = vec![MarkState::Off; self.height];
        self.column_marks = vec![MarkState::Off; self.width];
        self.delta = MarkDelta::default();
        grid.clear();
    }

    fn step(
        &mut self,
        grid: &mut Grid,
        client: &mut dyn SolutionClient,
        mut progress: Option<&mut dyn ProgressObserver>,
    ) -> StepStatus {
        if self.finished {
            return StepStatus::Finished;
        }

        let row = self.depth;
        let choice = self.next[row];
        if choice >= self.options[row].len() {
            self.next[row] = 0;
            self.clear_row(grid, row, &mut progress);
            if row == 0 {
                if self.log_level > 0 {
                    log::debug!("search space exhausted");
                }
                self.finished = true;
                return StepStatus::Finished;
            }
            self.depth -= 1;
            return StepStatus::Working;
        }
        self.next[row] += 1;

        grid.row_mut(row).copy_from_slice(&self.options[row][choice]);
        if let Some(observer) = progress.as_mut() {
            observer.row_focus(row, true);
            observer.cells_changed(grid, Rect::row(row, self.width));
        }
        if self.log_level > 1 {
            log::trace!("row {row}: trying placement {choice}");
        }

        if self.columns_fit(grid, row + 1) {
            self.set_row_mark(row, MarkState::Done);
            if let Some(observer) = progress.as_mut() {
                observer.row_focus(row, false);
            }
            if row + 1 == self.height {
                client.on_solution(grid);
            } else {
                self.depth += 1;
            }
        } else {
            self.set_row_mark(row, MarkState::InProgress);
        }
        StepStatus::Working
    }

    fn row_mark(&self, row: usize) -> MarkState {
        self.row_marks.get(row).copied().unwrap_or_default()
    }

    fn column_mark(&self, column: usize) -> MarkState {
        self.column_marks.get(column).copied().unwrap_or_default()
    }

    fn take_mark_delta(&mut self) -> MarkDelta {
        std::mem::take(&mut self.delta)
    }

    fn set_log_level(&mut self, level: u32) {
        self.log_level = level;
    }
}

/// Cells needed by a clue, saturating for clues no line could hold
fn min_len(clue: &[usize]) -> usize {
    crate::puzzle::min_len(clue).unwrap_or(usize::MAX)
}

/// Every way to lay `clue` out in a line of `len` cells
fn placements(clue: &[usize], len: usize) -> Vec<Vec<Cell>> {
    fn place(clue: &[usize], start: usize, line: &mut Vec<Cell>, out: &mut Vec<Vec<Cell>>) {
        let Some((&run, rest)) = clue.split_first() else {
            out.push(line.clone());
            return;
        };
        let rest_len = if rest.is_empty() { 0 } else { min_len(rest).saturating_add(1) };
        if start.saturating_add(run).saturating_add(rest_len) > line.len() {
            return;
        }
        for pos in start..=line.len() - rest_len - run {
            line[pos..pos + run].fill(Cell::Solid);
            place(rest, pos + run + 1, line, out);
            line[pos..pos + run].fill(Cell::Dot);
        }
    }

    let mut out = Vec::new();
    place(clue, 0, &mut vec![Cell::Dot; len], &mut out);
    out
}

/// Whether the top part of a column can still grow into `clue` with
/// `remaining` cells left below it
fn prefix_fits(prefix: impl Iterator<Item = Cell>, clue: &[usize], remaining: usize) -> bool {
    let mut runs = Vec::new();
    let mut open = false;
    for cell in prefix {
        if cell == Cell::Solid {
            if open {
                if let Some(last) = runs.last_mut() {
                    *last += 1;
                }
            } else {
                runs.push(1);
                open = true;
            }
        } else {
            open = false;
        }
    }

    if runs.len() > clue.len() {
        return false;
    }
    let closed = if open { runs.len() - 1 } else { runs.len() };
    if runs[..closed] != clue[..closed] {
        return false;
    }
    let needed = if open {
        let k = closed;
        if runs[k] > clue[k] {
            return false;
        }
        clue[k + 1..]
            .iter()
            .fold(clue[k] - runs[k], |acc, &n| acc.saturating_add(n).saturating_add(1))
    } else {
        min_len(&clue[closed..])
    };
    needed <= remaining
}
