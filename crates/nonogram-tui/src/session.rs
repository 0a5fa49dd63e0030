//! A solving session: one puzzle, one engine, one run.
//!
//! The session owns the grid buffer and every output resource. Each
//! [`Session::step`] hands the engine a [`SolutionClient`] that writes
//! solutions to the sink, and, only when a display is enabled, a
//! [`ProgressObserver`] that draws on it. Both borrow disjoint parts of the
//! session for the duration of that one step.

use std::io;

use nonogram_core::{Cell, Engine, Grid, ProgressObserver, Puzzle, Rect, SolutionClient, StepStatus};

use crate::config::SessionConfig;
use crate::display::{Display, DisplayError};
use crate::error::SessionError;
use crate::log_file::SessionLog;
use crate::sink::SolutionSink;

/// Lifecycle of a session. Every path ends in `ShutDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Running,
    /// The engine exhausted the search
    Finished,
    /// Stopped early by the solution limit, a cancel or a fatal error
    Aborted,
    ShutDown,
}

/// Result of a single [`Session::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    Finished,
}

/// What a completed run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub solutions: usize,
    pub steps: usize,
    /// The engine searched everything rather than being stopped
    pub exhausted: bool,
}

pub struct Session<E: Engine> {
    puzzle: Puzzle,
    grid: Option<Grid>,
    engine: E,
    display: Option<Display>,
    sink: SolutionSink,
    log: Option<SessionLog>,
    limit: usize,
    solutions: usize,
    steps: usize,
    stop: bool,
    phase: Phase,
    shut_down: bool,
    errors: Vec<SessionError>,
}

impl<E: Engine> Session<E> {
    /// Start a session with the sink and display `config` asks for.
    ///
    /// The grid buffer is checked before any output is opened. Progress is
    /// drawn on standard error.
    pub fn start(
        puzzle: Puzzle,
        buffer: Vec<Cell>,
        config: &SessionConfig,
        engine: E,
    ) -> Result<Self, SessionError> {
        let grid = Grid::from_buffer(puzzle.width(), puzzle.height(), buffer)?;
        let log = config.log.as_ref().map(SessionLog::open).transpose()?;
        let sink = match SolutionSink::open(&config.output, config.format.clone()) {
            Ok(sink) => sink,
            Err(err) => {
                if let Some(Err(close_err)) = log.map(SessionLog::close) {
                    log::warn!("{close_err}");
                }
                return Err(err);
            }
        };
        let (width, height) = (grid.width(), grid.height());
        let display = Display::open(config.display, width, height, Box::new(io::stderr()));
        Self::assemble(puzzle, grid, config, engine, display, sink, log)
    }

    /// Start a session writing to an explicit sink and display
    #[cfg(test)]
    pub fn start_with(
        puzzle: Puzzle,
        buffer: Vec<Cell>,
        config: &SessionConfig,
        engine: E,
        display: Option<Display>,
        sink: SolutionSink,
    ) -> Result<Self, SessionError> {
        let grid = Grid::from_buffer(puzzle.width(), puzzle.height(), buffer)?;
        let log = config.log.as_ref().map(SessionLog::open).transpose()?;
        Self::assemble(puzzle, grid, config, engine, display, sink, log)
    }

    fn assemble(
        puzzle: Puzzle,
        mut grid: Grid,
        config: &SessionConfig,
        mut engine: E,
        display: Option<Display>,
        sink: SolutionSink,
        log: Option<SessionLog>,
    ) -> Result<Self, SessionError> {
        engine.set_log_level(log.as_ref().map_or(0, SessionLog::level));
        engine.load(&puzzle, &mut grid);
        log::debug!(
            "session started for {}x{} puzzle, limit {}",
            grid.width(),
            grid.height(),
            config.limit
        );

        let mut session = Self {
            puzzle,
            grid: Some(grid),
            engine,
            display,
            sink,
            log,
            limit: config.limit,
            solutions: 0,
            steps: 0,
            stop: false,
            phase: Phase::Created,
            shut_down: false,
            errors: Vec::new(),
        };
        // Dropping the session on error still shuts it down
        session.prime_display()?;
        Ok(session)
    }

    fn prime_display(&mut self) -> Result<(), SessionError> {
        let Some(display) = self.display.as_mut() else {
            return Ok(());
        };
        let engine = &self.engine;
        display.clear()?;
        display.mark_row_range(0..self.puzzle.height(), |row| engine.row_mark(row))?;
        display.mark_column_range(0..self.puzzle.width(), |column| engine.column_mark(column))?;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        if self.shut_down {
            Phase::ShutDown
        } else {
            self.phase
        }
    }

    #[cfg(test)]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Non-fatal failures collected during the run
    pub fn errors(&self) -> &[SessionError] {
        &self.errors
    }

    /// Ask the session to issue no further engine work
    #[cfg(test)]
    pub fn cancel(&mut self) {
        self.stop = true;
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            solutions: self.solutions,
            steps: self.steps,
            exhausted: self.phase == Phase::Finished,
        }
    }

    /// Run one unit of engine work
    pub fn step(&mut self) -> Result<StepResult, SessionError> {
        match self.phase() {
            Phase::Created => self.phase = Phase::Running,
            Phase::Running => {}
            Phase::Finished | Phase::Aborted | Phase::ShutDown => return Ok(StepResult::Finished),
        }
        if self.stop {
            self.phase = Phase::Aborted;
            return Ok(StepResult::Finished);
        }
        let Some(grid) = self.grid.as_mut() else {
            self.phase = Phase::Aborted;
            return Ok(StepResult::Finished);
        };
        self.steps += 1;

        let mut client = Delivery {
            sink: &mut self.sink,
            log: self.log.as_mut(),
            limit: self.limit,
            solutions: &mut self.solutions,
            stop: &mut self.stop,
            errors: &mut self.errors,
            fatal: None,
        };
        let mut observer = self.display.as_mut().map(|display| Progress { display, failure: None });
        let status = self.engine.step(
            grid,
            &mut client,
            observer.as_mut().map(|o| o as &mut dyn ProgressObserver),
        );
        let fatal = client.fatal;
        let display_failure = observer.and_then(|o| o.failure);

        if let Some(err) = fatal {
            self.phase = Phase::Aborted;
            return Err(err);
        }
        if let Some(err) = display_failure {
            self.display_failed(err)?;
        }

        if let Some(display) = self.display.as_mut() {
            let delta = self.engine.take_mark_delta();
            let engine = &self.engine;
            let pushed = display
                .mark_row_range(delta.rows, |row| engine.row_mark(row))
                .and_then(|()| {
                    display.mark_column_range(delta.columns, |column| engine.column_mark(column))
                });
            if let Err(err) = pushed {
                self.display_failed(err)?;
            }
        }

        if let Some(log) = self.log.as_mut().filter(|log| log.level() >= 2) {
            if let Err(err) = log.record(format_args!("step {}: {:?}", self.steps, status)) {
                self.phase = Phase::Aborted;
                return Err(err);
            }
        }

        match status {
            StepStatus::Finished => {
                log::debug!("search exhausted after {} steps", self.steps);
                self.phase = Phase::Finished;
                Ok(StepResult::Finished)
            }
            StepStatus::Working => Ok(StepResult::Continue),
        }
    }

    fn display_failed(&mut self, err: DisplayError) -> Result<(), SessionError> {
        match err {
            DisplayError::Invariant(violation) => {
                self.phase = Phase::Aborted;
                Err(violation.into())
            }
            DisplayError::Io(source) => {
                let err = SessionError::io("display", source);
                log::warn!("{err}");
                self.errors.push(err);
                Ok(())
            }
        }
    }

    /// Step until the engine finishes or the session stops, then shut down
    pub fn run(&mut self) -> Result<RunSummary, SessionError> {
        let result = loop {
            match self.step() {
                Ok(StepResult::Continue) => {}
                Ok(StepResult::Finished) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        let closed = self.shutdown();
        result?;
        closed?;
        Ok(self.summary())
    }

    /// Park the display cursor, close the sink and the log, and release the
    /// grid. Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        if self.phase == Phase::Running {
            self.phase = Phase::Aborted;
        }

        let mut first: Option<SessionError> = None;
        if let Some(display) = self.display.as_mut() {
            if let Err(err) = display.park_cursor() {
                first.get_or_insert(err.into());
            }
        }
        if let Err(err) = self.sink.close() {
            first.get_or_insert(err);
        }
        if let Some(log) = self.log.take() {
            if let Err(err) = log.close() {
                first.get_or_insert(err);
            }
        }
        self.grid = None;
        log::debug!(
            "session shut down after {} steps, {} solutions",
            self.steps,
            self.solutions
        );
        first.map_or(Ok(()), Err)
    }
}

impl<E: Engine> Drop for Session<E> {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            log::error!("{err}");
        }
    }
}

/// Solution callback for one step
struct Delivery<'a> {
    sink: &'a mut SolutionSink,
    log: Option<&'a mut SessionLog>,
    limit: usize,
    solutions: &'a mut usize,
    stop: &'a mut bool,
    errors: &'a mut Vec<SessionError>,
    fatal: Option<SessionError>,
}

impl SolutionClient for Delivery<'_> {
    fn on_solution(&mut self, grid: &Grid) {
        if *self.stop {
            return;
        }
        *self.solutions += 1;
        let index = *self.solutions;
        if self.limit > 0 && index >= self.limit {
            *self.stop = true;
        }

        if let Err(err) = self.sink.emit(index, grid) {
            if self.sink.failure_is_fatal() {
                *self.stop = true;
                self.fatal = Some(err);
                return;
            }
            log::error!("{err}");
            self.errors.push(err);
        }

        if let Some(log) = self.log.as_deref_mut().filter(|log| log.level() >= 1) {
            if let Err(err) = log.record(format_args!("solution {index}")) {
                *self.stop = true;
                self.fatal = Some(err);
            }
        }
    }
}

/// Progress observer for one step; keeps the first failure
struct Progress<'a> {
    display: &'a mut Display,
    failure: Option<DisplayError>,
}

impl Progress<'_> {
    fn guard(&mut self, draw: impl FnOnce(&mut Display) -> Result<(), DisplayError>) {
        if self.failure.is_none() {
            if let Err(err) = draw(self.display) {
                self.failure = Some(err);
            }
        }
    }
}

impl ProgressObserver for Progress<'_> {
    fn cells_changed(&mut self, grid: &Grid, area: Rect) {
        self.guard(|display| display.paint_area(grid, area));
    }

    fn row_focus(&mut self, row: usize, active: bool) {
        self.guard(|display| display.focus_row(row, active));
    }

    fn column_focus(&mut self, column: usize, active: bool) {
        self.guard(|display| display.focus_column(column, active));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayKind, Format, LogTarget};
    use nonogram_core::testing::{FailingWriter, ScriptedEngine, SharedBuffer};
    use nonogram_core::{MarkDelta, MarkState};
    use proptest::prelude::*;

    fn single_cell() -> Puzzle {
        Puzzle::new(vec![vec![1]], vec![vec![1]]).unwrap()
    }

    fn config(limit: usize) -> SessionConfig {
        SessionConfig {
            limit,
            ..SessionConfig::default()
        }
    }

    fn to_buffer() -> (SolutionSink, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let sink = SolutionSink::to_stream("buffer", Box::new(buffer.clone()), Format::default());
        (sink, buffer)
    }

    fn session(
        engine: ScriptedEngine,
        limit: usize,
        display: Option<Display>,
    ) -> (Session<ScriptedEngine>, SharedBuffer) {
        let (sink, buffer) = to_buffer();
        let buffer_cells = vec![Cell::Unknown];
        let session =
            Session::start_with(single_cell(), buffer_cells, &config(limit), engine, display, sink)
                .unwrap();
        (session, buffer)
    }

    #[test]
    fn test_mismatched_buffer_rejected() {
        let (sink, buffer) = to_buffer();
        let result = Session::start_with(
            single_cell(),
            vec![Cell::Unknown; 2],
            &config(0),
            ScriptedEngine::default(),
            None,
            sink,
        );
        assert!(matches!(
            result,
            Err(SessionError::InvalidGrid(nonogram_core::InvalidGrid { expected: 1, actual: 2 }))
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_limit_emits_exactly_that_many() {
        let engine = ScriptedEngine::repeating(5, vec![Cell::Solid]);
        let (mut session, buffer) = session(engine, 2, None);
        let summary = session.run().unwrap();
        assert_eq!(summary.solutions, 2);
        assert!(!summary.exhausted);
        assert_eq!(buffer.contents(), "#\n\n#\n\n");
        assert_eq!(session.engine().steps(), 2);
    }

    #[test]
    fn test_zero_limit_emits_all() {
        let engine = ScriptedEngine::repeating(3, vec![Cell::Solid]);
        let (mut session, buffer) = session(engine, 0, None);
        let summary = session.run().unwrap();
        assert_eq!(summary.solutions, 3);
        assert!(summary.exhausted);
        assert_eq!(buffer.contents().matches('#').count(), 3);
        assert_eq!(session.engine().steps(), 4);
    }

    #[test]
    fn test_solutions_delivered_in_engine_order() {
        let solutions = vec![vec![Cell::Solid], vec![Cell::Dot], vec![Cell::Blank]];
        let engine = ScriptedEngine::new(solutions);
        let (mut session, buffer) = session(engine, 0, None);
        session.run().unwrap();
        assert_eq!(buffer.contents(), "#\n\n-\n\n \n\n");
    }

    #[test]
    fn test_disabled_display_gets_no_calls() {
        let (mut session, _) = session(ScriptedEngine::repeating(2, vec![Cell::Solid]), 0, None);
        session.run().unwrap();
        assert_eq!(session.engine().progress_offered(), 0);
        assert_eq!(session.engine().mark_queries(), 0);
    }

    #[test]
    fn test_enabled_display_follows_progress() {
        let screen = SharedBuffer::new();
        let display = Display::open(DisplayKind::Terminal, 1, 1, Box::new(screen.clone()));
        let (mut session, _) = session(ScriptedEngine::repeating(2, vec![Cell::Solid]), 0, display);
        session.run().unwrap();
        assert_eq!(session.engine().progress_offered(), 2);
        // one row and one column primed, then both pushed after each solution
        assert_eq!(session.engine().mark_queries(), 2 + 2 * 2);
        let drawn = screen.contents();
        assert!(drawn.starts_with("\x1b[2J"));
        assert!(drawn.contains("\x1b[1;1H#"));
        // parked below the marks on shutdown
        assert!(drawn.ends_with("\x1b[8;1H"));
    }

    #[test]
    fn test_step_after_finish_does_no_work() {
        let (mut session, _) = session(ScriptedEngine::repeating(1, vec![Cell::Solid]), 1, None);
        assert_eq!(session.step().unwrap(), StepResult::Continue);
        assert_eq!(session.step().unwrap(), StepResult::Finished);
        assert_eq!(session.phase(), Phase::Aborted);
        assert_eq!(session.step().unwrap(), StepResult::Finished);
        assert_eq!(session.engine().steps(), 1);
    }

    #[test]
    fn test_shutdown_twice_is_safe() {
        let (mut session, _) = session(ScriptedEngine::repeating(1, vec![Cell::Solid]), 0, None);
        session.shutdown().unwrap();
        session.shutdown().unwrap();
        assert_eq!(session.phase(), Phase::ShutDown);
        assert_eq!(session.step().unwrap(), StepResult::Finished);
        assert_eq!(session.engine().steps(), 0);
    }

    #[test]
    fn test_cancel_stops_before_next_step() {
        let (mut session, _) = session(ScriptedEngine::repeating(3, vec![Cell::Solid]), 0, None);
        session.step().unwrap();
        session.cancel();
        assert_eq!(session.step().unwrap(), StepResult::Finished);
        assert_eq!(session.summary().solutions, 1);
        assert_eq!(session.phase(), Phase::Aborted);
    }

    #[test]
    fn test_stream_failure_does_not_stop_run() {
        let sink = SolutionSink::to_stream("pipe", Box::new(FailingWriter), Format::default());
        let engine = ScriptedEngine::repeating(3, vec![Cell::Solid]);
        let mut session =
            Session::start_with(single_cell(), vec![Cell::Unknown], &config(0), engine, None, sink)
                .unwrap();
        let summary = session.run().unwrap();
        assert_eq!(summary.solutions, 3);
        assert_eq!(session.errors().len(), 3);
    }

    #[test]
    fn test_unopenable_numbered_files_do_not_stop_run() {
        let dir = std::env::temp_dir().join(format!("nonogram-missing-{}", std::process::id()));
        let pattern = dir.join("sol%d.txt").to_string_lossy().parse().unwrap();
        let config = SessionConfig {
            output: crate::config::OutputTarget::Numbered(pattern),
            ..config(0)
        };
        let engine = ScriptedEngine::repeating(3, vec![Cell::Solid]);
        let mut session =
            Session::start(single_cell(), vec![Cell::Unknown], &config, engine).unwrap();
        let summary = session.run().unwrap();
        assert_eq!(summary.solutions, 3);
        assert!(summary.exhausted);
        assert_eq!(session.errors().len(), 3);
        assert!(!dir.exists());
    }

    #[test]
    fn test_single_file_failure_aborts_run() {
        let sink = SolutionSink::to_single("out.txt", Box::new(FailingWriter), Format::default());
        let engine = ScriptedEngine::repeating(3, vec![Cell::Solid]);
        let mut session =
            Session::start_with(single_cell(), vec![Cell::Unknown], &config(0), engine, None, sink)
                .unwrap();
        let err = session.run().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Io { ref destination, .. } if destination == "out.txt"
        ));
        assert_eq!(session.phase(), Phase::ShutDown);
        assert_eq!(session.engine().steps(), 1);
        assert!(session.errors().is_empty());
    }

    /// Accepts the first `lines` lines, then fails every write
    struct FailsAfter {
        lines: usize,
    }

    impl io::Write for FailsAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.lines == 0 {
                return Err(io::Error::other("device full"));
            }
            let ended = buf.iter().filter(|&&b| b == b'\n').count();
            self.lines = self.lines.saturating_sub(ended);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_failure_aborts_run() {
        let engine = ScriptedEngine::repeating(3, vec![Cell::Solid]);
        let mut session = Session::start_with(
            single_cell(),
            vec![Cell::Unknown],
            &config(0),
            engine,
            None,
            SolutionSink::discard(),
        )
        .unwrap();
        let log = SessionLog::to_writer("session.log", Box::new(FailsAfter { lines: 1 }), 1);
        session.log = Some(log.unwrap());
        let err = session.run().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Io { ref destination, .. } if destination == "session.log"
        ));
        assert_eq!(session.phase(), Phase::ShutDown);
        assert_eq!(session.summary().solutions, 1);
        assert_eq!(session.engine().steps(), 1);
    }

    #[test]
    fn test_drop_closes_log() {
        let path =
            std::env::temp_dir().join(format!("nonogram-session-{}.log", std::process::id()));
        let config = SessionConfig {
            log: Some(LogTarget {
                path: path.clone(),
                append: false,
                level: 2,
            }),
            ..config(0)
        };
        let engine = ScriptedEngine::repeating(1, vec![Cell::Solid]);
        let mut session = Session::start_with(
            single_cell(),
            vec![Cell::Unknown],
            &config,
            engine,
            None,
            SolutionSink::discard(),
        )
        .unwrap();
        session.step().unwrap();
        drop(session);
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("log started at"));
        assert_eq!(lines[1], "solution 1");
        assert_eq!(lines[2], "step 1: Working");
        assert!(lines[3].starts_with("log ended at"));
        std::fs::remove_file(&path).unwrap();
    }

    /// Reports a changed area one column wider than the grid
    struct StrayEngine;

    impl Engine for StrayEngine {
        fn load(&mut self, _puzzle: &Puzzle, _grid: &mut Grid) {}

        fn step(
            &mut self,
            grid: &mut Grid,
            _client: &mut dyn SolutionClient,
            progress: Option<&mut dyn ProgressObserver>,
        ) -> StepStatus {
            if let Some(observer) = progress {
                let area = Rect::new(0, 0, grid.width() + 1, grid.height());
                observer.cells_changed(grid, area);
            }
            StepStatus::Working
        }

        fn row_mark(&self, _row: usize) -> MarkState {
            MarkState::Off
        }

        fn column_mark(&self, _column: usize) -> MarkState {
            MarkState::Off
        }

        fn take_mark_delta(&mut self) -> MarkDelta {
            MarkDelta::default()
        }
    }

    #[test]
    fn test_out_of_grid_progress_is_fatal() {
        let display = Display::open(DisplayKind::Null, 1, 1, Box::new(SharedBuffer::new()));
        let mut session = Session::start_with(
            single_cell(),
            vec![Cell::Unknown],
            &config(0),
            StrayEngine,
            display,
            SolutionSink::discard(),
        )
        .unwrap();
        assert!(matches!(session.run(), Err(SessionError::InvariantViolation(_))));
        assert_eq!(session.phase(), Phase::ShutDown);
    }

    proptest! {
        #[test]
        fn limit_caps_emitted_solutions(available in 0usize..12, limit in 0usize..12) {
            let engine = ScriptedEngine::repeating(available, vec![Cell::Solid]);
            let (mut session, buffer) = session(engine, limit, None);
            let summary = session.run().unwrap();
            let expected = if limit > 0 { available.min(limit) } else { available };
            prop_assert_eq!(summary.solutions, expected);
            prop_assert_eq!(buffer.contents().matches('#').count(), expected);
            prop_assert_eq!(summary.exhausted, limit == 0 || available < limit);
        }
    }
}
