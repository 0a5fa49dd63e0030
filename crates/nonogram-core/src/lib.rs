//! Nonogram puzzle model and the contract for incremental solving engines.
//!
//! A [`Puzzle`] carries row and column clues, an optional title and a set of
//! [`Notes`]. A [`Grid`] is the cell buffer an [`Engine`] fills in, one
//! [`Engine::step`] at a time.

mod cell;
pub mod codec;
pub mod engine;
mod error;
mod grid;
mod notes;
mod puzzle;
pub mod testing;

pub use cell::{Cell, MarkState};
pub use codec::{JsonCodec, PuzzleCodec};
pub use engine::{BacktrackEngine, Engine, MarkDelta, ProgressObserver, SolutionClient, StepStatus};
pub use error::{InvalidGrid, InvariantViolation, NoteError, PuzzleError, PuzzleLoadError};
pub use grid::{line_clue, Grid, Rect};
pub use notes::{Note, Notes};
pub use puzzle::{Clue, Puzzle};
