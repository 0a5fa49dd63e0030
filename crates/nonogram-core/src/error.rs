/// A value reached a rendering or engine boundary outside its defined set.
///
/// This is a contract breach between the engine and its callers, never a
/// user-facing condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum InvariantViolation {
    #[display("cell code {_0} is not a valid cell value")]
    CellCode(#[error(not(source))] u8),
    #[display("mark code {_0} is not a valid mark state")]
    MarkCode(#[error(not(source))] u8),
    #[display("cell ({x}, {y}) lies outside the {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[display("line {index} lies outside the {len} available lines")]
    LineOutOfBounds { index: usize, len: usize },
}

/// A grid buffer does not match the puzzle it is meant to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("grid buffer holds {actual} cells but the puzzle needs {expected}")]
pub struct InvalidGrid {
    pub expected: usize,
    pub actual: usize,
}

/// The codec rejected its input
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum PuzzleLoadError {
    #[display("malformed puzzle data: {_0}")]
    Malformed(#[from] serde_json::Error),
    #[display("inconsistent puzzle: {_0}")]
    Inconsistent(#[from] PuzzleError),
    #[display("no grid lines found")]
    EmptyGrid,
    #[display("grid has {unknown} undecided cells")]
    IncompleteGrid { unknown: usize },
}

/// A puzzle whose dimensions and clues do not agree
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PuzzleError {
    #[display("puzzle dimensions must be positive, got {width}x{height}")]
    EmptyDimensions { width: usize, height: usize },
    #[display("expected {expected} row clues, found {found}")]
    RowCount { expected: usize, found: usize },
    #[display("expected {expected} column clues, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[display("clue for row {index} needs {needed} cells but the row has {len}")]
    RowOverflow { index: usize, needed: usize, len: usize },
    #[display("clue for column {index} needs {needed} cells but the column has {len}")]
    ColumnOverflow { index: usize, needed: usize, len: usize },
    #[display("clue for {axis} {index} is too large to count")]
    ClueTooLarge { axis: &'static str, index: usize },
}

/// Failure of a note operation
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum NoteError {
    #[display("note `{_0}` is not set")]
    NotFound(#[error(not(source))] String),
    #[display("note `{_0}` is already set")]
    AlreadyExists(#[error(not(source))] String),
}
