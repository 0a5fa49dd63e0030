use serde::{Deserialize, Serialize};

use crate::InvariantViolation;

/// State of a single grid cell
///
/// `Dot` and `Blank` are both known to be empty. A `Dot` is an emptiness the
/// engine has confirmed, a `Blank` is one it assumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Unknown,
    Blank,
    Dot,
    Solid,
}

impl Cell {
    /// Raw code used by engines that report cells as bytes
    pub fn code(self) -> u8 {
        match self {
            Cell::Unknown => 0,
            Cell::Blank => 1,
            Cell::Dot => 2,
            Cell::Solid => 3,
        }
    }

    pub fn is_known(self) -> bool {
        self != Cell::Unknown
    }

    /// Whether the cell is known to be empty, either confirmed or assumed
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Blank | Cell::Dot)
    }
}

impl TryFrom<u8> for Cell {
    type Error = InvariantViolation;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Cell::Unknown),
            1 => Ok(Cell::Blank),
            2 => Ok(Cell::Dot),
            3 => Ok(Cell::Solid),
            other => Err(InvariantViolation::CellCode(other)),
        }
    }
}

/// Rendering hint for a row or column clue, supplied by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MarkState {
    /// Nothing to show for this line
    #[default]
    Off,
    /// The clue is partially satisfied
    InProgress,
    /// The clue is fully satisfied
    Done,
}

impl MarkState {
    pub fn code(self) -> u8 {
        match self {
            MarkState::Off => 0,
            MarkState::InProgress => 1,
            MarkState::Done => 2,
        }
    }
}

impl TryFrom<u8> for MarkState {
    type Error = InvariantViolation;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MarkState::Off),
            1 => Ok(MarkState::InProgress),
            2 => Ok(MarkState::Done),
            other => Err(InvariantViolation::MarkCode(other)),
        }
    }
}
