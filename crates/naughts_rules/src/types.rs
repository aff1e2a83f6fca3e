//! Core domain types for naughts and crosses.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// The mark a participant plays as.
///
/// On the wire a mark is an integer: `0` for [`Mark::X`], `1` for [`Mark::O`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, strum::EnumIter,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Mark {
    /// First to move; always the queue owner.
    X,
    /// Second to move; always the joining participant.
    O,
}

impl Mark {
    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl From<Mark> for u8 {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => 0,
            Mark::O => 1,
        }
    }
}

/// A wire value that names no mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("{} is not a mark (expected 0 or 1)", _0)]
pub struct UnknownMark(#[error(not(source))] pub u8);

impl TryFrom<u8> for Mark {
    type Error = UnknownMark;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mark::X),
            1 => Ok(Mark::O),
            other => Err(UnknownMark(other)),
        }
    }
}

/// A single cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nobody has played here yet.
    #[default]
    Empty,
    /// Occupied by a mark.
    Marked(Mark),
}

/// Why a mark could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum PlaceError {
    /// Index is not one of the nine cells.
    #[display("Cell {} is out of range (must be 0-8)", _0)]
    OutOfRange(#[error(not(source))] usize),
    /// Cell already holds a mark.
    #[display("Cell {} is already occupied", _0)]
    Occupied(#[error(not(source))] usize),
}

/// 3x3 board in row-major order (0 = top-left, 8 = bottom-right).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from explicit cells.
    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Self { cells }
    }

    /// Gets the cell at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Checks whether `index` is a valid, empty cell.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Cell::Empty))
    }

    /// Writes `mark` into an empty cell.
    ///
    /// A cell is written at most once; occupied cells are never overwritten.
    #[instrument(skip(self))]
    pub fn place(&mut self, index: usize, mark: Mark) -> Result<(), PlaceError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(PlaceError::OutOfRange(index))?;
        if *cell != Cell::Empty {
            return Err(PlaceError::Occupied(index));
        }
        *cell = Cell::Marked(mark);
        Ok(())
    }

    /// Returns all cells.
    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    /// Bitmask of cells holding `mark` (bit `2^i` for cell `i`).
    pub fn occupancy(&self, mark: Mark) -> u16 {
        self.mask_where(|cell| cell == Cell::Marked(mark))
    }

    /// Bitmask of every non-empty cell.
    pub fn filled(&self) -> u16 {
        self.mask_where(|cell| cell != Cell::Empty)
    }

    fn mask_where(&self, pred: impl Fn(Cell) -> bool) -> u16 {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| pred(**cell))
            .fold(0, |mask, (i, _)| mask | (1 << i))
    }
}

/// Result of evaluating a board after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Outcome {
    /// Play continues.
    #[display("in progress")]
    InProgress,
    /// The evaluated mark completed a line.
    #[display("won")]
    Won,
    /// Every cell is filled and nobody completed a line.
    #[display("draw")]
    Draw,
}

impl Outcome {
    /// True for `Won` and `Draw`.
    pub fn is_terminal(self) -> bool {
        self != Outcome::InProgress
    }
}
