//! Game rules for naughts and crosses.
//!
//! Pure functions over a [`Board`]. Each cell `i` is encoded as bit `2^i`,
//! so a line or a full board is a single mask comparison.

pub mod draw;
pub mod win;

use crate::types::{Board, Mark, Outcome};
use tracing::instrument;

pub use draw::{FULL_BOARD, is_full};
pub use win::{WIN_LINES, completes_line};

/// Evaluates `board` from the point of view of `mark`, the mark that just moved.
///
/// A completed line always wins, even when the same move fills the board.
#[instrument(skip(board), ret)]
pub fn evaluate(board: &Board, mark: Mark) -> Outcome {
    if completes_line(board.occupancy(mark)) {
        Outcome::Won
    } else if is_full(board) {
        Outcome::Draw
    } else {
        Outcome::InProgress
    }
}
