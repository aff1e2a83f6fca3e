//! Draw detection for naughts and crosses.

use crate::types::Board;
use tracing::instrument;

/// Mask with all nine cell bits set.
pub const FULL_BOARD: u16 = 511;

/// Checks if every cell is occupied.
///
/// A full board with no winner indicates a draw.
#[instrument(skip(board))]
pub fn is_full(board: &Board) -> bool {
    board.filled() == FULL_BOARD
}
