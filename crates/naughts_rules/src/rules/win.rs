//! Win detection for naughts and crosses.

use tracing::instrument;

/// Winning line masks for a row-major 3x3 board.
///
/// Three rows, three columns, then the two diagonals.
pub const WIN_LINES: [u16; 8] = [7, 56, 448, 73, 146, 292, 273, 84];

/// Checks whether an occupancy mask fully contains any winning line.
#[instrument(ret)]
pub fn completes_line(occupied: u16) -> bool {
    WIN_LINES.iter().any(|&line| occupied & line == line)
}
