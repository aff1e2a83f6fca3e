//! Naughts and crosses rules.
//!
//! Board representation and the rule engine used by the match server.
//! Everything here is deterministic and free of I/O.
//!
//! # Example
//!
//! ```
//! use naughts_rules::{Board, Mark, Outcome, evaluate};
//!
//! let mut board = Board::new();
//! for index in [0, 1, 2] {
//!     board.place(index, Mark::X).unwrap();
//! }
//! assert_eq!(evaluate(&board, Mark::X), Outcome::Won);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod rules;
mod types;

pub use rules::{FULL_BOARD, WIN_LINES, evaluate};
pub use types::{Board, CELL_COUNT, Cell, Mark, Outcome, PlaceError, UnknownMark};
