//! Game core - pieces, ghost projection and the matrix controller
//!
//! Everything here is pure, deterministic, single-threaded state driven by
//! the caller's tick loop. There is no I/O, no timing, no rendering: the
//! matrix reports locked tiles, cleared lines and the game-over condition,
//! and the surrounding layers decide what to do with them.
//!
//! # Module Structure
//!
//! - [`shapes`]: the seven tetrimino arrangements and their derived metrics
//! - [`piece`]: the active piece; pure bit-shift movement and rotation geometry
//! - [`ghost`]: drop projection of the active piece
//! - [`rng`]: deterministic 7-bag piece queue with palette cycling
//! - [`matrix`]: the board controller owning placed tiles, queue and stash
//! - [`levels`]: caller-side gravity speed policy (SNES table)
//! - [`scoring`]: caller-side line-clear point policy
//!
//! # Example
//!
//! ```
//! use tetrion_core::{Matrix, PieceQueue};
//! use tetrion_types::{COLUMNS, ROWS, RotationDir};
//!
//! let mut matrix = Matrix::new((0, 0), COLUMNS, ROWS, PieceQueue::new(12345));
//!
//! matrix.move_left();
//! matrix.rotate(RotationDir::Cw);
//! matrix.hard_drop();
//!
//! let cleared = matrix.clear_lines();
//! assert!(cleared.is_empty() || cleared.iter().all(|&h| h <= 4));
//! ```

pub mod ghost;
pub mod levels;
pub mod matrix;
pub mod piece;
pub mod rng;
pub mod scoring;
pub mod shapes;

pub use tetrion_types as types;

// Re-export commonly used types for convenience
pub use ghost::Ghost;
pub use matrix::{Matrix, Stash};
pub use piece::Tetrimino;
pub use rng::{PieceQueue, SimpleRng};
