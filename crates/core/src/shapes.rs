//! Shape catalog - the seven tetrimino arrangements
//!
//! Each shape is a fixed row-major 0/1 grid, at most 4x4, given top row
//! first. The arrangements are the rotation-state-zero geometry; rotated
//! forms are derived at the bitboard level rather than tabulated.

use tetrion_types::Shape;

/// A row-major 0/1 grid describing a shape
pub type Arrangement = &'static [&'static [u8]];

/// Every shape occupies exactly four cells
pub const CELLS_PER_PIECE: usize = 4;

const I_ARRANGEMENT: [&[u8]; 4] = [
    &[0, 0, 0, 0],
    &[1, 1, 1, 1],
    &[0, 0, 0, 0],
    &[0, 0, 0, 0],
];
const J_ARRANGEMENT: [&[u8]; 3] = [&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]];
const L_ARRANGEMENT: [&[u8]; 3] = [&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]];
const O_ARRANGEMENT: [&[u8]; 2] = [&[1, 1], &[1, 1]];
const S_ARRANGEMENT: [&[u8]; 3] = [&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]];
const T_ARRANGEMENT: [&[u8]; 3] = [&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]];
const Z_ARRANGEMENT: [&[u8]; 3] = [&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]];

/// The full (untrimmed) arrangement for a shape
pub fn arrangement(shape: Shape) -> Arrangement {
    match shape {
        Shape::I => &I_ARRANGEMENT,
        Shape::J => &J_ARRANGEMENT,
        Shape::L => &L_ARRANGEMENT,
        Shape::O => &O_ARRANGEMENT,
        Shape::S => &S_ARRANGEMENT,
        Shape::T => &T_ARRANGEMENT,
        Shape::Z => &Z_ARRANGEMENT,
    }
}

/// The arrangement with empty rows removed, for display centering
pub fn trimmed_arrangement(shape: Shape) -> Vec<&'static [u8]> {
    arrangement(shape)
        .iter()
        .copied()
        .filter(|row| row.iter().any(|&cell| cell != 0))
        .collect()
}

/// Width of the shape's bounding box (untrimmed row length)
pub fn width(shape: Shape) -> usize {
    arrangement(shape)[0].len()
}

/// Height of the occupied part of the shape (trimmed row count)
pub fn height(shape: Shape) -> usize {
    trimmed_arrangement(shape).len()
}
