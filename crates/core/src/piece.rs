//! The active piece
//!
//! A `Tetrimino` carries its occupied cells as a bitfield in full board
//! coordinates. Movement is pure bit shifting: left is `<< 1`, right is
//! `>> 1`, down is `>> columns`. Nothing at this layer checks legality;
//! collision is the matrix's responsibility, and this layer only computes
//! geometry.
//!
//! Lifecycle: a piece spawns, stays active while the matrix moves it, and
//! is marked placed exactly once when it locks. The matrix then discards it
//! and spawns a fresh one; pieces are never reused.

use num_bigint::BigUint;
use num_traits::Zero;

use tetrion_bitboard::{arrangement_to_bits, rotate_bitboard, widen_bitboard_width, Borders};
use tetrion_types::{RotationDir, Shape, TileColor};

use crate::shapes;

#[derive(Debug, Clone)]
pub struct Tetrimino {
    shape: Shape,
    color: TileColor,
    bitboard: BigUint,
    rotation: u8,
    placed: bool,
    columns: usize,
    rows: usize,
    borders: Borders,
}

impl Tetrimino {
    /// Build a piece from its shape arrangement, sitting at the bottom-right
    /// of the board space. Call [`move_to_start`](Self::move_to_start) to put
    /// it at the spawn position.
    pub fn new(shape: Shape, color: TileColor, columns: usize, rows: usize) -> Self {
        let bitboard = arrangement_to_bits(shapes::arrangement(shape), columns);
        Self {
            shape,
            color,
            bitboard,
            rotation: 0,
            placed: false,
            columns,
            rows,
            borders: Borders::new(columns, rows),
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn color(&self) -> TileColor {
        self.color
    }

    pub fn bitboard(&self) -> &BigUint {
        &self.bitboard
    }

    /// Rotation index in 0..4
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Shift to the spawn position: horizontally centered, top rows.
    pub fn move_to_start(&mut self) {
        self.bitboard <<= self.columns * (self.rows - 1) - self.columns / 2 - 2;
    }

    pub fn move_down(&mut self) {
        self.bitboard >>= self.columns;
    }

    pub fn move_left(&mut self) {
        self.bitboard <<= 1usize;
    }

    pub fn move_right(&mut self) {
        self.bitboard >>= 1usize;
    }

    /// Compute the candidate bitfield for one more quarter turn without
    /// mutating the piece.
    ///
    /// The candidate is rebuilt from scratch: pack the un-rotated shape into
    /// its small square box, replay every quarter turn applied so far plus
    /// the requested one, widen back to board width, then re-apply the
    /// piece's current shift so the rotation stays centered on where the
    /// piece is now rather than where it spawned. The shift is re-derived by
    /// normalizing the live bitfield down to the bottom border and walking
    /// single-bit shifts until it matches the un-shifted comparison board.
    pub fn test_rotate(&self, direction: RotationDir) -> BigUint {
        let width = shapes::width(self.shape);
        let mut small = arrangement_to_bits(shapes::arrangement(self.shape), width);
        small = rotate_bitboard(&small, width, self.rotation as i32);
        let compare = widen_bitboard_width(&small, width, self.columns);

        let mut live = self.bitboard.clone();
        let mut shift: i64 = 0;
        while (&live & &self.borders.bottom).is_zero() {
            live >>= self.columns;
            shift += self.columns as i64;
        }
        while live != compare {
            if live > compare {
                live >>= 1usize;
                shift += 1;
            } else {
                live <<= 1usize;
                shift -= 1;
            }
        }

        let turns = match direction {
            RotationDir::Cw => 1,
            RotationDir::Ccw => -1,
        };
        let rotated = rotate_bitboard(&small, width, turns);
        let candidate = widen_bitboard_width(&rotated, width, self.columns);
        if shift >= 0 {
            candidate << shift as usize
        } else {
            candidate >> (-shift) as usize
        }
    }

    /// Commit a candidate previously produced by [`test_rotate`](Self::test_rotate)
    /// and advance the rotation index.
    pub fn set_rotate(&mut self, bitboard: BigUint, direction: RotationDir) {
        self.bitboard = bitboard;
        self.rotation = match direction {
            RotationDir::Cw => (self.rotation + 1) % 4,
            RotationDir::Ccw => (self.rotation + 3) % 4,
        };
    }

    /// One-way transition out of the active state.
    pub fn mark_placed(&mut self) {
        self.placed = true;
    }
}
