//! Ghost projection - where the active piece would land
//!
//! The ghost is derived state: it shares its parent's shape and color but
//! carries an independently computed bitfield for the lowest non-colliding
//! position. It is recomputed from scratch on every change to the parent
//! and never locks or touches the board.

use num_bigint::BigUint;
use num_traits::Zero;

use tetrion_types::{Shape, TileColor};

use crate::piece::Tetrimino;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ghost {
    shape: Shape,
    color: TileColor,
    bitboard: BigUint,
}

impl Ghost {
    /// Drop the piece's bitfield as far as it can go.
    ///
    /// `obstacles` is every locked tile plus the bottom border. The piece
    /// descends one row at a time while the next step intersects nothing;
    /// this terminates within `rows` iterations.
    pub fn project(piece: &Tetrimino, obstacles: &BigUint) -> Self {
        let columns = piece.columns();
        let mut bitboard = piece.bitboard().clone();
        loop {
            let below = &bitboard >> columns;
            if !(&below & obstacles).is_zero() {
                break;
            }
            bitboard = below;
        }

        Self {
            shape: piece.shape(),
            color: piece.color(),
            bitboard,
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
}
