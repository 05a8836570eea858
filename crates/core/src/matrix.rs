//! Matrix - the board controller
//!
//! Owns the placed-tile map, the active piece, its ghost, the piece queue
//! and the stash slot. All mutating operations run to completion on the
//! caller's thread; gravity is simulated by the caller invoking
//! [`Matrix::move_down`] on its own timer.
//!
//! Collision model: the board's outer ring is wall. Movement candidates are
//! tested against the matching border mask first, then against the placed
//! tiles. Illegal moves and rotations are routine input, not faults; they
//! leave the matrix untouched and report nothing.

use std::collections::BTreeMap;

use num_bigint::BigUint;
use num_traits::Zero;

use tetrion_bitboard::{bit_to_coords, decompose_bits, BitboardError, Borders};
use tetrion_types::{RotationDir, Shape, TileColor, TILE_HEIGHT, TILE_WIDTH};

use crate::ghost::Ghost;
use crate::piece::Tetrimino;
use crate::rng::PieceQueue;

/// Single-slot piece stash
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stash {
    slot: Option<(Shape, TileColor)>,
}

impl Stash {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Exchange the slot's content for `piece`, returning the previous
    /// occupant (None the first time).
    pub fn swap(&mut self, piece: (Shape, TileColor)) -> Option<(Shape, TileColor)> {
        self.slot.replace(piece)
    }

    pub fn peek(&self) -> Option<(Shape, TileColor)> {
        self.slot
    }
}

/// The board controller
#[derive(Debug, Clone)]
pub struct Matrix {
    origin: (i32, i32),
    columns: usize,
    rows: usize,
    borders: Borders,
    tiles: BTreeMap<BigUint, TileColor>,
    active: Option<Tetrimino>,
    ghost: Option<Ghost>,
    queue: PieceQueue,
    stash: Stash,
}

impl Matrix {
    /// `origin` is the pixel offset of the board's top-left corner, carried
    /// for [`tile_coords`](Self::tile_coords); the engine itself never uses
    /// it.
    pub fn new(origin: (i32, i32), columns: usize, rows: usize, queue: PieceQueue) -> Self {
        Self {
            origin,
            columns,
            rows,
            borders: Borders::new(columns, rows),
            tiles: BTreeMap::new(),
            active: None,
            ghost: None,
            queue,
            stash: Stash::new(),
        }
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The active piece, spawning a fresh one from the queue if the previous
    /// piece has locked (or none exists yet). Spawning is a side effect of
    /// the first query or movement after a lock.
    pub fn active_piece(&mut self) -> &Tetrimino {
        self.ensure_active();
        match &self.active {
            Some(piece) => piece,
            None => unreachable!("ensure_active installs an active piece"),
        }
    }

    /// Ghost of the active piece, present whenever an unplaced piece is
    pub fn ghost(&self) -> Option<&Ghost> {
        self.ghost.as_ref()
    }

    /// The (shape, color) pair the queue will hand out next
    pub fn peek_next(&self) -> (Shape, TileColor) {
        self.queue.peek()
    }

    /// Every locked cell, keyed by its single-bit board position
    pub fn placed_tiles(&self) -> &BTreeMap<BigUint, TileColor> {
        &self.tiles
    }

    /// Content of the stash slot without disturbing it
    pub fn stashed(&self) -> Option<(Shape, TileColor)> {
        self.stash.peek()
    }

    /// Pixel position of a single placed-tile bit, shifted by the board
    /// origin.
    pub fn tile_coords(&self, bit: &BigUint) -> Result<(i32, i32), BitboardError> {
        let (x, y) = bit_to_coords(bit, self.rows, self.columns, TILE_WIDTH, TILE_HEIGHT)?;
        Ok((x + self.origin.0, y + self.origin.1))
    }

    /// True once any locked tile sits in the topmost row.
    ///
    /// A pure check; it does not stop the matrix from accepting further
    /// commands.
    pub fn is_game_over(&self) -> bool {
        self.tiles
            .keys()
            .any(|bit| !(bit & &self.borders.top).is_zero())
    }

    /// Shift the active piece one column left unless a wall or tile is in
    /// the way.
    pub fn move_left(&mut self) {
        self.ensure_active();
        let Some(piece) = self.active.as_ref() else {
            return;
        };
        let candidate = piece.bitboard() << 1usize;
        if !(&candidate & &self.borders.left).is_zero() {
            return;
        }
        if !(&candidate & &self.occupied()).is_zero() {
            return;
        }
        if let Some(piece) = self.active.as_mut() {
            piece.move_left();
        }
        self.refresh_ghost();
    }

    /// Shift the active piece one column right unless a wall or tile is in
    /// the way.
    pub fn move_right(&mut self) {
        self.ensure_active();
        let Some(piece) = self.active.as_ref() else {
            return;
        };
        let candidate = piece.bitboard() >> 1usize;
        if !(&candidate & &self.borders.right).is_zero() {
            return;
        }
        if !(&candidate & &self.occupied()).is_zero() {
            return;
        }
        if let Some(piece) = self.active.as_mut() {
            piece.move_right();
        }
        self.refresh_ghost();
    }

    /// Drop the active piece one row; this is also the gravity tick.
    ///
    /// If the step below is blocked by the floor or a placed tile, the piece
    /// locks in place instead: its cells merge into the placed-tile map and
    /// it is marked placed without moving.
    pub fn move_down(&mut self) {
        self.ensure_active();
        let Some(piece) = self.active.as_ref() else {
            return;
        };
        let below = piece.bitboard() >> self.columns;
        let blocked = !(&below & &self.borders.bottom).is_zero()
            || !(&below & &self.occupied()).is_zero();
        if blocked {
            let color = piece.color();
            for bit in decompose_bits(piece.bitboard()) {
                self.tiles.insert(bit, color);
            }
            if let Some(piece) = self.active.as_mut() {
                piece.mark_placed();
            }
            self.ghost = None;
            return;
        }
        if let Some(piece) = self.active.as_mut() {
            piece.move_down();
        }
        self.refresh_ghost();
    }

    /// Drop the active piece until it locks.
    pub fn hard_drop(&mut self) {
        self.ensure_active();
        while matches!(&self.active, Some(piece) if !piece.is_placed()) {
            self.move_down();
        }
    }

    /// Rotate the active piece a quarter turn, kicking one column if the
    /// plain rotation collides.
    ///
    /// The kick tries right, then left; if neither clears the collision the
    /// rotation is rejected outright. This is deliberately not a full
    /// standard kick table.
    pub fn rotate(&mut self, direction: RotationDir) {
        self.ensure_active();
        let Some(piece) = self.active.as_ref() else {
            return;
        };
        let mut candidate = piece.test_rotate(direction);

        // Side walls, floor and placed tiles block a rotation. The top
        // border stays out of the mask: freshly spawned pieces legitimately
        // overlap it.
        let mut obstacle = self.occupied();
        obstacle |= &self.borders.left;
        obstacle |= &self.borders.right;
        obstacle |= &self.borders.bottom;

        if !(&candidate & &obstacle).is_zero() {
            let kicked_right = &candidate >> 1usize;
            let kicked_left = &candidate << 1usize;
            if (&kicked_right & &obstacle).is_zero() {
                candidate = kicked_right;
            } else if (&kicked_left & &obstacle).is_zero() {
                candidate = kicked_left;
            } else {
                return;
            }
        }

        if let Some(piece) = self.active.as_mut() {
            piece.set_rotate(candidate, direction);
        }
        self.refresh_ghost();
    }

    /// Swap the active piece's identity with the stash slot.
    ///
    /// Returns the pair that was displaced from the slot (None the first
    /// time). With an empty slot the active piece simply vanishes into it
    /// and the next [`active_piece`](Self::active_piece) call draws from the
    /// queue; otherwise the displaced pair respawns at the start position.
    pub fn stash(&mut self) -> Option<(Shape, TileColor)> {
        self.ensure_active();
        let Some(piece) = self.active.take() else {
            return None;
        };
        let displaced = self.stash.swap((piece.shape(), piece.color()));
        if let Some((shape, color)) = displaced {
            let mut respawned = Tetrimino::new(shape, color, self.columns, self.rows);
            respawned.move_to_start();
            self.active = Some(respawned);
        }
        self.refresh_ghost();
        displaced
    }

    /// Find and remove completed rows, compacting everything above them.
    ///
    /// Filters of height four down to one slide up from the bottom one row
    /// at a time; a filter fully contained in placed tiles plus the side
    /// walls marks a completed run. Tiles on the run are removed, tiles
    /// above shift down by `height * columns` (the map is rebuilt, touching
    /// each tile once per run), and the same filter position is re-tested
    /// since the rows above just moved down.
    ///
    /// Returns the cleared run heights in detection order. Standard play
    /// only ever produces height-1 runs; the taller filters exist for
    /// variant rule sets. Once no full row remains, another call returns an
    /// empty list.
    pub fn clear_lines(&mut self) -> Vec<usize> {
        let mut cleared = Vec::new();
        let walls = &self.borders.left | &self.borders.right;

        for height in (1..=4usize).rev() {
            let mut filter = BigUint::zero();
            for row in 0..height {
                filter |= &self.borders.bottom << (row * self.columns);
            }

            while filter < self.borders.top {
                let full_board = &self.occupied() | &walls;
                if (&filter & &full_board) != filter {
                    filter <<= self.columns;
                    continue;
                }
                cleared.push(height);
                self.compact(&filter, height);
            }
        }

        if !cleared.is_empty() {
            self.refresh_ghost();
        }
        cleared
    }

    /// Rebuild the tile map after a completed run: drop the run's tiles,
    /// shift everything above down, leave everything below untouched.
    fn compact(&mut self, filter: &BigUint, height: usize) {
        let shift = height * self.columns;
        let mut rebuilt = BTreeMap::new();
        for (bit, color) in std::mem::take(&mut self.tiles) {
            if !(&bit & filter).is_zero() {
                continue;
            }
            if &bit > filter {
                rebuilt.insert(bit >> shift, color);
            } else {
                rebuilt.insert(bit, color);
            }
        }
        self.tiles = rebuilt;
    }

    fn ensure_active(&mut self) {
        let needs_spawn = match &self.active {
            Some(piece) => piece.is_placed(),
            None => true,
        };
        if needs_spawn {
            let (shape, color) = self.queue.draw();
            let mut piece = Tetrimino::new(shape, color, self.columns, self.rows);
            piece.move_to_start();
            self.active = Some(piece);
            self.refresh_ghost();
        }
    }

    fn refresh_ghost(&mut self) {
        self.ghost = match &self.active {
            Some(piece) if !piece.is_placed() => {
                Some(Ghost::project(piece, &self.drop_obstacles()))
            }
            _ => None,
        };
    }

    /// Union of every placed tile bit
    fn occupied(&self) -> BigUint {
        let mut board = BigUint::zero();
        for bit in self.tiles.keys() {
            board |= bit;
        }
        board
    }

    fn drop_obstacles(&self) -> BigUint {
        &self.borders.bottom | &self.occupied()
    }

    #[cfg(test)]
    pub(crate) fn tiles_mut(&mut self) -> &mut BTreeMap<BigUint, TileColor> {
        &mut self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;
    use tetrion_bitboard::single_bit;
    use tetrion_types::{COLUMNS, ROWS};

    fn matrix() -> Matrix {
        Matrix::new((0, 0), COLUMNS, ROWS, PieceQueue::new(12345))
    }

    /// Fill the interior cells of a board row (walls excluded)
    fn fill_row(m: &mut Matrix, row: usize, color: TileColor) {
        for column in 1..COLUMNS - 1 {
            m.tiles_mut().insert(single_bit(row * COLUMNS + column), color);
        }
    }

    #[test]
    fn test_lazy_spawn_and_reuse() {
        let mut m = matrix();
        let first = m.active_piece().bitboard().clone();
        // Repeated queries return the same piece.
        assert_eq!(m.active_piece().bitboard(), &first);
        // The ghost exists alongside the spawned piece.
        assert!(m.ghost().is_some());
    }

    #[test]
    fn test_spawn_after_lock_draws_from_queue() {
        let mut m = matrix();
        let (next_shape, next_color) = {
            let _ = m.active_piece();
            m.peek_next()
        };
        m.hard_drop();
        let piece = m.active_piece();
        assert_eq!(piece.shape(), next_shape);
        assert_eq!(piece.color(), next_color);
        assert!(!piece.is_placed());
    }

    #[test]
    fn test_move_left_stops_at_wall() {
        let mut m = matrix();
        for _ in 0..COLUMNS {
            m.move_left();
        }
        let at_wall = m.active_piece().bitboard().clone();
        m.move_left();
        let piece = m.active_piece();
        assert_eq!(piece.bitboard(), &at_wall);
        assert!(!piece.is_placed());
        // The piece never enters the wall columns.
        let borders = Borders::new(COLUMNS, ROWS);
        let walls = &borders.left | &borders.right;
        assert!((piece.bitboard() & &walls).is_zero());
    }

    #[test]
    fn test_move_right_stops_at_wall() {
        let mut m = matrix();
        for _ in 0..COLUMNS {
            m.move_right();
        }
        let at_wall = m.active_piece().bitboard().clone();
        m.move_right();
        assert_eq!(m.active_piece().bitboard(), &at_wall);
    }

    #[test]
    fn test_lock_merges_tiles() {
        let mut m = matrix();
        let color = m.active_piece().color();
        m.hard_drop();
        assert_eq!(m.placed_tiles().len(), 4);
        assert!(m.placed_tiles().values().all(|&c| c == color));
        // Every key is a single bit.
        assert!(m.placed_tiles().keys().all(|bit| bit.count_ones() == 1));
    }

    #[test]
    fn test_ghost_predicts_lock_position() {
        let mut m = matrix();
        let _ = m.active_piece();
        m.move_left();
        let ghost_bits = m.ghost().expect("ghost for active piece").bitboard().clone();
        m.hard_drop();
        let locked = m
            .placed_tiles()
            .keys()
            .fold(BigUint::zero(), |acc, bit| acc | bit);
        assert_eq!(locked, ghost_bits);
    }

    #[test]
    fn test_ghost_tracks_moves() {
        let mut m = matrix();
        let _ = m.active_piece();
        let before = m.ghost().expect("ghost").bitboard().clone();
        m.move_left();
        let after = m.ghost().expect("ghost").bitboard().clone();
        assert_eq!(after, &before << 1usize);
    }

    #[test]
    fn test_rotation_changes_active_bits() {
        let mut m = matrix();
        // Walk down into open space so no kick interferes.
        for _ in 0..6 {
            m.move_down();
        }
        let before = m.active_piece().bitboard().clone();
        let shape = m.active_piece().shape();
        m.rotate(RotationDir::Cw);
        let piece = m.active_piece();
        if shape == Shape::O {
            assert_eq!(piece.bitboard(), &before);
        } else {
            assert_ne!(piece.bitboard(), &before);
        }
        assert_eq!(piece.bitboard().count_ones(), 4);
    }

    #[test]
    fn test_rotation_never_enters_walls() {
        let mut m = matrix();
        for _ in 0..4 {
            m.move_down();
        }
        for _ in 0..COLUMNS {
            m.move_left();
        }
        m.rotate(RotationDir::Cw);
        let borders = Borders::new(COLUMNS, ROWS);
        let walls = &borders.left | &borders.right;
        let piece = m.active_piece();
        assert!((piece.bitboard() & &walls).is_zero());
        assert_eq!(piece.bitboard().count_ones(), 4);
    }

    #[test]
    fn test_rotation_rejected_when_boxed_in() {
        let mut m = matrix();
        // O rotates onto itself and cannot be boxed in this way.
        while m.active_piece().shape() == Shape::O {
            m.hard_drop();
        }
        for _ in 0..6 {
            m.move_down();
        }
        let before = m.active_piece().bitboard().clone();
        let rotation = m.active_piece().rotation();

        // Wall the piece in on every side so no candidate or kick fits.
        let candidate = m.active_piece().test_rotate(RotationDir::Cw);
        for bit in decompose_bits(&candidate) {
            if (&bit & &before).is_zero() {
                m.tiles_mut().insert(bit, TileColor::Green);
            }
        }
        let shifted_right = &candidate >> 1usize;
        for bit in decompose_bits(&shifted_right) {
            if (&bit & &before).is_zero() {
                m.tiles_mut().insert(bit, TileColor::Green);
            }
        }
        let shifted_left = &candidate << 1usize;
        for bit in decompose_bits(&shifted_left) {
            if (&bit & &before).is_zero() {
                m.tiles_mut().insert(bit, TileColor::Green);
            }
        }

        m.rotate(RotationDir::Cw);
        let piece = m.active_piece();
        assert_eq!(piece.bitboard(), &before);
        assert_eq!(piece.rotation(), rotation);
    }

    #[test]
    fn test_stash_empty_returns_none() {
        let mut m = matrix();
        let shape = m.active_piece().shape();
        let color = m.active_piece().color();
        let (next_shape, _) = m.peek_next();

        assert_eq!(m.stash(), None);
        assert_eq!(m.stashed(), Some((shape, color)));
        assert!(m.ghost().is_none());

        // The vacated slot refills from the queue, not from the stash.
        assert_eq!(m.active_piece().shape(), next_shape);
    }

    #[test]
    fn test_stash_swaps_back() {
        let mut m = matrix();
        let first = (m.active_piece().shape(), m.active_piece().color());
        m.stash();
        let second = (m.active_piece().shape(), m.active_piece().color());

        let returned = m.stash();
        assert_eq!(returned, Some(first));
        assert_eq!(m.stashed(), Some(second));
        // The displaced pair respawned as the active piece.
        let piece = m.active_piece();
        assert_eq!((piece.shape(), piece.color()), first);
        assert_eq!(piece.rotation(), 0);
    }

    #[test]
    fn test_clear_single_row() {
        let mut m = matrix();
        fill_row(&mut m, 1, TileColor::Red);
        assert_eq!(m.placed_tiles().len(), COLUMNS - 2);

        let cleared = m.clear_lines();
        assert_eq!(cleared, vec![1]);
        assert!(m.placed_tiles().is_empty());
    }

    #[test]
    fn test_o_piece_fills_gap_and_clears() {
        // Find a seed whose first draw is an O, then leave it a two-cell gap
        // on the bottom playable row.
        let mut seed = 1u32;
        let mut m = loop {
            let mut candidate = Matrix::new((0, 0), COLUMNS, ROWS, PieceQueue::new(seed));
            if candidate.active_piece().shape() == Shape::O {
                break candidate;
            }
            seed += 1;
            assert!(seed < 1000, "no seed with a leading O piece");
        };

        // The O drops through columns 4 and 5; fill the rest of the row.
        for column in 1..COLUMNS - 1 {
            if column == 4 || column == 5 {
                continue;
            }
            m.tiles_mut()
                .insert(single_bit(COLUMNS + column), TileColor::Red);
        }
        let before = m.placed_tiles().len();

        m.hard_drop();
        assert_eq!(m.placed_tiles().len(), before + 4);

        let cleared = m.clear_lines();
        assert_eq!(cleared, vec![1]);
        // The completed row is gone; only the O's upper half remains.
        assert_eq!(m.placed_tiles().len(), before + 4 - (COLUMNS - 2));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut m = matrix();
        fill_row(&mut m, 1, TileColor::Red);
        m.tiles_mut()
            .insert(single_bit(2 * COLUMNS + 3), TileColor::Blue);

        assert_eq!(m.clear_lines(), vec![1]);
        assert_eq!(m.clear_lines(), Vec::<usize>::new());
    }

    #[test]
    fn test_clear_tetris_run() {
        let mut m = matrix();
        for row in 1..=4 {
            fill_row(&mut m, row, TileColor::Yellow);
        }
        let cleared = m.clear_lines();
        assert_eq!(cleared, vec![4]);
        assert!(m.placed_tiles().is_empty());
    }

    #[test]
    fn test_clear_separate_runs_compact_between() {
        let mut m = matrix();
        fill_row(&mut m, 1, TileColor::Red);
        fill_row(&mut m, 3, TileColor::Blue);
        let marker = single_bit(5 * COLUMNS + 3);
        m.tiles_mut().insert(marker, TileColor::Green);

        let cleared = m.clear_lines();
        assert_eq!(cleared, vec![1, 1]);

        // Only the marker survives, dropped by two rows.
        assert_eq!(m.placed_tiles().len(), 1);
        let expected = single_bit(3 * COLUMNS + 3);
        assert_eq!(m.placed_tiles().get(&expected), Some(&TileColor::Green));
    }

    #[test]
    fn test_clear_leaves_partial_rows() {
        let mut m = matrix();
        fill_row(&mut m, 1, TileColor::Red);
        // Row 2 is one cell short of full.
        for column in 1..COLUMNS - 2 {
            m.tiles_mut()
                .insert(single_bit(2 * COLUMNS + column), TileColor::Blue);
        }
        let before = m.placed_tiles().len();

        let cleared = m.clear_lines();
        assert_eq!(cleared, vec![1]);
        assert_eq!(m.placed_tiles().len(), before - (COLUMNS - 2));
        // The partial row dropped onto the floor row.
        assert!(m
            .placed_tiles()
            .keys()
            .all(|bit| bit < &(BigUint::one() << (2 * COLUMNS))));
    }

    #[test]
    fn test_game_over_at_top_border() {
        let mut m = matrix();
        assert!(!m.is_game_over());

        m.tiles_mut()
            .insert(single_bit((ROWS - 1) * COLUMNS + 5), TileColor::Purple);
        assert!(m.is_game_over());
    }

    #[test]
    fn test_game_over_check_does_not_mutate() {
        let mut m = matrix();
        m.tiles_mut()
            .insert(single_bit((ROWS - 1) * COLUMNS + 5), TileColor::Purple);
        let tiles_before = m.placed_tiles().clone();
        assert!(m.is_game_over());
        assert!(m.is_game_over());
        assert_eq!(m.placed_tiles(), &tiles_before);
    }

    #[test]
    fn test_tile_coords_applies_origin() {
        let m = Matrix::new((100, 20), COLUMNS, ROWS, PieceQueue::new(1));
        // Bottom-right cell: rightmost column, bottom row.
        let (x, y) = m.tile_coords(&single_bit(0)).expect("single bit");
        assert_eq!(x, (COLUMNS as i32 - 1) * TILE_WIDTH + 100);
        assert_eq!(y, (ROWS as i32 - 1) * TILE_HEIGHT + 20);

        assert!(m.tile_coords(&BigUint::zero()).is_err());
    }
}
