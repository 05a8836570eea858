//! RNG module - deterministic 7-bag piece queue
//!
//! Shapes are drawn from a bag of all seven, shuffled; when the bag runs
//! dry a fresh one is shuffled in. Any aligned run of seven draws is
//! therefore a permutation of the full shape set.
//!
//! The queue keeps a seven-item lookahead so callers can preview upcoming
//! pieces, and cycles tile colors through the palette independently of the
//! shape stream.

use arrayvec::ArrayVec;

use tetrion_types::{Shape, TileColor};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// Infinite, restartable stream of shapes honoring the 7-bag rule
#[derive(Debug, Clone)]
struct ShapeBag {
    bag: ArrayVec<Shape, 7>,
    cursor: usize,
    rng: SimpleRng,
}

impl ShapeBag {
    fn new(seed: u32) -> Self {
        let mut stream = Self {
            bag: ArrayVec::new(),
            cursor: 0,
            rng: SimpleRng::new(seed),
        };
        stream.refill();
        stream
    }

    fn refill(&mut self) {
        self.bag = ArrayVec::from(Shape::ALL);
        self.rng.shuffle(&mut self.bag);
        self.cursor = 0;
    }

    fn next(&mut self) -> Shape {
        if self.cursor >= self.bag.len() {
            self.refill();
        }
        let shape = self.bag[self.cursor];
        self.cursor += 1;
        shape
    }
}

/// Peekable queue of upcoming pieces with palette-cycled colors
#[derive(Debug, Clone)]
pub struct PieceQueue {
    bag: ShapeBag,
    lookahead: ArrayVec<Shape, 7>,
    next_color: TileColor,
    color_cursor: usize,
}

impl PieceQueue {
    pub fn new(seed: u32) -> Self {
        let mut bag = ShapeBag::new(seed);
        let mut lookahead = ArrayVec::new();
        for _ in 0..lookahead.capacity() {
            lookahead.push(bag.next());
        }
        Self {
            bag,
            lookahead,
            next_color: TileColor::PALETTE[0],
            color_cursor: 1,
        }
    }

    /// The shape and color the next [`draw`](Self::draw) will return
    pub fn peek(&self) -> (Shape, TileColor) {
        (self.lookahead[0], self.next_color)
    }

    /// Upcoming shapes, nearest first
    pub fn preview(&self) -> &[Shape] {
        &self.lookahead
    }

    /// Take the next piece, refilling the lookahead and advancing the
    /// color cycle.
    pub fn draw(&mut self) -> (Shape, TileColor) {
        let shape = self.lookahead.remove(0);
        self.lookahead.push(self.bag.next());

        let color = self.next_color;
        self.next_color = TileColor::PALETTE[self.color_cursor % TileColor::PALETTE.len()];
        self.color_cursor = self.color_cursor.wrapping_add(1);

        (shape, color)
    }
}

impl Default for PieceQueue {
    fn default() -> Self {
        Self::new(1)
    }
}
