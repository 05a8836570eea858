//! Tetrion (workspace facade crate).
//!
//! This package exposes the `tetrion::{bitboard,core,types}` surface while
//! the implementation lives in dedicated crates under `crates/`.

pub use tetrion_bitboard as bitboard;
pub use tetrion_core as core;
pub use tetrion_types as types;
