//! Core types for the tabtoe tic-tac-toe engine
//!
//! This crate provides the pieces the game engine is assembled from:
//! - `Board`: the 3x3 grid of cells and the fixed winning lines
//! - `evaluate`: win detection over every line
//! - `KeyValueStore`: repository interface over a storage medium
//! - `MemoryStore`: in-memory medium, shareable between sessions

pub mod board;
pub mod rules;
pub mod storage;
pub mod memory;

// Re-export main types for convenience
pub use board::{Board, BoardError, Cell, Symbol, BOARD_SIZE, LINES};
pub use rules::{evaluate, Verdict};
pub use storage::{KeyValueStore, StorageError, Subscription};
pub use memory::MemoryStore;
