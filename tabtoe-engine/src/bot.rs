use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use tabtoe_core::Board;

/// Trait for automated opponent move selection
pub trait BotPolicy: Send {
    /// Pick a cell for the bot given the current board and its empty cells
    ///
    /// `empty` is never empty when called from the engine. Returning a cell
    /// outside `empty` is treated as a policy bug and corrected by the
    /// engine.
    fn select_cell(&mut self, board: &Board, empty: &[usize]) -> Option<usize>;
}

/// Bot that picks uniformly at random among the empty cells
#[derive(Debug, Clone)]
pub struct RandomBot {
    rng: ChaCha20Rng,
}

impl RandomBot {
    pub fn new() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Deterministic bot for reproducible games and tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomBot {
    fn default() -> Self {
        Self::new()
    }
}

impl BotPolicy for RandomBot {
    fn select_cell(&mut self, _board: &Board, empty: &[usize]) -> Option<usize> {
        if empty.is_empty() {
            return None;
        }
        let pick = self.rng.gen_range(0..empty.len());
        Some(empty[pick])
    }
}
