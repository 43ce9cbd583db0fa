//! Win detection
//!
//! Scans every winning line, without stopping at the first match, so that a
//! move completing two lines at once highlights all six cells.

use tracing::debug;

use crate::board::{Board, Symbol, BOARD_SIZE, LINES};

/// Result of scanning a board against the winning lines
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    winner: Option<Symbol>,
    winning_cells: Vec<usize>,
}

impl Verdict {
    /// Symbol of the first completed line in line order, if any
    pub fn winner(&self) -> Option<Symbol> {
        self.winner
    }

    /// Every index lying on a completed line, ascending and deduplicated
    pub fn winning_cells(&self) -> &[usize] {
        &self.winning_cells
    }

    pub fn is_win(&self) -> bool {
        self.winner.is_some()
    }

    /// Flag the winning cells on `board`
    pub fn highlight(&self, board: &mut Board) {
        for &index in &self.winning_cells {
            board.highlight_in_range(index);
        }
    }
}

/// Scan `board` for completed lines
pub fn evaluate(board: &Board) -> Verdict {
    let mut winner = None;
    let mut flagged = [false; BOARD_SIZE];

    for line in &LINES {
        let [a, b, c] = *line;
        let Some(symbol) = board.value(a) else {
            continue;
        };
        if board.value(b) == Some(symbol) && board.value(c) == Some(symbol) {
            debug!(?line, %symbol, "Completed line");
            winner.get_or_insert(symbol);
            flagged[a] = true;
            flagged[b] = true;
            flagged[c] = true;
        }
    }

    let winning_cells = (0..BOARD_SIZE).filter(|&i| flagged[i]).collect();
    Verdict {
        winner,
        winning_cells,
    }
}
