//! Board model for the 3x3 grid
//!
//! The board is an ordered sequence of nine cells. Index order is fixed and
//! defines membership in the winning lines, so cell ids are the 0-based
//! indices `0..9` read left to right, top to bottom.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of cells on the board
pub const BOARD_SIZE: usize = 9;

/// The eight winning triples: rows, columns, diagonals
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2], [3, 4, 5], [6, 7, 8], // rows
    [0, 3, 6], [1, 4, 7], [2, 5, 8], // columns
    [0, 4, 8], [2, 4, 6],           // diagonals
];

/// A mark a player can place on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::X => "X",
            Symbol::O => "O",
        }
    }

    /// The other player's symbol
    pub fn opponent(&self) -> Symbol {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Symbol::X),
            "O" => Ok(Symbol::O),
            other => Err(BoardError::UnknownSymbol(other.to_string())),
        }
    }
}

/// Errors raised by board operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Cell {index} is already occupied")]
    Occupied { index: usize },
    #[error("Cell index {index} is out of range (0..{})", BOARD_SIZE)]
    OutOfRange { index: usize },
    #[error("Unknown symbol: {0:?}")]
    UnknownSymbol(String),
}

/// One square of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    id: usize,
    value: Option<Symbol>,
    highlighted: bool,
}

impl Cell {
    fn empty(id: usize) -> Self {
        Self {
            id,
            value: None,
            highlighted: false,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn value(&self) -> Option<Symbol> {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Whether the cell belongs to a completed winning line
    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }
}

/// The 3x3 grid of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create an empty, unhighlighted board
    pub fn new() -> Self {
        Self {
            cells: std::array::from_fn(Cell::empty),
        }
    }

    /// Build a board from raw cell values; no cell is highlighted
    pub fn from_values(values: [Option<Symbol>; BOARD_SIZE]) -> Self {
        let mut board = Self::new();
        for (cell, value) in board.cells.iter_mut().zip(values) {
            cell.value = value;
        }
        board
    }

    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Result<&Cell, BoardError> {
        self.cells
            .get(index)
            .ok_or(BoardError::OutOfRange { index })
    }

    /// Value at `index`, or `None` for an empty or out-of-range cell
    pub fn value(&self, index: usize) -> Option<Symbol> {
        self.cells.get(index).and_then(|cell| cell.value)
    }

    pub fn values(&self) -> [Option<Symbol>; BOARD_SIZE] {
        std::array::from_fn(|i| self.cells[i].value)
    }

    /// Place `symbol` at `index`
    ///
    /// Never overwrites: an occupied cell is left untouched and the call
    /// fails with [`BoardError::Occupied`].
    pub fn set_value(&mut self, index: usize, symbol: Symbol) -> Result<(), BoardError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(BoardError::OutOfRange { index })?;

        if cell.value.is_some() {
            return Err(BoardError::Occupied { index });
        }

        cell.value = Some(symbol);
        Ok(())
    }

    /// Flag a cell as part of a winning line
    pub fn highlight(&mut self, index: usize) -> Result<(), BoardError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(BoardError::OutOfRange { index })?;
        cell.highlighted = true;
        Ok(())
    }

    /// Highlight a cell known to be in range, such as one taken from [`LINES`]
    pub(crate) fn highlight_in_range(&mut self, index: usize) {
        self.cells[index].highlighted = true;
    }

    /// Clear every value and highlight flag
    pub fn reset(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.value = None;
            cell.highlighted = false;
        }
    }

    /// Indices of empty cells in ascending order
    pub fn empty_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .filter(|cell| cell.is_empty())
            .map(|cell| cell.id)
            .collect()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }

    pub fn is_full(&self) -> bool {
        self.empty_count() == 0
    }

    pub fn highlighted_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .filter(|cell| cell.highlighted)
            .map(|cell| cell.id)
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
