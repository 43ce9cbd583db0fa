//! Intents accepted by the engine and the updates it answers with

use tabtoe_core::{Board, Symbol};

use crate::bridge::PlayerIdentity;
use crate::machine::{GameState, GameStatus, Mode, Rejection};

/// A request from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// The user clicked cell `0..9`
    CellClick(usize),
    /// Switch between single-player and multiplayer
    SetMode(Mode),
    /// Join (or create) the shared multiplayer game
    InitMultiplayer,
    /// Re-read the shared history into the board
    Refresh,
    /// Rebuild the board from the per-cell shared entries
    LoadPreviousGame,
}

/// What an intent did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A symbol was placed, possibly followed by the bot's reply
    Placed {
        index: usize,
        symbol: Symbol,
        bot_reply: Option<usize>,
    },
    /// The click was refused and nothing changed
    Rejected(Rejection),
    /// A click on a finished game started a new one
    Reset,
    ModeChanged(Mode),
    Joined(PlayerIdentity),
    /// Shared state was read back; `changed` tells whether the board moved
    Refreshed { changed: bool },
}

/// Read-only view of the engine after an intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub board: Board,
    pub status: GameStatus,
    pub identity: Option<PlayerIdentity>,
}

impl Snapshot {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            board: *state.board(),
            status: state.status(),
            identity: state.identity(),
        }
    }

    /// Number of cells still empty
    pub fn empty_squares_count(&self) -> usize {
        self.board.empty_count()
    }
}

/// Answer to a dispatched intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Update {
    pub snapshot: Snapshot,
    pub outcome: Outcome,
}
