//! Turn and mode state machine
//!
//! `GameState` is an immutable value: every transition takes `&self` and
//! returns the next state, leaving the caller free to discard it (for
//! example when persisting the move fails).
//!
//! A single-player turn runs through the phases explicitly:
//!
//! ```text
//! WaitingForPlayer --click--> PlayerMoved --bot--> BotMoved --click--> PlayerMoved ...
//!         \                        \                  \
//!          `--------- win ----------`------ win -------`--> GameOver --click--> WaitingForPlayer
//! ```
//!
//! The win check after the player's move happens before the bot is asked to
//! move, so a winning player move ends the game without a bot reply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tabtoe_core::{evaluate, Board, Symbol, BOARD_SIZE};
use tracing::{debug, info, warn};

use crate::bot::BotPolicy;
use crate::bridge::PlayerIdentity;
use crate::config::EngineConfig;

/// Which kind of game the engine is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "single")]
    SinglePlayer,
    #[serde(rename = "multiplayer")]
    Multiplayer,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::SinglePlayer => "single",
            Mode::Multiplayer => "multiplayer",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Mode::SinglePlayer),
            "multiplayer" => Ok(Mode::Multiplayer),
            other => Err(format!("unknown mode '{}', expected 'single' or 'multiplayer'", other)),
        }
    }
}

/// Where the current game stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No move made since the last reset
    WaitingForPlayer,
    /// The player has moved and the bot has not replied yet
    PlayerMoved,
    /// The bot has replied; the player moves next
    BotMoved,
    /// A line was completed (or the bot found no empty cell)
    GameOver,
}

/// Why a click left the state unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    Occupied { index: usize },
    OutOfRange { index: usize },
    /// The bot still owes a reply
    NotYourTurn,
    /// Multiplayer click before this session claimed a seat
    NotJoined,
}

/// Read-only status projection for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStatus {
    pub phase: Phase,
    pub mode: Mode,
    pub is_game_over: bool,
    pub is_bot_turn: bool,
    /// Games won by `X`, across resets
    pub player_wins: u32,
    /// Games won by `O`, across resets
    pub bot_wins: u32,
}

/// Complete state of one session's game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    phase: Phase,
    mode: Mode,
    player_wins: u32,
    bot_wins: u32,
    identity: Option<PlayerIdentity>,
}

impl GameState {
    /// Create the initial state for `mode`
    pub fn new(mode: Mode) -> Self {
        Self {
            board: Board::new(),
            phase: Phase::WaitingForPlayer,
            mode,
            player_wins: 0,
            bot_wins: 0,
            identity: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn identity(&self) -> Option<PlayerIdentity> {
        self.identity
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn is_bot_turn(&self) -> bool {
        self.phase == Phase::PlayerMoved
    }

    pub fn status(&self) -> GameStatus {
        GameStatus {
            phase: self.phase,
            mode: self.mode,
            is_game_over: self.is_game_over(),
            is_bot_turn: self.is_bot_turn(),
            player_wins: self.player_wins,
            bot_wins: self.bot_wins,
        }
    }

    /// Record a new mode; the board is left as it is
    pub fn set_mode(&self, mode: Mode) -> Self {
        Self { mode, ..*self }
    }

    pub fn with_identity(&self, identity: PlayerIdentity) -> Self {
        Self {
            identity: Some(identity),
            ..*self
        }
    }

    /// Clear the board and start a new game; win tallies are kept
    pub fn reset(&self) -> Self {
        let mut next = *self;
        next.board.reset();
        next.phase = Phase::WaitingForPlayer;
        next
    }

    /// Place the player's `X` at `index` and run the win check
    pub fn place_player(&self, index: usize, config: &EngineConfig) -> Result<Self, Rejection> {
        if self.is_bot_turn() {
            return Err(Rejection::NotYourTurn);
        }

        let mut next = *self;
        place(&mut next.board, index, Symbol::X)?;
        next.phase = Phase::PlayerMoved;
        Ok(next.settle(config))
    }

    /// Let the bot reply to the player's move and run the win check
    ///
    /// Only acts in [`Phase::PlayerMoved`]. With no empty cell left the game
    /// ends without touching the board. Returns the cell the bot took.
    pub fn play_bot(&self, bot: &mut dyn BotPolicy, config: &EngineConfig) -> (Self, Option<usize>) {
        if !self.is_bot_turn() {
            return (*self, None);
        }

        let mut next = *self;
        let empty = next.board.empty_indices();
        if empty.is_empty() {
            debug!("Bot found no empty cell, ending game");
            next.phase = Phase::GameOver;
            return (next, None);
        }

        let cell = match bot.select_cell(&next.board, &empty) {
            Some(cell) if empty.contains(&cell) => cell,
            other => {
                warn!(?other, "Bot chose an unavailable cell, taking the first empty one");
                empty[0]
            }
        };

        if let Err(e) = next.board.set_value(cell, Symbol::O) {
            warn!(cell, error = %e, "Bot move refused, leaving the turn open");
            return (*self, None);
        }
        next.phase = Phase::BotMoved;
        (next.settle(config), Some(cell))
    }

    /// Place this session's own symbol at `index` and run the win check
    pub fn place_own(&self, index: usize, config: &EngineConfig) -> Result<Self, Rejection> {
        let identity = self.identity.ok_or(Rejection::NotJoined)?;

        let mut next = *self;
        place(&mut next.board, index, identity.symbol)?;
        if let Some(identity) = next.identity.as_mut() {
            identity.move_count += 1;
        }
        Ok(next.settle(config))
    }

    /// Adopt board values read from the shared medium
    ///
    /// Identical values leave the state untouched. An all-empty board means
    /// the other session reset the game. Anything else is win-checked, so a
    /// line completed by the other session ends the game here too. A
    /// finished game meeting a board without a completed line means the
    /// other session has already started the next game.
    pub fn with_shared_board(&self, values: [Option<Symbol>; BOARD_SIZE], config: &EngineConfig) -> Self {
        if self.board.values() == values {
            return *self;
        }

        let mut next = *self;
        next.board = Board::from_values(values);

        if values.iter().all(Option::is_none) {
            next.phase = Phase::WaitingForPlayer;
            return next;
        }

        if self.is_game_over() {
            let verdict = evaluate(&next.board);
            if verdict.is_win() {
                // already tallied, only refresh the highlights
                verdict.highlight(&mut next.board);
                return next;
            }
            debug!("Shared board moved on to a new game");
        }

        next.phase = Phase::WaitingForPlayer;
        next.settle(config)
    }

    /// Run the win check and end the game on a completed line
    fn settle(mut self, config: &EngineConfig) -> Self {
        let verdict = evaluate(&self.board);

        if let Some(winner) = verdict.winner() {
            verdict.highlight(&mut self.board);
            match winner {
                Symbol::X => self.player_wins += 1,
                Symbol::O => self.bot_wins += 1,
            }
            self.phase = Phase::GameOver;
            info!(%winner, cells = ?verdict.winning_cells(), "Game won");
        } else if config.draw_is_terminal && self.board.is_full() {
            self.phase = Phase::GameOver;
            info!("Game drawn");
        }

        self
    }
}

fn place(board: &mut Board, index: usize, symbol: Symbol) -> Result<(), Rejection> {
    if index >= BOARD_SIZE {
        return Err(Rejection::OutOfRange { index });
    }
    board
        .set_value(index, symbol)
        .map_err(|_| Rejection::Occupied { index })
}
