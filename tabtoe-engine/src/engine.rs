//! Engine façade
//!
//! `Engine` owns the game state of one session and is the only entry point
//! the presentation layer talks to. Each intent runs one synchronous update
//! cycle: the state machine computes the next state, side effects on the
//! shared medium are applied, and only then is the new state committed. A
//! storage failure therefore aborts the intent and leaves the session on
//! its previous state.

use tabtoe_core::{KeyValueStore, StorageError, Symbol, BOARD_SIZE};
use tracing::{debug, info};

use crate::bot::{BotPolicy, RandomBot};
use crate::bridge::PersistenceBridge;
use crate::config::{ConfigError, EngineConfig};
use crate::intent::{Intent, Outcome, Snapshot, Update};
use crate::machine::{GameState, Mode, Rejection};

/// Error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Game engine for one session
///
/// # Example
///
/// ```rust
/// # use tabtoe_core::MemoryStore;
/// # use tabtoe_engine::{Engine, EngineConfig, Intent, Outcome};
/// let config = EngineConfig { bot_seed: Some(7), ..EngineConfig::default() };
/// let mut engine = Engine::new(config, MemoryStore::new(), MemoryStore::new()).unwrap();
///
/// let update = engine.dispatch(Intent::CellClick(4)).unwrap();
/// assert!(matches!(update.outcome, Outcome::Placed { index: 4, .. }));
/// assert_eq!(update.snapshot.empty_squares_count(), 7);
/// ```
pub struct Engine {
    config: EngineConfig,
    state: GameState,
    bot: Box<dyn BotPolicy>,
    bridge: PersistenceBridge,
}

impl Engine {
    /// Create an engine over a shared and a session-local medium
    ///
    /// The bot is a [`RandomBot`], seeded from `config.bot_seed` when set.
    pub fn new(
        config: EngineConfig,
        shared: impl KeyValueStore,
        local: impl KeyValueStore,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let bot = match config.bot_seed {
            Some(seed) => RandomBot::with_seed(seed),
            None => RandomBot::new(),
        };
        let bridge = PersistenceBridge::new(Box::new(shared), Box::new(local), config.history_key.clone());

        info!(mode = %config.initial_mode, "Engine created");
        Ok(Self {
            state: GameState::new(config.initial_mode),
            config,
            bot: Box::new(bot),
            bridge,
        })
    }

    /// Replace the bot policy
    pub fn with_bot(mut self, bot: impl BotPolicy + 'static) -> Self {
        self.bot = Box::new(bot);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_state(&self.state)
    }

    /// Run one update cycle for `intent`
    pub fn dispatch(&mut self, intent: Intent) -> Result<Update, EngineError> {
        debug!(?intent, "Dispatching intent");

        let outcome = match intent {
            Intent::CellClick(index) => self.click(index)?,
            Intent::SetMode(mode) => self.set_mode(mode),
            Intent::InitMultiplayer => self.init_multiplayer()?,
            Intent::Refresh => self.refresh()?,
            Intent::LoadPreviousGame => self.load_previous_game()?,
        };

        Ok(Update {
            snapshot: self.snapshot(),
            outcome,
        })
    }

    /// Pick up changes other sessions made to the shared history
    ///
    /// Returns `true` if the board changed. Does nothing outside multiplayer
    /// mode or when the shared medium cannot report changes.
    pub fn sync(&mut self) -> Result<bool, EngineError> {
        if self.state.mode() != Mode::Multiplayer || !self.bridge.history_changed() {
            return Ok(false);
        }
        match self.refresh()? {
            Outcome::Refreshed { changed } => Ok(changed),
            _ => Ok(false),
        }
    }

    fn click(&mut self, index: usize) -> Result<Outcome, EngineError> {
        if self.state.is_game_over() {
            let next = self.state.reset();
            if self.state.mode() == Mode::Multiplayer {
                self.bridge.clear_board()?;
            }
            self.state = next;
            info!("Game reset");
            return Ok(Outcome::Reset);
        }

        match self.state.mode() {
            Mode::SinglePlayer => Ok(self.click_single(index)),
            Mode::Multiplayer => self.click_multiplayer(index),
        }
    }

    fn click_single(&mut self, index: usize) -> Outcome {
        let placed = match self.state.place_player(index, &self.config) {
            Ok(placed) => placed,
            Err(rejection) => return Outcome::Rejected(rejection),
        };

        // a winning player move leaves the bot nothing to do
        let (next, bot_reply) = placed.play_bot(self.bot.as_mut(), &self.config);
        self.state = next;

        Outcome::Placed {
            index,
            symbol: Symbol::X,
            bot_reply,
        }
    }

    fn click_multiplayer(&mut self, index: usize) -> Result<Outcome, EngineError> {
        let Some(identity) = self.state.identity() else {
            return Ok(Outcome::Rejected(Rejection::NotJoined));
        };
        let next = match self.state.place_own(index, &self.config) {
            Ok(next) => next,
            Err(rejection) => return Ok(Outcome::Rejected(rejection)),
        };
        let symbol = identity.symbol;

        self.bridge.mirror_move(index, symbol)?;
        self.state = next;

        Ok(Outcome::Placed {
            index,
            symbol,
            bot_reply: None,
        })
    }

    fn set_mode(&mut self, mode: Mode) -> Outcome {
        if self.state.mode() != mode {
            info!(from = %self.state.mode(), to = %mode, "Mode switched");
        }
        self.state = self.state.set_mode(mode);
        Outcome::ModeChanged(mode)
    }

    fn init_multiplayer(&mut self) -> Result<Outcome, EngineError> {
        let join = self.bridge.join()?;

        // rejoining with the same seat keeps the move count
        let identity = match self.state.identity() {
            Some(current)
                if current.session_id == join.identity.session_id
                    && current.symbol == join.identity.symbol =>
            {
                current
            }
            _ => join.identity,
        };

        let mut next = self.state.with_identity(identity);
        if let Some(history) = join.existing {
            next = next.with_shared_board(history.values(), &self.config);
        }
        self.state = next;

        Ok(Outcome::Joined(identity))
    }

    fn refresh(&mut self) -> Result<Outcome, EngineError> {
        let Some(history) = self.bridge.read_history()? else {
            return Ok(Outcome::Refreshed { changed: false });
        };
        Ok(self.adopt(history.values()))
    }

    fn load_previous_game(&mut self) -> Result<Outcome, EngineError> {
        let cells = self.bridge.load_cells()?;
        Ok(self.adopt(cells.values()))
    }

    fn adopt(&mut self, values: [Option<Symbol>; BOARD_SIZE]) -> Outcome {
        let next = self.state.with_shared_board(values, &self.config);
        let changed = next.board() != self.state.board();
        if changed {
            debug!("Board refreshed from shared medium");
        }
        self.state = next;
        Outcome::Refreshed { changed }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}
