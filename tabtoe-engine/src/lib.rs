//! Tic-tac-toe game engine shared between browser sessions
//!
//! This crate assembles the engine from the core types:
//! - `GameState`: immutable turn/mode state machine
//! - `BotPolicy`: automated opponent, `RandomBot` by default
//! - `PersistenceBridge`: mirrors the board into a shared medium and
//!   remembers each session's seat
//! - `Engine`: the façade that turns intents into snapshots

pub mod bot;
pub mod bridge;
pub mod config;
pub mod engine;
pub mod intent;
pub mod machine;

// Re-export main types for convenience
pub use bot::{BotPolicy, RandomBot};
pub use bridge::{HistoryError, PersistenceBridge, PlayerIdentity, SessionId, SharedHistory};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineError};
pub use intent::{Intent, Outcome, Snapshot, Update};
pub use machine::{GameState, GameStatus, Mode, Phase, Rejection};
