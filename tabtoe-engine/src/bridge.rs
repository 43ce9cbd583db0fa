//! Persistence bridge between the engine and its two storage media
//!
//! The shared medium holds the board history (a JSON array of nine strings,
//! each `""`, `"X"` or `"O"`) plus one key per occupied cell. The
//! session-local medium remembers which seat and symbol this session claimed,
//! so a reload keeps its identity.
//!
//! Writes are immediate and unsynchronized: the last writer wins and nothing
//! detects a conflicting write from another session.

use std::fmt;

use tabtoe_core::{Board, KeyValueStore, StorageError, Subscription, Symbol, BOARD_SIZE};
use tracing::{debug, info, warn};

const ID_KEY: &str = "id";
const SYMBOL_KEY: &str = "symbol";

/// Errors raised while decoding the shared history
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("Malformed history: {0}")]
    Malformed(String),
    #[error("History has {actual} entries, expected {expected}")]
    WrongLength { expected: usize, actual: usize },
    #[error("Invalid value {value:?} at history index {index}")]
    InvalidValue { index: usize, value: String },
}

/// Which of the two seats a session occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionId {
    First,
    Second,
}

impl SessionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionId::First => "1",
            SessionId::Second => "2",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "1" => Some(SessionId::First),
            "2" => Some(SessionId::Second),
            _ => None,
        }
    }

    /// Symbol handed to a session claiming this seat
    pub fn default_symbol(&self) -> Symbol {
        match self {
            SessionId::First => Symbol::X,
            SessionId::Second => Symbol::O,
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of this session in a multiplayer game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub session_id: SessionId,
    pub symbol: Symbol,
    /// Moves this session has had accepted since it joined
    pub move_count: u32,
}

impl PlayerIdentity {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            symbol: session_id.default_symbol(),
            move_count: 0,
        }
    }
}

/// Board values mirrored into the shared medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SharedHistory {
    values: [Option<Symbol>; BOARD_SIZE],
}

impl SharedHistory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_values(values: [Option<Symbol>; BOARD_SIZE]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> [Option<Symbol>; BOARD_SIZE] {
        self.values
    }

    pub fn set(&mut self, index: usize, symbol: Symbol) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = Some(symbol);
        }
    }

    pub fn to_board(&self) -> Board {
        Board::from_values(self.values)
    }

    /// Decode the JSON array form
    pub fn parse(raw: &str) -> Result<Self, HistoryError> {
        let entries: Vec<String> =
            serde_json::from_str(raw).map_err(|e| HistoryError::Malformed(e.to_string()))?;

        if entries.len() != BOARD_SIZE {
            return Err(HistoryError::WrongLength {
                expected: BOARD_SIZE,
                actual: entries.len(),
            });
        }

        let mut values = [None; BOARD_SIZE];
        for (index, entry) in entries.into_iter().enumerate() {
            values[index] = match entry.as_str() {
                "" => None,
                other => Some(other.parse().map_err(|_| HistoryError::InvalidValue {
                    index,
                    value: entry.clone(),
                })?),
            };
        }

        Ok(Self { values })
    }

    /// Encode as a JSON array of nine strings
    pub fn to_json(&self) -> String {
        let entries: Vec<serde_json::Value> = self
            .values
            .iter()
            .map(|value| value.map(|s| s.as_str()).unwrap_or("").into())
            .collect();
        serde_json::Value::Array(entries).to_string()
    }
}

/// Result of joining a multiplayer game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub identity: PlayerIdentity,
    /// History found in the shared medium, `None` if this session created it
    pub existing: Option<SharedHistory>,
}

/// Reads and writes game state in the shared and session-local media
pub struct PersistenceBridge {
    shared: Box<dyn KeyValueStore>,
    local: Box<dyn KeyValueStore>,
    history_key: String,
    subscription: Option<Subscription>,
}

impl PersistenceBridge {
    pub fn new(
        shared: Box<dyn KeyValueStore>,
        local: Box<dyn KeyValueStore>,
        history_key: impl Into<String>,
    ) -> Self {
        Self {
            shared,
            local,
            history_key: history_key.into(),
            subscription: None,
        }
    }

    /// Read the shared history
    ///
    /// `Ok(None)` if no session has created it yet.
    pub fn read_history(&self) -> Result<Option<SharedHistory>, StorageError> {
        match self.shared.get(&self.history_key)? {
            Some(raw) => SharedHistory::parse(&raw)
                .map(Some)
                .map_err(|e| StorageError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    /// Read the shared history, treating unreadable or corrupt data as absent
    fn read_history_or_default(&self) -> Option<SharedHistory> {
        match self.read_history() {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, key = %self.history_key, "Discarding unreadable history");
                None
            }
        }
    }

    fn write_history(&self, history: &SharedHistory) -> Result<(), StorageError> {
        self.shared.set(&self.history_key, &history.to_json())
    }

    /// Enter multiplayer: create or read the shared history and claim a seat
    ///
    /// The first session to join creates an empty history and takes seat 1
    /// (`X`); later sessions read the existing history and take seat 2
    /// (`O`). A seat already cached in the session-local medium is reused.
    pub fn join(&mut self) -> Result<Join, StorageError> {
        let existing = self.read_history_or_default();

        let identity = match existing {
            Some(_) => self.claim(SessionId::Second)?,
            None => {
                self.write_history(&SharedHistory::empty())?;
                self.claim(SessionId::First)?
            }
        };

        if self.subscription.is_none() {
            match self.shared.subscribe() {
                Ok(subscription) => self.subscription = Some(subscription),
                Err(e) => warn!(error = %e, "Shared medium cannot be watched"),
            }
        }

        info!(
            session_id = %identity.session_id,
            symbol = %identity.symbol,
            created = existing.is_none(),
            "Joined multiplayer game"
        );
        Ok(Join { identity, existing })
    }

    /// Identity cached in the session-local medium, if any
    pub fn cached_identity(&self) -> Result<Option<PlayerIdentity>, StorageError> {
        let id = self.local.get(ID_KEY)?;
        let symbol = self.local.get(SYMBOL_KEY)?;

        let (Some(id), Some(symbol)) = (id, symbol) else {
            return Ok(None);
        };

        match (SessionId::parse(&id), symbol.parse::<Symbol>()) {
            (Some(session_id), Ok(symbol)) => Ok(Some(PlayerIdentity {
                session_id,
                symbol,
                move_count: 0,
            })),
            _ => {
                warn!(%id, %symbol, "Ignoring corrupt cached identity");
                Ok(None)
            }
        }
    }

    fn claim(&self, session_id: SessionId) -> Result<PlayerIdentity, StorageError> {
        if let Some(cached) = self.cached_identity()? {
            debug!(session_id = %cached.session_id, "Reusing cached identity");
            return Ok(cached);
        }

        let identity = PlayerIdentity::new(session_id);
        self.local.set(ID_KEY, identity.session_id.as_str())?;
        self.local.set(SYMBOL_KEY, identity.symbol.as_str())?;
        Ok(identity)
    }

    /// Write an accepted move into the shared medium
    ///
    /// Read-modify-write of the history, so cells written by the other
    /// session since our last read are preserved. The per-cell key is
    /// written first and restored if the history write fails, so a failed
    /// move leaves no trace in the history.
    pub fn mirror_move(&self, index: usize, symbol: Symbol) -> Result<(), StorageError> {
        let cell_key = index.to_string();
        let previous = self.shared.get(&cell_key)?;
        let mut history = self.read_history_or_default().unwrap_or_default();
        history.set(index, symbol);

        self.shared.set(&cell_key, symbol.as_str())?;
        if let Err(e) = self.write_history(&history) {
            let restored = match &previous {
                Some(value) => self.shared.set(&cell_key, value),
                None => self.shared.remove(&cell_key),
            };
            if let Err(rollback) = restored {
                warn!(index, error = %rollback, "Failed to restore cell entry");
            }
            return Err(e);
        }

        debug!(index, %symbol, "Mirrored move");
        Ok(())
    }

    /// Clear the shared board: per-cell keys are removed and the history is
    /// rewritten as nine empty slots
    ///
    /// Seat identities live in each session's own medium and survive.
    pub fn clear_board(&self) -> Result<(), StorageError> {
        for index in 0..BOARD_SIZE {
            self.shared.remove(&index.to_string())?;
        }
        self.write_history(&SharedHistory::empty())?;
        info!("Cleared shared board");
        Ok(())
    }

    /// Rebuild board values from the per-cell keys
    pub fn load_cells(&self) -> Result<SharedHistory, StorageError> {
        let mut history = SharedHistory::empty();

        for key in self.shared.keys()? {
            let Ok(index) = key.parse::<usize>() else {
                continue;
            };
            if index >= BOARD_SIZE {
                continue;
            }
            let Some(raw) = self.shared.get(&key)? else {
                continue;
            };
            match raw.parse::<Symbol>() {
                Ok(symbol) => history.set(index, symbol),
                Err(_) => warn!(%key, value = %raw, "Skipping corrupt cell entry"),
            }
        }

        Ok(history)
    }

    /// Whether the shared history changed since the last call
    ///
    /// Always `false` before joining or when the medium cannot be watched.
    pub fn history_changed(&self) -> bool {
        self.subscription
            .as_ref()
            .map(|subscription| {
                subscription
                    .drain()
                    .iter()
                    .any(|key| *key == self.history_key)
            })
            .unwrap_or(false)
    }
}

impl fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceBridge")
            .field("history_key", &self.history_key)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabtoe_core::MemoryStore;

    fn bridge(shared: &MemoryStore) -> PersistenceBridge {
        PersistenceBridge::new(Box::new(shared.clone()), Box::new(MemoryStore::new()), "history")
    }

    #[test]
    fn test_history_parse() {
        let history = SharedHistory::parse(r#"["X", "", "O", "", "", "", "", "", ""]"#).unwrap();
        let values = history.values();

        assert_eq!(values[0], Some(Symbol::X));
        assert_eq!(values[1], None);
        assert_eq!(values[2], Some(Symbol::O));
        assert!(values[3..].iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_history_json_format() {
        let mut history = SharedHistory::empty();
        history.set(4, Symbol::X);
        assert_eq!(history.to_json(), r#"["","","","","X","","","",""]"#);
        assert_eq!(SharedHistory::parse(&history.to_json()).unwrap(), history);
    }

    #[test]
    fn test_history_parse_errors() {
        assert!(matches!(
            SharedHistory::parse("not json"),
            Err(HistoryError::Malformed(_))
        ));
        assert_eq!(
            SharedHistory::parse(r#"["", ""]"#),
            Err(HistoryError::WrongLength { expected: 9, actual: 2 })
        );
        assert_eq!(
            SharedHistory::parse(r#"["", "", "Z", "", "", "", "", "", ""]"#),
            Err(HistoryError::InvalidValue { index: 2, value: "Z".to_string() })
        );
    }

    #[test]
    fn test_first_join_creates_history() {
        let shared = MemoryStore::new();
        let mut first = bridge(&shared);

        let join = first.join().unwrap();
        assert_eq!(join.identity, PlayerIdentity::new(SessionId::First));
        assert_eq!(join.identity.symbol, Symbol::X);
        assert_eq!(join.existing, None);
        assert_eq!(first.read_history().unwrap(), Some(SharedHistory::empty()));
    }

    #[test]
    fn test_second_join_reads_history() {
        let shared = MemoryStore::new();
        let mut first = bridge(&shared);
        first.join().unwrap();
        first.mirror_move(0, Symbol::X).unwrap();

        let mut second = bridge(&shared);
        let join = second.join().unwrap();

        assert_eq!(join.identity.session_id, SessionId::Second);
        assert_eq!(join.identity.symbol, Symbol::O);
        assert_eq!(join.existing.unwrap().values()[0], Some(Symbol::X));
    }

    #[test]
    fn test_cached_identity_survives_rejoin() {
        let shared = MemoryStore::new();
        let local = MemoryStore::new();
        let mut first =
            PersistenceBridge::new(Box::new(shared.clone()), Box::new(local.clone()), "history");
        first.join().unwrap();

        // reload: history exists now, but the session keeps seat 1
        let mut reloaded = PersistenceBridge::new(Box::new(shared), Box::new(local), "history");
        let join = reloaded.join().unwrap();
        assert_eq!(join.identity.session_id, SessionId::First);
        assert_eq!(join.identity.symbol, Symbol::X);
        assert!(join.existing.is_some());
    }

    #[test]
    fn test_corrupt_cached_identity_is_reclaimed() {
        let shared = MemoryStore::new();
        let local = MemoryStore::new();
        local.set(ID_KEY, "7").unwrap();
        local.set(SYMBOL_KEY, "Q").unwrap();

        let mut bridge =
            PersistenceBridge::new(Box::new(shared), Box::new(local.clone()), "history");
        let join = bridge.join().unwrap();

        assert_eq!(join.identity.session_id, SessionId::First);
        assert_eq!(local.get(ID_KEY).unwrap(), Some("1".to_string()));
        assert_eq!(local.get(SYMBOL_KEY).unwrap(), Some("X".to_string()));
    }

    #[test]
    fn test_corrupt_history_is_recreated() {
        let shared = MemoryStore::new();
        shared.set("history", "{ broken").unwrap();

        let mut bridge = bridge(&shared);
        assert!(matches!(bridge.read_history(), Err(StorageError::Corrupt(_))));

        let join = bridge.join().unwrap();
        assert_eq!(join.existing, None);
        assert_eq!(join.identity.session_id, SessionId::First);
        assert_eq!(bridge.read_history().unwrap(), Some(SharedHistory::empty()));
    }

    #[test]
    fn test_mirror_move_preserves_foreign_cells() {
        let shared = MemoryStore::new();
        let a = bridge(&shared);
        let b = bridge(&shared);

        a.mirror_move(0, Symbol::X).unwrap();
        b.mirror_move(8, Symbol::O).unwrap();

        let values = a.read_history().unwrap().unwrap().values();
        assert_eq!(values[0], Some(Symbol::X));
        assert_eq!(values[8], Some(Symbol::O));
        assert_eq!(shared.get("0").unwrap(), Some("X".to_string()));
        assert_eq!(shared.get("8").unwrap(), Some("O".to_string()));
    }

    #[test]
    fn test_failed_history_write_restores_cell_entry() {
        // room for the empty history plus the cell entry, not the longer history
        let shared = MemoryStore::with_quota(37);
        let mut a = bridge(&shared);
        a.join().unwrap();

        let result = a.mirror_move(0, Symbol::X);
        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(shared.get("0").unwrap(), None);
        assert_eq!(a.read_history().unwrap(), Some(SharedHistory::empty()));
    }

    #[test]
    fn test_clear_board() {
        let shared = MemoryStore::new();
        let bridge = bridge(&shared);
        bridge.mirror_move(0, Symbol::X).unwrap();
        bridge.mirror_move(4, Symbol::O).unwrap();

        bridge.clear_board().unwrap();

        assert_eq!(shared.get("0").unwrap(), None);
        assert_eq!(shared.get("4").unwrap(), None);
        assert_eq!(bridge.read_history().unwrap(), Some(SharedHistory::empty()));
    }

    #[test]
    fn test_load_cells() {
        let shared = MemoryStore::new();
        shared.set("0", "X").unwrap();
        shared.set("5", "O").unwrap();
        shared.set("7", "garbage").unwrap();
        shared.set("12", "X").unwrap();
        shared.set("history", "[]").unwrap();

        let values = bridge(&shared).load_cells().unwrap().values();
        assert_eq!(values[0], Some(Symbol::X));
        assert_eq!(values[5], Some(Symbol::O));
        assert_eq!(values[7], None);
        assert_eq!(values.iter().filter(|v| v.is_some()).count(), 2);
    }

    #[test]
    fn test_history_changed_after_join() {
        let shared = MemoryStore::new();
        let mut watcher = bridge(&shared);
        assert!(!watcher.history_changed());

        watcher.join().unwrap();
        assert!(!watcher.history_changed());

        let other = bridge(&shared);
        other.mirror_move(3, Symbol::O).unwrap();
        assert!(watcher.history_changed());
        assert!(!watcher.history_changed());
    }
}
