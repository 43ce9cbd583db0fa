use serde::{Deserialize, Serialize};

use crate::machine::Mode;

/// Error type for engine configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid engine config: {0}")]
    Invalid(String),
}

/// Engine configuration
///
/// Every field has a default, so an empty TOML document is a valid config.
///
/// ```toml
/// initial_mode = "multiplayer"
/// draw_is_terminal = true
/// bot_seed = 42
/// history_key = "history"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Mode the engine starts in
    pub initial_mode: Mode,
    /// End the game when the board fills up without a winning line
    pub draw_is_terminal: bool,
    /// Seed for the bot's generator, entropy when absent
    pub bot_seed: Option<u64>,
    /// Shared-medium key holding the serialized board history
    pub history_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_mode: Mode::SinglePlayer,
            draw_is_terminal: false,
            bot_seed: None,
            history_key: "history".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_key.is_empty() {
            return Err(ConfigError::Invalid("history_key cannot be empty".to_string()));
        }

        // numeric keys are reserved for per-cell entries
        if self.history_key.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid(format!(
                "history_key '{}' collides with per-cell keys",
                self.history_key
            )));
        }

        Ok(())
    }
}
