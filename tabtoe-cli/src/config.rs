use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tabtoe_engine::{EngineConfig, Mode};

#[derive(Parser, Debug, Clone)]
#[command(name = "tabtoe")]
#[command(about = "Tic-tac-toe against a bot or a second terminal")]
#[command(long_about = "Terminal driver for the tabtoe engine.

In single-player mode every move is answered by a random bot. In
multiplayer mode two processes pointed at the same --store file share
one board: the first to join plays X, the second plays O.")]
pub struct Config {
    /// JSON file shared with the other session
    #[arg(long, env = "TABTOE_STORE", default_value = "tabtoe-shared.json")]
    pub store: PathBuf,

    /// JSON file remembering this session's seat (kept in memory when absent)
    #[arg(long, env = "TABTOE_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// TOML engine configuration file
    #[arg(long, env = "TABTOE_ENGINE_CONFIG")]
    pub engine_config: Option<PathBuf>,

    /// Starting mode (single, multiplayer), overrides the engine config
    #[arg(long, env = "TABTOE_MODE")]
    pub mode: Option<Mode>,

    /// Bot seed, overrides the engine config
    #[arg(long, env = "TABTOE_SEED")]
    pub seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TABTOE_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.log_level()?;

        if self.store.as_os_str().is_empty() {
            return Err(anyhow!("store path cannot be empty"));
        }

        if self.session_file.as_ref() == Some(&self.store) {
            return Err(anyhow!("session file must differ from the shared store"));
        }

        Ok(())
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow!("invalid log level '{}'", self.log_level))
    }

    /// Engine configuration from the TOML file, with command-line overrides
    pub fn engine(&self) -> Result<EngineConfig> {
        let mut config = match &self.engine_config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                EngineConfig::from_toml_str(&raw)?
            }
            None => EngineConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.initial_mode = mode;
        }
        if let Some(seed) = self.seed {
            config.bot_seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("tabtoe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert!(config.validate().is_ok());
        assert_eq!(config.log_level().unwrap(), tracing::Level::WARN);

        let engine = config.engine().unwrap();
        assert_eq!(engine, EngineConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = parse(&["--mode", "multiplayer", "--seed", "9", "--log-level", "debug"]);
        let engine = config.engine().unwrap();

        assert_eq!(engine.initial_mode, Mode::Multiplayer);
        assert_eq!(engine.bot_seed, Some(9));
        assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::try_parse_from(["tabtoe", "--mode", "solo"]).is_err());

        let config = parse(&["--log-level", "loud"]);
        assert!(config.validate().is_err());

        let config = parse(&["--store", "same.json", "--session-file", "same.json"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_engine_config_file() {
        let config = parse(&["--engine-config", "/nonexistent/tabtoe.toml"]);
        assert!(config.engine().is_err());
    }
}
