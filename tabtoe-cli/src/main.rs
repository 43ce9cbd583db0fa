use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Parser;
use tabtoe_core::{KeyValueStore, MemoryStore};
use tabtoe_engine::Engine;
use tracing::{error, info, warn};

mod config;
mod file_store;
mod repl;

use crate::config::Config;
use crate::file_store::FileStore;
use crate::repl::{describe, parse_command, render, Command, HELP};

fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Validate configuration
    config.validate()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(config.log_level()?)
        .with_writer(io::stderr)
        .init();

    let engine_config = config.engine()?;
    let shared = FileStore::new(&config.store);
    let local: Box<dyn KeyValueStore> = match &config.session_file {
        Some(path) => Box::new(FileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };

    info!(store = %shared.path().display(), mode = %engine_config.initial_mode, "Starting tabtoe");
    let mut engine = Engine::new(engine_config, shared, local)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    println!("{}\n", HELP);
    println!("{}", render(&engine.snapshot()));

    for line in stdin.lock().lines() {
        let line = line?;

        if let Err(e) = engine.sync() {
            warn!("Failed to sync with shared store: {}", e);
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Dispatch(intent) => match engine.dispatch(intent) {
                Ok(update) => {
                    println!("{}", describe(&update.outcome));
                    println!("{}", render(&update.snapshot));
                }
                Err(e) => {
                    // the session keeps its previous state
                    error!("Intent {:?} failed: {}", intent, e);
                    println!("failed: {}", e);
                }
            },
        }
        stdout.flush()?;
    }

    info!("Goodbye");
    Ok(())
}
