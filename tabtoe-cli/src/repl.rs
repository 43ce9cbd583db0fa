//! Command parsing and board rendering for the terminal driver

use std::fmt::Write;

use tabtoe_engine::{Intent, Mode, Outcome, Rejection, Snapshot};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),
    #[error("cell must be 0-8, got '{0}'")]
    BadCell(String),
    #[error("{0}")]
    BadMode(String),
}

/// A line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Dispatch(Intent),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  0-8, click <n>     play a cell (a click on a finished game starts a new one)
  mode <single|multiplayer>
  join               join or create the shared game
  refresh            re-read the shared board
  load               rebuild the board from per-cell entries
  help, quit";

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(CommandError::Empty);
    };
    let arg = words.next();

    let command = match head {
        "click" | "c" => {
            let raw = arg.ok_or_else(|| CommandError::BadCell(String::new()))?;
            Command::Dispatch(Intent::CellClick(parse_cell(raw)?))
        }
        "mode" | "m" => {
            let raw = arg.unwrap_or_default();
            let mode = raw.parse::<Mode>().map_err(CommandError::BadMode)?;
            Command::Dispatch(Intent::SetMode(mode))
        }
        "join" | "j" => Command::Dispatch(Intent::InitMultiplayer),
        "refresh" | "r" => Command::Dispatch(Intent::Refresh),
        "load" => Command::Dispatch(Intent::LoadPreviousGame),
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other if other.chars().all(|c| c.is_ascii_digit()) => {
            Command::Dispatch(Intent::CellClick(parse_cell(other)?))
        }
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(command)
}

fn parse_cell(raw: &str) -> Result<usize, CommandError> {
    match raw.parse::<usize>() {
        Ok(index) if index < 9 => Ok(index),
        _ => Err(CommandError::BadCell(raw.to_string())),
    }
}

/// Draw the board and status line
///
/// Empty cells show their index, winning cells are wrapped in brackets.
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    for row in 0..3 {
        let cells: Vec<String> = (0..3)
            .map(|col| {
                let index = row * 3 + col;
                let cell = &snapshot.board.cells()[index];
                let mark = match cell.value() {
                    Some(symbol) => symbol.to_string(),
                    None => index.to_string(),
                };
                if cell.is_highlighted() {
                    format!("[{}]", mark)
                } else {
                    format!(" {} ", mark)
                }
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join("|"));
        if row < 2 {
            let _ = writeln!(out, "---+---+---");
        }
    }

    let status = &snapshot.status;
    let _ = write!(
        out,
        "mode: {}  X wins: {}  O wins: {}  empty: {}",
        status.mode,
        status.player_wins,
        status.bot_wins,
        snapshot.empty_squares_count()
    );
    if let Some(identity) = snapshot.identity {
        let _ = write!(out, "  you: {} (seat {})", identity.symbol, identity.session_id);
    }
    if status.is_game_over {
        let _ = write!(out, "\ngame over, play any cell to start again");
    }

    out
}

/// One-line description of what an intent did
pub fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Placed { index, symbol, bot_reply: Some(reply) } => {
            format!("{} took {}, bot answered {}", symbol, index, reply)
        }
        Outcome::Placed { index, symbol, bot_reply: None } => format!("{} took {}", symbol, index),
        Outcome::Rejected(Rejection::Occupied { index }) => format!("cell {} is taken", index),
        Outcome::Rejected(Rejection::OutOfRange { index }) => format!("no cell {}", index),
        Outcome::Rejected(Rejection::NotYourTurn) => "wait for the bot".to_string(),
        Outcome::Rejected(Rejection::NotJoined) => "type 'join' first".to_string(),
        Outcome::Reset => "new game".to_string(),
        Outcome::ModeChanged(mode) => format!("mode set to {}", mode),
        Outcome::Joined(identity) => {
            format!("joined as {} (seat {})", identity.symbol, identity.session_id)
        }
        Outcome::Refreshed { changed: true } => "board updated".to_string(),
        Outcome::Refreshed { changed: false } => "board unchanged".to_string(),
    }
}
