//! Session commands, typed at the terminal or scripted.
//!
//! The public interface is [`SessionCommand`] delivered over a `mpsc`
//! channel, so the session loop doesn't care whether a person or a script is
//! driving it.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use thiserror::Error;
use tracing::warn;

// ════════════════════════════════════════════════════════════════════════════
// SessionCommand
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start a playback pass over the current composition.
    Play,
    /// Cancel the running pass.
    Stop,
    /// Begin a new generation cycle.
    Prompt(String),
    /// Save the current composition (`.mid` or `.json`).
    Export(PathBuf),
    /// Print the playback state.
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),

    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
}

impl FromStr for SessionCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None         => (line, ""),
        };

        let needs = |name: &'static str| {
            if rest.is_empty() { Err(CommandError::MissingArgument(name)) } else { Ok(rest) }
        };

        match word.to_ascii_lowercase().as_str() {
            ""                     => Err(CommandError::Empty),
            "play" | "p"           => Ok(SessionCommand::Play),
            "stop" | "s"           => Ok(SessionCommand::Stop),
            "new" | "n" | "prompt" => needs("new").map(|p| SessionCommand::Prompt(p.to_string())),
            "export" | "e"         => needs("export").map(|p| SessionCommand::Export(PathBuf::from(p))),
            "status"               => Ok(SessionCommand::Status),
            "help" | "?" | "h"     => Ok(SessionCommand::Help),
            "quit" | "q" | "exit"  => Ok(SessionCommand::Quit),
            other                  => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Text for `help`.
pub const HELP: &str = "\
  new <prompt>    generate a silhouette and melody for <prompt>
  play            play the placed notes in order
  stop            stop playback
  export <path>   save as .mid or .json
  status          show playback state
  quit            leave";

// ════════════════════════════════════════════════════════════════════════════
// CommandSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SessionCommand`]s over a channel.
pub trait CommandSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SessionCommand>);
}

/// Spawn a command source on its own thread and return the receiving end.
pub fn spawn_command_source<C: CommandSource>(source: C) -> Receiver<SessionCommand> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// StdinCommands
// ════════════════════════════════════════════════════════════════════════════

/// Reads one command per line from standard input.  End of input quits.
pub struct StdinCommands;

impl CommandSource for StdinCommands {
    fn run(self: Box<Self>, tx: Sender<SessionCommand>) {
        let stdin = io::stdin();
        prompt_marker();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.parse::<SessionCommand>() {
                Ok(cmd) => {
                    let quit = cmd == SessionCommand::Quit;
                    if tx.send(cmd).is_err() || quit { return; }
                }
                Err(CommandError::Empty) => prompt_marker(),
                Err(e) => {
                    warn!("{}", e);
                    prompt_marker();
                }
            }
        }
        let _ = tx.send(SessionCommand::Quit);
    }
}

fn prompt_marker() {
    print!("  › ");
    io::stdout().flush().ok();
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedCommands
// ════════════════════════════════════════════════════════════════════════════

/// Replays a fixed list of commands, then quits.
pub struct ScriptedCommands(pub Vec<SessionCommand>);

impl CommandSource for ScriptedCommands {
    fn run(self: Box<Self>, tx: Sender<SessionCommand>) {
        for cmd in self.0 {
            if tx.send(cmd).is_err() { return; }
        }
        let _ = tx.send(SessionCommand::Quit);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
