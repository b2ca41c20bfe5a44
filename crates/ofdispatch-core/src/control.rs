//! Operator control commands.
//!
//! The evaluation daemons are driven interactively: the operator flips
//! the mode, grows the pool, regenerates link costs, and injects
//! synthetic traffic while the daemon runs. This module parses the
//! console's line protocol; executing a command is the daemon's job.

use crate::gate::Mode;
use thiserror::Error;

/// One operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch between single-threaded and pooled execution.
    Mode(Mode),
    /// Set the number of dispatch-eligible workers (growth is monotonic).
    Workers(usize),
    /// Regenerate link costs and broadcast the new table (path
    /// computation daemon only).
    Regen,
    /// Inject synthetic packet events through the normal dispatch path.
    Inject(u64),
    /// Print counters.
    Stats,
    /// Print the command summary.
    Help,
    /// Stop the daemon.
    Quit,
}

/// Console usage summary.
pub const HELP: &str = "\
commands:
  mode mono|multi   switch execution mode
  workers <n>       set the active worker count (spawns as needed)
  regen             regenerate link costs and broadcast them
  inject <n>        inject n synthetic packet events
  stats             print counters
  help              this summary
  quit              stop the daemon";

/// Error produced for unparseable console input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{0}' takes exactly one argument")]
    MissingArgument(&'static str),

    #[error("invalid argument '{1}' for '{0}'")]
    InvalidArgument(&'static str, String),
}

/// Parses one console line.
///
/// Tokens are whitespace-separated; the line must contain exactly the
/// command and its arguments (empty lines are the caller's business).
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut tokens = line.split_whitespace();
    let command = tokens.next().unwrap_or("");
    let arg = tokens.next();
    let trailing = tokens.next();

    match command {
        "mode" => {
            let value = one_arg("mode", arg, trailing)?;
            value
                .parse::<Mode>()
                .map(Command::Mode)
                .map_err(|_| CommandError::InvalidArgument("mode", value.to_string()))
        }
        "workers" => {
            let value = one_arg("workers", arg, trailing)?;
            value
                .parse::<usize>()
                .map(Command::Workers)
                .map_err(|_| CommandError::InvalidArgument("workers", value.to_string()))
        }
        "inject" => {
            let value = one_arg("inject", arg, trailing)?;
            value
                .parse::<u64>()
                .map(Command::Inject)
                .map_err(|_| CommandError::InvalidArgument("inject", value.to_string()))
        }
        "regen" => no_args(Command::Regen, line, arg),
        "stats" => no_args(Command::Stats, line, arg),
        "help" => no_args(Command::Help, line, arg),
        "quit" | "exit" => no_args(Command::Quit, line, arg),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn one_arg<'a>(
    name: &'static str,
    arg: Option<&'a str>,
    trailing: Option<&'a str>,
) -> Result<&'a str, CommandError> {
    match (arg, trailing) {
        (Some(value), None) => Ok(value),
        _ => Err(CommandError::MissingArgument(name)),
    }
}

fn no_args(cmd: Command, line: &str, arg: Option<&str>) -> Result<Command, CommandError> {
    match arg {
        None => Ok(cmd),
        Some(_) => Err(CommandError::Unknown(line.trim().to_string())),
    }
}
