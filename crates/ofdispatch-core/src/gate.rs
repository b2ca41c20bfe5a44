//! Execution mode and the mode gate.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::watch;

/// The execution mode of the evaluation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Single-threaded: the dispatcher computes decisions inline and the
    /// result sink is suspended (gate engaged).
    Mono,
    /// Pooled: work items go to the worker pool and the result sink
    /// drains worker results (gate disengaged).
    Multi,
}

impl Mode {
    /// Returns true for single-threaded mode.
    pub const fn is_mono(&self) -> bool {
        matches!(self, Mode::Mono)
    }

    /// Returns true for pooled mode.
    pub const fn is_multi(&self) -> bool {
        matches!(self, Mode::Multi)
    }

    /// Stable lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Mode::Mono => "mono",
            Mode::Multi => "multi",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid mode '{0}' (expected 'mono' or 'multi')")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mono" => Ok(Mode::Mono),
            "multi" => Ok(Mode::Multi),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// The two-state gate coupling the mode switch to the result sink.
///
/// Engaged (`Mono`) blocks the sink indefinitely until released; the
/// dispatcher reads the same watched value to choose inline vs. pooled
/// execution, so one [`set`](Self::set) call is the single atomic flip
/// both sides observe. This replaces the counting-semaphore construction
/// of earlier designs: the gate is binary, never a counted resource.
#[derive(Debug)]
pub struct ModeGate {
    tx: watch::Sender<Mode>,
}

impl ModeGate {
    /// Creates a gate in the given initial mode.
    pub fn new(initial: Mode) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Flips the gate. Returns true if the mode actually changed.
    pub fn set(&self, mode: Mode) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        })
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        *self.tx.borrow()
    }

    /// A receiver observing every flip; cloned into the dispatcher and
    /// the result sink.
    pub fn watch(&self) -> watch::Receiver<Mode> {
        self.tx.subscribe()
    }
}
