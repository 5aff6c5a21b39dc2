//! Inbound operator commands and the mailbox that buffers them between ticks.
//!
//! Commands come from the dashboard, a serial console or an external
//! scheduler.  The [`ControlLoop`](super::service::ControlLoop) consumes at
//! most one per tick.
//!
//! The mailbox holds one slot per command class.  A newer command of the
//! same class overwrites the pending one.  An emergency stop also drops a
//! pending stop or start, since it supersedes both.

use core::fmt;
use core::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::ports::CommandPort;

/// Operating mode selected on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    #[default]
    Manual,
    /// Starts are issued by an external scheduler through the same commands.
    Auto,
    /// Starts are refused; a running engine is sent into cooldown.
    Off,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Auto => write!(f, "auto"),
            Self::Off => write!(f, "off"),
        }
    }
}

/// Commands that external adapters can send into the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    StartRequest,
    StopRequest,
    EmergencyStop,
    ResetFault,
    SetMode(EngineMode),
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartRequest => write!(f, "start"),
            Self::StopRequest => write!(f, "stop"),
            Self::EmergencyStop => write!(f, "emergency stop"),
            Self::ResetFault => write!(f, "reset fault"),
            Self::SetMode(mode) => write!(f, "set mode {mode}"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Console parsing
// ───────────────────────────────────────────────────────────────

/// A console line that is not a known command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCommandError(pub String);

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command: '{}'", self.0)
    }
}

impl std::error::Error for ParseCommandError {}

impl FromStr for EngineMode {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "auto" => Ok(Self::Auto),
            "off" => Ok(Self::Off),
            other => Err(ParseCommandError(other.to_string())),
        }
    }
}

/// Console syntax: `start`, `stop`, `estop`, `reset`, `mode <manual|auto|off>`.
impl FromStr for ControlCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim().to_ascii_lowercase();
        let mut words = line.split_whitespace();
        let cmd = match (words.next(), words.next(), words.next()) {
            (Some("start"), None, None) => Self::StartRequest,
            (Some("stop"), None, None) => Self::StopRequest,
            (Some("estop" | "e-stop"), None, None) => Self::EmergencyStop,
            (Some("reset"), None, None) => Self::ResetFault,
            (Some("mode"), Some(mode), None) => Self::SetMode(mode.parse()?),
            _ => return Err(ParseCommandError(s.trim().to_string())),
        };
        Ok(cmd)
    }
}

// ───────────────────────────────────────────────────────────────
// Mailbox
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Slots {
    emergency_stop: bool,
    reset_fault: bool,
    stop: bool,
    start: bool,
    mode: Option<EngineMode>,
}

/// Thread-safe command buffer, one slot per command class.
#[derive(Debug, Default)]
pub struct CommandMailbox {
    slots: Mutex<Slots>,
}

impl CommandMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command.  Never blocks on the consumer.
    pub fn post(&self, cmd: ControlCommand) {
        let mut slots = self.lock();
        match cmd {
            ControlCommand::EmergencyStop => {
                slots.emergency_stop = true;
                slots.stop = false;
                slots.start = false;
            }
            ControlCommand::ResetFault => slots.reset_fault = true,
            ControlCommand::StopRequest => slots.stop = true,
            ControlCommand::StartRequest => slots.start = true,
            ControlCommand::SetMode(mode) => slots.mode = Some(mode),
        }
    }

    /// Take the highest-priority pending command, if any.
    ///
    /// Priority: emergency stop, reset, stop, start, mode.
    pub fn take(&self) -> Option<ControlCommand> {
        let mut slots = self.lock();
        if core::mem::take(&mut slots.emergency_stop) {
            return Some(ControlCommand::EmergencyStop);
        }
        if core::mem::take(&mut slots.reset_fault) {
            return Some(ControlCommand::ResetFault);
        }
        if core::mem::take(&mut slots.stop) {
            return Some(ControlCommand::StopRequest);
        }
        if core::mem::take(&mut slots.start) {
            return Some(ControlCommand::StartRequest);
        }
        slots.mode.take().map(ControlCommand::SetMode)
    }

    pub fn is_empty(&self) -> bool {
        let slots = self.lock();
        !(slots.emergency_stop || slots.reset_fault || slots.stop || slots.start)
            && slots.mode.is_none()
    }

    // A panicking poster cannot leave the slots half-written, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CommandPort for CommandMailbox {
    fn try_next(&mut self) -> Option<ControlCommand> {
        self.take()
    }
}

impl CommandPort for &CommandMailbox {
    fn try_next(&mut self) -> Option<ControlCommand> {
        self.take()
    }
}

impl CommandPort for std::sync::Arc<CommandMailbox> {
    fn try_next(&mut self) -> Option<ControlCommand> {
        self.take()
    }
}
