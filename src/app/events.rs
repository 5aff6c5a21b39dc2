//! Outbound application events.
//!
//! The [`ControlLoop`](super::service::ControlLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to the console, redraw the
//! dashboard, publish to a telemetry channel.

use serde::Serialize;

use super::commands::{ControlCommand, EngineMode};
use crate::error::Rejection;
use crate::fsm::{EngineState, Trigger};
use crate::safety::{FaultKind, FaultSet};

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The loop has started (carries the initial state).
    Started(EngineState),

    /// The state machine entered a state.  `label` is the status text.
    StateEntered {
        from: EngineState,
        to: EngineState,
        trigger: Trigger,
        label: String,
    },

    /// A fault became active this tick.
    FaultRaised(FaultKind),

    /// A fault that was active last tick is gone.
    FaultCleared(FaultKind),

    /// An operator command was refused.
    CommandRejected {
        command: ControlCommand,
        state: EngineState,
        reason: Rejection,
    },

    /// The operating mode changed.
    ModeChanged { from: EngineMode, to: EngineMode },

    /// Per-tick status, emitted every tick whether or not anything changed.
    Status(StatusSnapshot),
}

/// A point-in-time status snapshot suitable for display or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Monotonic tick number, starting at 1.
    pub tick: u64,
    pub state: EngineState,
    /// Status text for the current state.
    pub status_label: String,
    pub mode: EngineMode,
    pub rpm: f64,
    pub oil_pressure_psi: f64,
    pub coolant_temp_c: f64,
    pub battery_voltage_v: f64,
    pub fuel_level_pct: f64,
    pub engine_hours: f64,
    pub active_faults: FaultSet,
    pub crank_attempts: u8,
    /// Running below the underspeed threshold.  Advisory only.
    pub underspeed: bool,
    /// Sensor values were reused from an earlier tick.
    pub stale: bool,
    /// The dashboard should offer a fault reset.
    pub fault_reset_available: bool,
}

impl StatusSnapshot {
    pub fn has_fault(&self, fault: FaultKind) -> bool {
        self.active_faults.contains(fault)
    }
}
