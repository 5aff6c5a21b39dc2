//! Engine start/stop state machine.
//!
//! States are an enum and triggers a closed [`Trigger`] enum dispatched
//! through a single [`EngineStateMachine::apply`] entry point.  The
//! transition logic itself lives in [`states`] as pure functions; this
//! module adds the armed timeout deadline and logging.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  EngineStateMachine                                          │
//! │                                                              │
//! │  apply(trigger, now) ──▶ states::step ──▶ commit             │
//! │                                              │               │
//! │                       state · crank_attempts · deadline      │
//! │                                                              │
//! │  evaluate_state(running, fault, now)   poll_timeout(now)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the control loop calls [`EngineStateMachine::evaluate_state`]
//! (fault pre-emption, then engine-started detection) followed by
//! [`EngineStateMachine::poll_timeout`].  Every transition returns the
//! list of states entered so the caller can emit notifications; nothing
//! here talks to the outside world.

pub mod states;

use core::fmt;

use log::{error, info};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::{ConfigError, Rejection};
use states::StateTimeouts;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Operational state of the engine.  Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Stopped,
    PreCrank,
    Cranking,
    CrankRest,
    Running,
    CoolingDown,
    Fault,
}

impl EngineState {
    pub const ALL: [EngineState; 7] = [
        EngineState::Stopped,
        EngineState::PreCrank,
        EngineState::Cranking,
        EngineState::CrankRest,
        EngineState::Running,
        EngineState::CoolingDown,
        EngineState::Fault,
    ];

    /// Stable snake_case name used in logs and telemetry tags.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::PreCrank => "pre_crank",
            Self::Cranking => "cranking",
            Self::CrankRest => "crank_rest",
            Self::Running => "running",
            Self::CoolingDown => "cooling_down",
            Self::Fault => "fault",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// Every event that can move the machine.  Timeout triggers are fired by
/// [`EngineStateMachine::poll_timeout`]; the rest come from operator
/// commands or [`EngineStateMachine::evaluate_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    StartRequest,
    /// Pre-crank timeout.
    Crank,
    EngineStarted,
    /// Crank timeout.
    CrankTimeout,
    /// Crank-rest timeout.
    RetryCrank,
    MaxCranksExceeded,
    StopRequest,
    /// Cooldown timeout.
    ShutdownComplete,
    ImmediateStop,
    FaultDetected,
    ResetFault,
    EmergencyStop,
}

impl Trigger {
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartRequest => "start_request",
            Self::Crank => "crank",
            Self::EngineStarted => "engine_started",
            Self::CrankTimeout => "crank_timeout",
            Self::RetryCrank => "retry_crank",
            Self::MaxCranksExceeded => "max_cranks_exceeded",
            Self::StopRequest => "stop_request",
            Self::ShutdownComplete => "shutdown_complete",
            Self::ImmediateStop => "immediate_stop",
            Self::FaultDetected => "fault_detected",
            Self::ResetFault => "reset_fault",
            Self::EmergencyStop => "emergency_stop",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// One state entry, reported back to the caller for notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: EngineState,
    pub to: EngineState,
    pub trigger: Trigger,
    /// Crank counter after entering `to`.
    pub crank_attempts: u8,
}

impl Transition {
    /// Status text for the state entered.
    pub fn label(&self) -> String {
        states::entry_label(self.to, self.crank_attempts)
    }
}

/// States entered by a single trigger.  Never more than two.
pub type Transitions = heapless::Vec<Transition, 2>;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Owns the current state, the crank counter and the armed deadline.
#[derive(Debug, Clone)]
pub struct EngineStateMachine {
    state: EngineState,
    crank_attempts: u8,
    max_crank_attempts: u8,
    timeouts: StateTimeouts,
    /// Absolute time (ms) at which the current state's timeout fires.
    deadline: Option<u64>,
}

impl EngineStateMachine {
    /// Build a machine in `Stopped`.  Rejects configs the table cannot run with.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: EngineState::Stopped,
            crank_attempts: 0,
            max_crank_attempts: config.max_crank_attempts,
            timeouts: StateTimeouts::from_config(config),
            deadline: None,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn crank_attempts(&self) -> u8 {
        self.crank_attempts
    }

    pub fn max_crank_attempts(&self) -> u8 {
        self.max_crank_attempts
    }

    /// Armed deadline for the current state, if it has a timeout.
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Fire a trigger.  Invalid triggers leave the machine untouched and
    /// are not logged here; the caller decides how to report them.
    pub fn apply(&mut self, trigger: Trigger, now_ms: u64) -> Result<Transitions, Rejection> {
        let step = states::step(
            self.state,
            self.crank_attempts,
            self.max_crank_attempts,
            trigger,
        )?;

        for t in &step.transitions {
            self.log_entry(t);
        }

        self.state = step.state;
        self.crank_attempts = step.crank_attempts;
        // Entering any state replaces whatever deadline was armed before.
        self.deadline = self
            .timeouts
            .for_state(self.state)
            .map(|ms| now_ms.saturating_add(ms));

        Ok(step.transitions)
    }

    /// Per-tick condition check.
    ///
    /// 1. An active fault sends every state except `Fault` to `Fault`, and
    ///    nothing else is considered this call.
    /// 2. While `Cranking`, a turning engine moves to `Running`.
    pub fn evaluate_state(
        &mut self,
        engine_running: bool,
        fault_active: bool,
        now_ms: u64,
    ) -> Transitions {
        if fault_active && self.state != EngineState::Fault {
            return self
                .apply(Trigger::FaultDetected, now_ms)
                .unwrap_or_default();
        }

        if self.state == EngineState::Cranking && engine_running {
            return self
                .apply(Trigger::EngineStarted, now_ms)
                .unwrap_or_default();
        }

        Transitions::new()
    }

    /// Fire the current state's timeout trigger if its deadline has passed.
    pub fn poll_timeout(&mut self, now_ms: u64) -> Transitions {
        match (self.deadline, states::timeout_trigger(self.state)) {
            (Some(deadline), Some(trigger)) if now_ms >= deadline => {
                self.apply(trigger, now_ms).unwrap_or_default()
            }
            _ => Transitions::new(),
        }
    }

    fn log_entry(&self, t: &Transition) {
        info!("ENGINE: {} -> {} ({})", t.from, t.to, t.trigger);
        match t.to {
            EngineState::Stopped => info!("STOPPED: engine stopped"),
            EngineState::PreCrank => info!("PRE_CRANK: priming fuel system"),
            EngineState::Cranking => info!(
                "CRANKING: attempt {} of {}",
                t.crank_attempts, self.max_crank_attempts
            ),
            EngineState::CrankRest => info!(
                "CRANK_REST: attempt {} of {} failed, resting starter",
                t.crank_attempts, self.max_crank_attempts
            ),
            EngineState::Running => info!("RUNNING: engine started"),
            EngineState::CoolingDown => info!("COOLING_DOWN: running down before shutdown"),
            EngineState::Fault => {
                if t.trigger == Trigger::MaxCranksExceeded {
                    error!("FAULT: max crank attempts exceeded");
                } else {
                    error!("FAULT: engine fault detected");
                }
            }
        }
    }
}
