//! Transition table, entry actions and per-state timeouts.
//!
//! Everything here is a pure function of (state, crank attempts, trigger).
//! The [`EngineStateMachine`](super::EngineStateMachine) only adds
//! deadlines and logging on top.
//!
//! ```text
//!  STOPPED ──[start]──▶ PRE_CRANK ──[t/o]──▶ CRANKING ──[rpm > 100]──▶ RUNNING
//!     ▲                                       │     ▲                   │
//!     │                                    [t/o]  [t/o]              [stop]
//!     │                                       ▼     │                   ▼
//!     │                                     CRANK_REST           COOLING_DOWN
//!     │                                       │                         │
//!     │                         [attempts >= max]                  [t/o | stop]
//!     │                                       ▼                         │
//!     ├───────────[reset]────────────────── FAULT                       │
//!     └─────────────────────────────────────────────────────────────────┘
//!
//!  Any state ──[fault]──▶ FAULT        Any state ──[e-stop]──▶ STOPPED
//! ```

use crate::config::EngineConfig;
use crate::error::Rejection;

use super::{EngineState, Transition, Transitions, Trigger};

// ═══════════════════════════════════════════════════════════════════════════
//  Transition table
// ═══════════════════════════════════════════════════════════════════════════

/// Destination for `trigger` fired from `state`, or `None` if it has no
/// transition there.
pub fn next_state(state: EngineState, trigger: Trigger) -> Option<EngineState> {
    use EngineState::{CoolingDown, CrankRest, Cranking, Fault, PreCrank, Running, Stopped};

    match trigger {
        Trigger::EmergencyStop => Some(Stopped),
        Trigger::FaultDetected => Some(Fault),
        Trigger::StartRequest => (state == Stopped).then_some(PreCrank),
        Trigger::Crank => (state == PreCrank).then_some(Cranking),
        Trigger::EngineStarted => (state == Cranking).then_some(Running),
        Trigger::CrankTimeout => (state == Cranking).then_some(CrankRest),
        Trigger::RetryCrank => (state == CrankRest).then_some(Cranking),
        Trigger::MaxCranksExceeded => (state == CrankRest).then_some(Fault),
        Trigger::StopRequest => (state == Running).then_some(CoolingDown),
        Trigger::ShutdownComplete => (state == CoolingDown).then_some(Stopped),
        Trigger::ImmediateStop => matches!(state, Running | CoolingDown).then_some(Stopped),
        Trigger::ResetFault => (state == Fault).then_some(Stopped),
    }
}

/// The trigger a state's timeout fires, if the state has one.
pub fn timeout_trigger(state: EngineState) -> Option<Trigger> {
    match state {
        EngineState::PreCrank => Some(Trigger::Crank),
        EngineState::Cranking => Some(Trigger::CrankTimeout),
        EngineState::CrankRest => Some(Trigger::RetryCrank),
        EngineState::CoolingDown => Some(Trigger::ShutdownComplete),
        EngineState::Stopped | EngineState::Running | EngineState::Fault => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Entry actions
// ═══════════════════════════════════════════════════════════════════════════

/// Crank counter after entering `state`.
pub fn attempts_on_entry(state: EngineState, attempts: u8) -> u8 {
    match state {
        EngineState::Stopped | EngineState::PreCrank | EngineState::Running => 0,
        EngineState::Cranking => attempts.saturating_add(1),
        EngineState::CrankRest | EngineState::CoolingDown | EngineState::Fault => attempts,
    }
}

/// Human-readable status text shown on entry.
pub fn entry_label(state: EngineState, attempts: u8) -> String {
    match state {
        EngineState::Stopped => "Stopped".into(),
        EngineState::PreCrank => "Pre-crank".into(),
        EngineState::Cranking => format!("Cranking ({attempts})"),
        EngineState::CrankRest => "Crank Rest".into(),
        EngineState::Running => "Running".into(),
        EngineState::CoolingDown => "Cooling Down".into(),
        EngineState::Fault => "FAULT".into(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Timeouts
// ═══════════════════════════════════════════════════════════════════════════

/// Per-state timeout durations, copied out of the config at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTimeouts {
    pub pre_crank_ms: u64,
    pub crank_ms: u64,
    pub crank_rest_ms: u64,
    pub cooldown_ms: u64,
}

impl StateTimeouts {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            pre_crank_ms: config.pre_crank_ms(),
            crank_ms: config.crank_time_ms(),
            crank_rest_ms: config.crank_rest_ms(),
            cooldown_ms: config.cooldown_time_ms(),
        }
    }

    /// How long `state` may last before its timeout trigger fires.
    pub fn for_state(&self, state: EngineState) -> Option<u64> {
        match state {
            EngineState::PreCrank => Some(self.pre_crank_ms),
            EngineState::Cranking => Some(self.crank_ms),
            EngineState::CrankRest => Some(self.crank_rest_ms),
            EngineState::CoolingDown => Some(self.cooldown_ms),
            EngineState::Stopped | EngineState::Running | EngineState::Fault => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Step
// ═══════════════════════════════════════════════════════════════════════════

/// Result of firing one trigger: where the machine ends up and every
/// state it entered on the way (at most two, `CrankRest` then `Fault`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: EngineState,
    pub crank_attempts: u8,
    pub transitions: Transitions,
}

impl Step {
    fn enter(&mut self, to: EngineState, trigger: Trigger) {
        let from = self.state;
        self.state = to;
        self.crank_attempts = attempts_on_entry(to, self.crank_attempts);
        let transition = Transition {
            from,
            to,
            trigger,
            crank_attempts: self.crank_attempts,
        };
        if self.transitions.push(transition).is_err() {
            debug_assert!(false, "transition chain overflow");
        }
    }
}

/// Fire `trigger` against `(state, attempts)`.
///
/// Entering `CrankRest` with `attempts >= max_attempts` chains straight
/// into `Fault`, pre-empting the retry timeout.
pub fn step(
    state: EngineState,
    attempts: u8,
    max_attempts: u8,
    trigger: Trigger,
) -> Result<Step, Rejection> {
    let to = next_state(state, trigger).ok_or(Rejection::InvalidInState { trigger, state })?;

    let mut step = Step {
        state,
        crank_attempts: attempts,
        transitions: Transitions::new(),
    };
    step.enter(to, trigger);

    if step.state == EngineState::CrankRest && step.crank_attempts >= max_attempts {
        step.enter(EngineState::Fault, Trigger::MaxCranksExceeded);
    }

    Ok(step)
}
