//! Engine start/stop controller library.
//!
//! Exposes the pure-logic modules (state machine, alarms, control loop)
//! and the host adapters for the `enginectl` binary and for integration
//! testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod safety;
pub mod sensors;

pub use app::commands::{CommandMailbox, ControlCommand, EngineMode};
pub use app::events::{AppEvent, StatusSnapshot};
pub use app::service::ControlLoop;
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use fsm::{EngineState, EngineStateMachine, Trigger};
pub use safety::{FaultKind, FaultSet};
pub use sensors::SensorSnapshot;
