//! Application core: pure domain logic, zero I/O.
//!
//! Command mapping, alarm evaluation and status publication for the
//! engine controller.  All interaction with sensors, operators and
//! telemetry happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real equipment.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
