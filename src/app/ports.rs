//! Port traits: the hexagonal boundary between the control core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (sensor source, command source, event sink, tag store,
//! clock, config loader) implement these traits.  The
//! [`ControlLoop`](super::service::ControlLoop) consumes them via generics,
//! so the core never touches hardware or transports directly.
//!
//! Every read port is non-blocking: a tick must never wait on an adapter.

use serde_json::Value;

use super::commands::ControlCommand;
use super::events::AppEvent;
use crate::config::EngineConfig;
use crate::error::{ConfigError, StorageError};
use crate::sensors::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the loop calls this once per tick.
pub trait SensorPort {
    /// Most recently delivered snapshot, or `None` if nothing new is
    /// available.  Must not block.
    fn latest(&mut self) -> Option<SensorSnapshot>;
}

// ───────────────────────────────────────────────────────────────
// Command port (driven adapter: operator → domain)
// ───────────────────────────────────────────────────────────────

/// Source of operator commands.  The loop drains at most one per tick.
pub trait CommandPort {
    /// Next pending command, if any.  Must not block.
    fn try_next(&mut self) -> Option<ControlCommand>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → dashboard / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Tag port (driven adapter: domain → telemetry key/value store)
// ───────────────────────────────────────────────────────────────

/// Persists the latest value of named telemetry tags.
pub trait TagPort {
    fn set_tag(&mut self, key: &str, value: Value) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source for timeout deadlines.
pub trait ClockPort {
    /// Milliseconds since an arbitrary fixed origin.  Never goes backwards.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads the engine configuration once at startup.
///
/// Implementations MUST validate before returning; the loop refuses to
/// start from an invalid config anyway.
pub trait ConfigPort {
    fn load(&self) -> Result<EngineConfig, ConfigError>;
}
