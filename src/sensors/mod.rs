//! Sensor subsystem: the per-tick [`SensorSnapshot`] and sources that produce it.
//!
//! Real acquisition (Modbus, CAN, analogue inputs) lives outside this crate
//! behind [`SensorPort`](crate::app::ports::SensorPort).  The
//! [`simulator`] module provides a software engine for bench runs.

pub mod simulator;

use serde::{Deserialize, Serialize};

/// A point-in-time snapshot of every engine sensor.
///
/// Produced once per tick by the sensor source and never mutated by the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// Crankshaft speed.
    pub rpm: f64,
    /// Oil pressure (PSI).
    pub oil_pressure_psi: f64,
    /// Coolant temperature (°C).
    pub coolant_temp_c: f64,
    /// Battery voltage (V).  May legitimately be any value.
    pub battery_voltage_v: f64,
    /// Fuel level (0-100 %).
    pub fuel_level_pct: f64,
    /// Engine hour meter.
    pub engine_hours: f64,
}

impl Default for SensorSnapshot {
    /// Engine at rest on a charged battery with a full tank.
    fn default() -> Self {
        Self {
            rpm: 0.0,
            oil_pressure_psi: 0.0,
            coolant_temp_c: 0.0,
            battery_voltage_v: 12.6,
            fuel_level_pct: 100.0,
            engine_hours: 0.0,
        }
    }
}
