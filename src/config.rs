//! Engine supervisor configuration.
//!
//! Timing parameters and alarm thresholds for the start/stop sequence.
//! Loaded once at startup through a [`ConfigPort`](crate::app::ports::ConfigPort)
//! and read-only for the lifetime of the control loop.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::safety::ENGINE_RUNNING_RPM;

/// Upper bound for the control loop period.
const MAX_LOOP_INTERVAL_MS: u32 = 60_000;

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // --- Display ---
    /// Name shown by the dashboard
    pub display_name: String,
    /// Informational only; the auto-start policy lives outside this crate
    pub auto_start_enabled: bool,

    // --- Sequencing ---
    /// Fuel priming delay before the first crank (seconds)
    pub pre_crank_secs: u16,
    /// Maximum time to crank before the attempt fails (seconds)
    pub crank_time_secs: u16,
    /// Starter rest between crank attempts (seconds)
    pub crank_rest_secs: u16,
    /// Run-down period before shutdown completes (seconds)
    pub cooldown_time_secs: u16,
    /// Crank attempts allowed before escalating to Fault
    pub max_crank_attempts: u8,

    // --- Alarm thresholds ---
    /// Oil pressure below this faults while running (PSI)
    pub low_oil_pressure_psi: f64,
    /// Coolant temperature above this faults while running (Celsius)
    pub high_coolant_temp_c: f64,
    /// Battery voltage below this faults in any state (V)
    pub low_battery_voltage: f64,
    /// Battery voltage above this faults in any state (V)
    pub high_battery_voltage: f64,
    /// RPM above this faults while running
    pub overspeed_rpm: f64,
    /// RPM below this raises the underspeed advisory while running
    pub underspeed_rpm: f64,

    // --- Timing ---
    /// Control loop period (milliseconds)
    pub control_loop_interval_ms: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_name: String::from("Engine Controller"),
            auto_start_enabled: false,

            // Sequencing
            pre_crank_secs: 3,
            crank_time_secs: 10,
            crank_rest_secs: 5,
            cooldown_time_secs: 60,
            max_crank_attempts: 3,

            // Alarm thresholds
            low_oil_pressure_psi: 15.0,
            high_coolant_temp_c: 95.0,
            low_battery_voltage: 11.5,
            high_battery_voltage: 14.5,
            overspeed_rpm: 2000.0,
            underspeed_rpm: 1400.0,

            // Timing
            control_loop_interval_ms: 1000, // 1 Hz
        }
    }
}

impl EngineConfig {
    pub fn pre_crank_ms(&self) -> u64 {
        u64::from(self.pre_crank_secs) * 1000
    }

    pub fn crank_time_ms(&self) -> u64 {
        u64::from(self.crank_time_secs) * 1000
    }

    pub fn crank_rest_ms(&self) -> u64 {
        u64::from(self.crank_rest_secs) * 1000
    }

    pub fn cooldown_time_ms(&self) -> u64 {
        u64::from(self.cooldown_time_secs) * 1000
    }

    /// Reject any configuration the state table cannot run with.
    ///
    /// Values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pre_crank_secs == 0 {
            return Err(ConfigError::Invalid("pre_crank_secs must be > 0"));
        }
        if self.crank_time_secs == 0 {
            return Err(ConfigError::Invalid("crank_time_secs must be > 0"));
        }
        if self.crank_rest_secs == 0 {
            return Err(ConfigError::Invalid("crank_rest_secs must be > 0"));
        }
        if self.cooldown_time_secs == 0 {
            return Err(ConfigError::Invalid("cooldown_time_secs must be > 0"));
        }
        if self.max_crank_attempts == 0 {
            return Err(ConfigError::Invalid("max_crank_attempts must be > 0"));
        }
        if !(1..=MAX_LOOP_INTERVAL_MS).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::Invalid(
                "control_loop_interval_ms must be 1-60000",
            ));
        }

        let thresholds = [
            self.low_oil_pressure_psi,
            self.high_coolant_temp_c,
            self.low_battery_voltage,
            self.high_battery_voltage,
            self.overspeed_rpm,
            self.underspeed_rpm,
        ];
        if thresholds.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid("alarm thresholds must be finite"));
        }
        if self.low_oil_pressure_psi < 0.0 {
            return Err(ConfigError::Invalid("low_oil_pressure_psi must be >= 0"));
        }
        if self.low_battery_voltage >= self.high_battery_voltage {
            return Err(ConfigError::Invalid(
                "low_battery_voltage must be < high_battery_voltage",
            ));
        }
        if self.overspeed_rpm <= ENGINE_RUNNING_RPM {
            return Err(ConfigError::Invalid(
                "overspeed_rpm must be above the running gate",
            ));
        }
        if self.underspeed_rpm >= self.overspeed_rpm {
            return Err(ConfigError::Invalid(
                "underspeed_rpm must be < overspeed_rpm",
            ));
        }
        Ok(())
    }
}
