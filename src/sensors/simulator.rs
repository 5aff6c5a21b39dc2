//! Software engine for bench runs without hardware.
//!
//! Produces plausible readings with a little jitter.  The simulated starter
//! "catches" after a configurable number of cranking reads, and the engine
//! keeps running until the controller reaches `Stopped` or `Fault`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::SensorSnapshot;
use crate::app::ports::SensorPort;
use crate::fsm::EngineState;

/// Fuel burn while running (% of tank per hour).
const FUEL_BURN_PCT_PER_HOUR: f64 = 5.0;

pub struct EngineSimulator {
    rng: StdRng,
    running: bool,
    /// Reads taken during the current crank attempt.
    cranking_reads: u32,
    /// Reads needed for the engine to catch; `None` never starts.
    crank_reads_to_start: Option<u32>,
    engine_hours: f64,
    fuel_level_pct: f64,
    tick_secs: f64,
}

impl EngineSimulator {
    pub fn new(tick_secs: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), tick_secs)
    }

    /// Deterministic jitter, for tests and reproducible demos.
    pub fn seeded(seed: u64, tick_secs: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), tick_secs)
    }

    fn with_rng(rng: StdRng, tick_secs: f64) -> Self {
        Self {
            rng,
            running: false,
            cranking_reads: 0,
            crank_reads_to_start: Some(2),
            engine_hours: 1234.5,
            fuel_level_pct: 75.0,
            tick_secs,
        }
    }

    /// Number of cranking reads before the engine fires (`None` = never).
    pub fn with_crank_reads_to_start(mut self, reads: Option<u32>) -> Self {
        self.crank_reads_to_start = reads;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Track the controller's state so the starter and fuel behave accordingly.
    pub fn follow_state(&mut self, state: EngineState) {
        match state {
            EngineState::Cranking if !self.running => {
                self.cranking_reads += 1;
                if self
                    .crank_reads_to_start
                    .is_some_and(|needed| self.cranking_reads >= needed)
                {
                    self.running = true;
                }
            }
            EngineState::Stopped | EngineState::Fault => {
                self.running = false;
                self.cranking_reads = 0;
            }
            EngineState::PreCrank | EngineState::CrankRest => {
                self.cranking_reads = 0;
            }
            EngineState::Cranking | EngineState::Running | EngineState::CoolingDown => {}
        }
    }

    fn sample(&mut self) -> SensorSnapshot {
        if self.running {
            self.engine_hours += self.tick_secs / 3600.0;
            self.fuel_level_pct = (self.fuel_level_pct
                - FUEL_BURN_PCT_PER_HOUR * self.tick_secs / 3600.0)
                .max(0.0);

            SensorSnapshot {
                rpm: 1500.0 + self.rng.gen_range(-50.0..50.0),
                oil_pressure_psi: 40.0 + self.rng.gen_range(-5.0..5.0),
                coolant_temp_c: 85.0 + self.rng.gen_range(-3.0..3.0),
                battery_voltage_v: 14.2 + self.rng.gen_range(-0.2..0.2),
                fuel_level_pct: self.fuel_level_pct,
                engine_hours: self.engine_hours,
            }
        } else {
            SensorSnapshot {
                rpm: 0.0,
                oil_pressure_psi: 0.0,
                coolant_temp_c: 25.0 + self.rng.gen_range(-2.0..2.0),
                battery_voltage_v: 12.6 + self.rng.gen_range(-0.1..0.1),
                fuel_level_pct: self.fuel_level_pct,
                engine_hours: self.engine_hours,
            }
        }
    }
}

impl SensorPort for EngineSimulator {
    fn latest(&mut self) -> Option<SensorSnapshot> {
        Some(self.sample())
    }
}
