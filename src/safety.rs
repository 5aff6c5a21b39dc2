//! Alarm evaluation.
//!
//! [`evaluate`] is a pure function of one sensor snapshot and the
//! configured thresholds.  The fault set is recomputed from scratch every
//! tick; nothing latches here.  Only the state machine's `Fault` state
//! persists until an operator reset.
//!
//! ## Rules
//!
//! | Fault                | Condition                 | Gate                |
//! |----------------------|---------------------------|---------------------|
//! | `LowOilPressure`     | oil < low_oil_pressure    | rpm > 100           |
//! | `HighCoolantTemp`    | coolant > high_coolant    | rpm > 100           |
//! | `Overspeed`          | rpm > overspeed_rpm       | rpm > 100           |
//! | `LowBatteryVoltage`  | volts < low_battery       | always              |
//! | `HighBatteryVoltage` | volts > high_battery      | always              |
//!
//! Comparisons are strict: a reading exactly at a threshold does not fault.
//! There is no deadband, so a reading hovering on a threshold toggles the
//! fault every tick.
//!
//! [`AlarmMonitor`] wraps the evaluator and diffs against the previous tick
//! to report newly active and newly cleared faults.  The diff is for
//! observability only and never feeds a transition.

use core::fmt;

use log::{error, info};
use serde::{Serialize, Serializer};

use crate::config::EngineConfig;
use crate::sensors::SensorSnapshot;

/// RPM above which the engine counts as turning under its own power.
pub const ENGINE_RUNNING_RPM: f64 = 100.0;

/// The "engine actually turning" predicate.  Strict: exactly 100 rpm is not running.
pub fn engine_running(rpm: f64) -> bool {
    rpm > ENGINE_RUNNING_RPM
}

// ---------------------------------------------------------------------------
// Fault kinds
// ---------------------------------------------------------------------------

/// Independent alarm conditions.  Several may be active at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaultKind {
    LowOilPressure = 0b0000_0001,
    HighCoolantTemp = 0b0000_0010,
    Overspeed = 0b0000_0100,
    LowBatteryVoltage = 0b0000_1000,
    HighBatteryVoltage = 0b0001_0000,
}

impl FaultKind {
    pub const ALL: [FaultKind; 5] = [
        FaultKind::LowOilPressure,
        FaultKind::HighCoolantTemp,
        FaultKind::Overspeed,
        FaultKind::LowBatteryVoltage,
        FaultKind::HighBatteryVoltage,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// Stable snake_case tag used for telemetry.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::LowOilPressure => "low_oil_pressure",
            Self::HighCoolantTemp => "high_coolant_temp",
            Self::Overspeed => "overspeed",
            Self::LowBatteryVoltage => "low_battery_voltage",
            Self::HighBatteryVoltage => "high_battery_voltage",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowOilPressure => write!(f, "low oil pressure"),
            Self::HighCoolantTemp => write!(f, "high coolant temperature"),
            Self::Overspeed => write!(f, "overspeed"),
            Self::LowBatteryVoltage => write!(f, "low battery voltage"),
            Self::HighBatteryVoltage => write!(f, "high battery voltage"),
        }
    }
}

impl Serialize for FaultKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Fault set
// ---------------------------------------------------------------------------

/// Flat set of active faults, stored as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FaultSet(u8);

impl FaultSet {
    pub const EMPTY: FaultSet = FaultSet(0);

    pub fn insert(&mut self, fault: FaultKind) {
        self.0 |= fault.mask();
    }

    pub fn contains(self, fault: FaultKind) -> bool {
        self.0 & fault.mask() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Raw bitmask, for compact logging.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Faults in `self` that are not in `other`.
    pub fn difference(self, other: FaultSet) -> FaultSet {
        FaultSet(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = FaultKind> {
        FaultKind::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<FaultKind> for FaultSet {
    fn from_iter<I: IntoIterator<Item = FaultKind>>(iter: I) -> Self {
        let mut set = FaultSet::EMPTY;
        for fault in iter {
            set.insert(fault);
        }
        set
    }
}

impl Serialize for FaultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Compute the active fault set for one snapshot.
pub fn evaluate(snap: &SensorSnapshot, config: &EngineConfig) -> FaultSet {
    let mut faults = FaultSet::EMPTY;

    // ── Running-only alarms ───────────────────────────────────
    if engine_running(snap.rpm) {
        if snap.oil_pressure_psi < config.low_oil_pressure_psi {
            faults.insert(FaultKind::LowOilPressure);
        }
        if snap.coolant_temp_c > config.high_coolant_temp_c {
            faults.insert(FaultKind::HighCoolantTemp);
        }
        if snap.rpm > config.overspeed_rpm {
            faults.insert(FaultKind::Overspeed);
        }
    }

    // ── Battery, always checked ───────────────────────────────
    if snap.battery_voltage_v < config.low_battery_voltage {
        faults.insert(FaultKind::LowBatteryVoltage);
    } else if snap.battery_voltage_v > config.high_battery_voltage {
        faults.insert(FaultKind::HighBatteryVoltage);
    }

    faults
}

/// True when the engine is turning but slower than the configured band.
/// Advisory only; never a fault.
pub fn underspeed(snap: &SensorSnapshot, config: &EngineConfig) -> bool {
    engine_running(snap.rpm) && snap.rpm < config.underspeed_rpm
}

// ---------------------------------------------------------------------------
// Edge-triggered monitor
// ---------------------------------------------------------------------------

/// Faults that changed between two consecutive evaluations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultDiff {
    pub raised: FaultSet,
    pub cleared: FaultSet,
}

/// Remembers the previous fault set so changes can be reported.
#[derive(Debug, Default)]
pub struct AlarmMonitor {
    previous: FaultSet,
}

impl AlarmMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the snapshot, log edges, and return the current set with its diff.
    pub fn evaluate(&mut self, snap: &SensorSnapshot, config: &EngineConfig) -> (FaultSet, FaultDiff) {
        let current = evaluate(snap, config);
        let diff = FaultDiff {
            raised: current.difference(self.previous),
            cleared: self.previous.difference(current),
        };

        for fault in diff.raised.iter() {
            error!("ALARM SET: {fault}");
        }
        for fault in diff.cleared.iter() {
            info!("ALARM CLEARED: {fault}");
        }

        self.previous = current;
        (current, diff)
    }

    /// Fault set from the most recent evaluation.
    pub fn previous(&self) -> FaultSet {
        self.previous
    }

    /// Forget the previous set so every live fault is reported again as
    /// raised on the next evaluation.
    pub fn reset(&mut self) {
        self.previous = FaultSet::EMPTY;
    }
}
