//! Control loop: the hexagonal core.
//!
//! [`ControlLoop`] owns the state machine, the alarm monitor, the last
//! known sensor snapshot and the current fault set.  All I/O flows through
//! port traits injected at call sites, so the whole loop is testable with
//! mock adapters.
//!
//! ```text
//!  SensorPort  ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  CommandPort ──▶ │       ControlLoop        │ ──▶ TagPort
//!                  │  Alarms · FSM · Status   │
//!                  └──────────────────────────┘
//! ```
//!
//! One [`tick`](ControlLoop::tick) runs to completion before the next:
//!
//! 1. take the latest snapshot (reuse the cached one if none arrived)
//! 2. evaluate alarms
//! 3. derive the "engine turning" predicate
//! 4. apply at most one operator command
//! 5. fault pre-emption, engine-started detection, timeout check
//! 6. emit the status snapshot and persist tags

use log::{info, warn};
use serde_json::json;

use crate::config::EngineConfig;
use crate::error::{ConfigError, Rejection};
use crate::fsm::states::entry_label;
use crate::fsm::{EngineState, EngineStateMachine, Transitions, Trigger};
use crate::safety::{self, AlarmMonitor, FaultSet};
use crate::sensors::SensorSnapshot;

use super::commands::{ControlCommand, EngineMode};
use super::events::{AppEvent, StatusSnapshot};
use super::ports::{CommandPort, EventSink, SensorPort, TagPort};

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop {
    config: EngineConfig,
    fsm: EngineStateMachine,
    alarms: AlarmMonitor,
    mode: EngineMode,
    /// Last snapshot received from the sensor port.
    snapshot: SensorSnapshot,
    /// Fault set from the most recent evaluation.
    faults: FaultSet,
    /// True while the sensor port has nothing new to offer.
    stale: bool,
    tick_count: u64,
}

impl ControlLoop {
    /// Construct the loop.  An invalid config never gets this far.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let fsm = EngineStateMachine::new(&config)?;
        Ok(Self {
            config,
            fsm,
            alarms: AlarmMonitor::new(),
            mode: EngineMode::default(),
            snapshot: SensorSnapshot::default(),
            faults: FaultSet::EMPTY,
            stale: false,
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(self.fsm.state()));
        info!(
            "{} started in {} (mode {})",
            self.config.display_name,
            self.fsm.state(),
            self.mode
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle and return the status it emitted.
    pub fn tick(
        &mut self,
        sensors: &mut impl SensorPort,
        commands: &mut impl CommandPort,
        sink: &mut impl EventSink,
        tags: &mut impl TagPort,
        now_ms: u64,
    ) -> StatusSnapshot {
        self.tick_count += 1;

        // 1. Sensors: never wait, fall back to the cached snapshot
        match sensors.latest() {
            Some(snapshot) => {
                if self.stale {
                    info!("Sensor data restored");
                }
                self.snapshot = snapshot;
                self.stale = false;
            }
            None => {
                if !self.stale {
                    warn!("No fresh sensor data, reusing last snapshot");
                }
                self.stale = true;
            }
        }

        // 2. Alarm evaluation
        let (faults, diff) = self.alarms.evaluate(&self.snapshot, &self.config);
        self.faults = faults;
        for fault in diff.raised.iter() {
            sink.emit(&AppEvent::FaultRaised(fault));
        }
        for fault in diff.cleared.iter() {
            sink.emit(&AppEvent::FaultCleared(fault));
        }

        // 3. Engine turning under its own power?
        let engine_running = safety::engine_running(self.snapshot.rpm);

        // 4. At most one operator command
        if let Some(cmd) = commands.try_next() {
            // Rejections are logged and emitted inside.
            let _ = self.handle_command(cmd, sink, now_ms);
        }

        // 5. State evaluation, then timeouts
        let entered = self
            .fsm
            .evaluate_state(engine_running, !self.faults.is_empty(), now_ms);
        emit_transitions(&entered, sink);
        let entered = self.fsm.poll_timeout(now_ms);
        emit_transitions(&entered, sink);

        // 6. Status out, every tick
        let status = self.status();
        sink.emit(&AppEvent::Status(status.clone()));
        self.publish_tags(&status, tags);

        status
    }

    // ── Command handling ──────────────────────────────────────

    /// Map an operator command onto the state machine.
    ///
    /// Rejections are logged and emitted as [`AppEvent::CommandRejected`];
    /// the state is left unchanged.
    pub fn handle_command(
        &mut self,
        cmd: ControlCommand,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> crate::error::Result<()> {
        let state = self.fsm.state();

        let outcome = match cmd {
            ControlCommand::StartRequest => {
                if self.mode == EngineMode::Off {
                    Err(Rejection::ModeOff)
                } else {
                    self.fsm.apply(Trigger::StartRequest, now_ms)
                }
            }
            ControlCommand::StopRequest => {
                // A second stop during cooldown skips the rest of it.
                let trigger = if state == EngineState::CoolingDown {
                    Trigger::ImmediateStop
                } else {
                    Trigger::StopRequest
                };
                self.fsm.apply(trigger, now_ms)
            }
            ControlCommand::EmergencyStop => {
                warn!("EMERGENCY STOP activated");
                self.fsm.apply(Trigger::EmergencyStop, now_ms)
            }
            ControlCommand::ResetFault => {
                let outcome = self.fsm.apply(Trigger::ResetFault, now_ms);
                if outcome.is_ok() {
                    self.faults = FaultSet::EMPTY;
                    self.alarms.reset();
                }
                outcome
            }
            ControlCommand::SetMode(mode) => {
                self.set_mode(mode, sink, now_ms);
                return Ok(());
            }
        };

        match outcome {
            Ok(entered) => {
                info!("Command accepted: {cmd}");
                emit_transitions(&entered, sink);
                Ok(())
            }
            Err(reason) => {
                warn!("Command rejected: {cmd} in state {state} ({reason})");
                sink.emit(&AppEvent::CommandRejected {
                    command: cmd,
                    state,
                    reason,
                });
                Err(reason.into())
            }
        }
    }

    fn set_mode(&mut self, mode: EngineMode, sink: &mut impl EventSink, now_ms: u64) {
        if mode != self.mode {
            info!("Engine mode changed: {} -> {}", self.mode, mode);
            sink.emit(&AppEvent::ModeChanged {
                from: self.mode,
                to: mode,
            });
            self.mode = mode;
        }

        if mode == EngineMode::Off && self.fsm.state() == EngineState::Running {
            if let Ok(entered) = self.fsm.apply(Trigger::StopRequest, now_ms) {
                emit_transitions(&entered, sink);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Status snapshot for the current tick.
    pub fn status(&self) -> StatusSnapshot {
        let state = self.fsm.state();
        let snap = &self.snapshot;
        StatusSnapshot {
            tick: self.tick_count,
            state,
            status_label: entry_label(state, self.fsm.crank_attempts()),
            mode: self.mode,
            rpm: snap.rpm,
            oil_pressure_psi: snap.oil_pressure_psi,
            coolant_temp_c: snap.coolant_temp_c,
            battery_voltage_v: snap.battery_voltage_v,
            fuel_level_pct: snap.fuel_level_pct,
            engine_hours: snap.engine_hours,
            active_faults: self.faults,
            crank_attempts: self.fsm.crank_attempts(),
            underspeed: state == EngineState::Running && safety::underspeed(snap, &self.config),
            stale: self.stale,
            fault_reset_available: state == EngineState::Fault,
        }
    }

    pub fn state(&self) -> EngineState {
        self.fsm.state()
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn faults(&self) -> FaultSet {
        self.faults
    }

    pub fn crank_attempts(&self) -> u8 {
        self.fsm.crank_attempts()
    }

    pub fn last_snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn publish_tags(&self, status: &StatusSnapshot, tags: &mut impl TagPort) {
        let faults: Vec<&str> = status.active_faults.iter().map(|f| f.tag()).collect();
        let values = [
            ("engine_state", json!(status.state.name())),
            ("engine_rpm", json!(status.rpm)),
            ("oil_pressure", json!(status.oil_pressure_psi)),
            ("coolant_temp", json!(status.coolant_temp_c)),
            ("battery_voltage", json!(status.battery_voltage_v)),
            ("fuel_level", json!(status.fuel_level_pct)),
            ("engine_hours", json!(status.engine_hours)),
            ("active_faults", json!(faults)),
        ];
        for (key, value) in values {
            if let Err(e) = tags.set_tag(key, value) {
                warn!("Tag '{}' not persisted: {}", key, e);
            }
        }
    }
}

fn emit_transitions(entered: &Transitions, sink: &mut impl EventSink) {
    for t in entered {
        sink.emit(&AppEvent::StateEntered {
            from: t.from,
            to: t.to,
            trigger: t.trigger,
            label: t.label(),
        });
    }
}
